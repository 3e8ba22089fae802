//! Process-wide counters for handshakes, discovery traffic and movies.

use std::sync::atomic::{AtomicU64, Ordering};

/// Track session subsystem counters without external dependencies.
pub(crate) struct Metrics;

static HANDSHAKES_COMPLETED: AtomicU64 = AtomicU64::new(0);
static HANDSHAKES_FAILED: AtomicU64 = AtomicU64::new(0);
static SPECTATORS_ACCEPTED: AtomicU64 = AtomicU64::new(0);
static MOVIES_STARTED: AtomicU64 = AtomicU64::new(0);
static MOVIES_FINISHED: AtomicU64 = AtomicU64::new(0);

struct DiscoveryCounters {
    queries_sent: AtomicU64,
    queries_received: AtomicU64,
    queries_answered: AtomicU64,
    queries_dropped: AtomicU64,
    responses_accepted: AtomicU64,
    responses_dropped: AtomicU64,
}

static DISCOVERY: DiscoveryCounters = DiscoveryCounters::new();

impl DiscoveryCounters {
    const fn new() -> Self {
        Self {
            queries_sent: AtomicU64::new(0),
            queries_received: AtomicU64::new(0),
            queries_answered: AtomicU64::new(0),
            queries_dropped: AtomicU64::new(0),
            responses_accepted: AtomicU64::new(0),
            responses_dropped: AtomicU64::new(0),
        }
    }
}

/// Outcome of one inbound discovery datagram.
#[derive(Clone, Copy)]
pub(crate) enum DatagramOutcome {
    QueryAnswered,
    QueryDropped,
    ResponseAccepted,
    ResponseDropped,
}

impl Metrics {
    #[inline]
    pub(crate) fn record_handshake(success: bool) {
        if success {
            HANDSHAKES_COMPLETED.fetch_add(1, Ordering::Relaxed);
        } else {
            HANDSHAKES_FAILED.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_spectator() {
        SPECTATORS_ACCEPTED.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_query_sent() {
        DISCOVERY.queries_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_datagram(outcome: DatagramOutcome) {
        match outcome {
            DatagramOutcome::QueryAnswered => {
                DISCOVERY.queries_received.fetch_add(1, Ordering::Relaxed);
                DISCOVERY.queries_answered.fetch_add(1, Ordering::Relaxed);
            }
            DatagramOutcome::QueryDropped => {
                DISCOVERY.queries_received.fetch_add(1, Ordering::Relaxed);
                DISCOVERY.queries_dropped.fetch_add(1, Ordering::Relaxed);
            }
            DatagramOutcome::ResponseAccepted => {
                DISCOVERY.responses_accepted.fetch_add(1, Ordering::Relaxed);
            }
            DatagramOutcome::ResponseDropped => {
                DISCOVERY.responses_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[inline]
    pub(crate) fn record_movie_start() {
        MOVIES_STARTED.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_movie_finish() {
        MOVIES_FINISHED.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn totals() -> MetricsSnapshot {
        MetricsSnapshot {
            handshakes_completed: HANDSHAKES_COMPLETED.load(Ordering::Relaxed),
            handshakes_failed: HANDSHAKES_FAILED.load(Ordering::Relaxed),
            spectators_accepted: SPECTATORS_ACCEPTED.load(Ordering::Relaxed),
            queries_sent: DISCOVERY.queries_sent.load(Ordering::Relaxed),
            queries_received: DISCOVERY.queries_received.load(Ordering::Relaxed),
            queries_answered: DISCOVERY.queries_answered.load(Ordering::Relaxed),
            queries_dropped: DISCOVERY.queries_dropped.load(Ordering::Relaxed),
            responses_accepted: DISCOVERY.responses_accepted.load(Ordering::Relaxed),
            responses_dropped: DISCOVERY.responses_dropped.load(Ordering::Relaxed),
            movies_started: MOVIES_STARTED.load(Ordering::Relaxed),
            movies_finished: MOVIES_FINISHED.load(Ordering::Relaxed),
        }
    }
}

/// Take a snapshot of the process-wide counters.
#[must_use]
pub fn snapshot() -> MetricsSnapshot {
    Metrics::totals()
}

/// Lightweight snapshot of critical counters.
#[allow(missing_docs)]
#[derive(Default, Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub handshakes_completed: u64,
    pub handshakes_failed: u64,
    pub spectators_accepted: u64,
    pub queries_sent: u64,
    pub queries_received: u64,
    pub queries_answered: u64,
    pub queries_dropped: u64,
    pub responses_accepted: u64,
    pub responses_dropped: u64,
    pub movies_started: u64,
    pub movies_finished: u64,
}

impl MetricsSnapshot {
    /// Fraction of received queries that were answered.
    #[must_use]
    pub fn query_answer_ratio(&self) -> Option<f64> {
        if self.queries_received == 0 {
            return None;
        }
        Some(self.queries_answered as f64 / self.queries_received as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_only_grow() {
        let before = snapshot();
        Metrics::record_datagram(DatagramOutcome::QueryDropped);
        Metrics::record_handshake(false);
        let after = snapshot();
        assert!(after.queries_dropped > before.queries_dropped);
        assert!(after.queries_received > before.queries_received);
        assert!(after.handshakes_failed > before.handshakes_failed);
    }

    #[test]
    fn ratio_undefined_without_queries() {
        assert_eq!(MetricsSnapshot::default().query_answer_ratio(), None);
    }
}
