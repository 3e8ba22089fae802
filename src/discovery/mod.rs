//! LAN discovery: advertise a hosted session and find hosted sessions.
//!
//! Both halves run on non-blocking UDP sockets and are meant to be polled
//! once per frontend main-loop iteration. All state lives in an owned
//! [`DiscoveryState`].

mod client;
mod hosts;
mod server;
mod state;

use std::net::{Ipv4Addr, SocketAddr};
#[cfg(feature = "debug-tools")]
use std::path::PathBuf;

pub use hosts::{DiscoveredHost, HostList, with_advertised_port};
pub use server::AdvertisedSession;
pub use state::DiscoveryState;
use tracing::warn;

use crate::DEFAULT_PORT;
use crate::protocol::PROTOCOL_VERSION;
use crate::protocol::metrics::{DatagramOutcome, Metrics};
use crate::transport::SocketError;

/// Largest datagram the drain loops read in one go.
pub(crate) const MAX_DATAGRAM: usize = 1500;

/// Discovery configuration options.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoveryConfig {
    /// Advertised protocol version; packets with any other are dropped.
    pub protocol_version: u32,
    /// Address the advertiser listens on.
    pub server_bind: SocketAddr,
    /// Address the querier sends from and collects responses on.
    pub client_bind: SocketAddr,
    /// Where queries are sent.
    pub query_target: SocketAddr,
    /// Upper bound on datagrams handled per poll.
    pub max_datagrams_per_poll: usize,
    /// Capture every datagram sent to this PCAP file.
    #[cfg(feature = "debug-tools")]
    pub capture_sent: Option<PathBuf>,
    /// Capture every datagram received to this PCAP file.
    #[cfg(feature = "debug-tools")]
    pub capture_received: Option<PathBuf>,
}

impl DiscoveryConfig {
    /// Default configuration on a specific port.
    #[must_use]
    pub fn with_port(port: u16) -> Self {
        Self {
            server_bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            query_target: SocketAddr::from((Ipv4Addr::BROADCAST, port)),
            ..Self::default()
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            server_bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            client_bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            query_target: SocketAddr::from((Ipv4Addr::BROADCAST, DEFAULT_PORT)),
            max_datagrams_per_poll: 64,
            #[cfg(feature = "debug-tools")]
            capture_sent: None,
            #[cfg(feature = "debug-tools")]
            capture_received: None,
        }
    }
}

/// One non-blocking receive on a discovery socket.
#[derive(Debug, PartialEq, Eq)]
enum Received {
    Datagram(usize, SocketAddr),
    Drained,
    Failed,
}

impl Received {
    /// A failed receive is logged and counted as `dropped`; the drain goes on.
    fn classify(
        result: Result<Option<(usize, SocketAddr)>, SocketError>,
        dropped: DatagramOutcome,
    ) -> Self {
        match result {
            Ok(Some((len, from))) => Self::Datagram(len, from),
            Ok(None) => Self::Drained,
            Err(err) => {
                warn!(error = %err, "discovery receive failed");
                Metrics::record_datagram(dropped);
                Self::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::protocol::metrics;

    #[test]
    fn default_targets_broadcast_on_well_known_port() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.query_target, "255.255.255.255:55435".parse::<SocketAddr>().unwrap());
        assert_eq!(config.server_bind.port(), DEFAULT_PORT);
        assert_eq!(config.client_bind.port(), 0);
    }

    #[test]
    fn custom_port_moves_both_ends() {
        let config = DiscoveryConfig::with_port(6000);
        assert_eq!(config.server_bind.port(), 6000);
        assert_eq!(config.query_target.port(), 6000);
        assert_eq!(config.protocol_version, PROTOCOL_VERSION);
    }

    #[test]
    fn failed_receive_is_counted_and_skipped() {
        let from: SocketAddr = "127.0.0.1:9".parse().unwrap();
        assert_eq!(
            Received::classify(Ok(Some((4, from))), DatagramOutcome::ResponseDropped),
            Received::Datagram(4, from)
        );
        assert_eq!(
            Received::classify(Ok(None), DatagramOutcome::ResponseDropped),
            Received::Drained
        );

        let before = metrics::snapshot();
        let reset = SocketError::Io(io::Error::from(io::ErrorKind::ConnectionReset));
        assert_eq!(
            Received::classify(Err(reset), DatagramOutcome::ResponseDropped),
            Received::Failed
        );
        let refused = SocketError::Io(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert_eq!(
            Received::classify(Err(refused), DatagramOutcome::QueryDropped),
            Received::Failed
        );
        let after = metrics::snapshot();
        assert!(after.responses_dropped > before.responses_dropped);
        assert!(after.queries_dropped > before.queries_dropped);
    }
}
