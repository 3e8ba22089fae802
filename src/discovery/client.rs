//! Querier half: broadcast a query and collect the answers.

use tracing::{debug, instrument, trace};

use super::{DiscoveredHost, DiscoveryState, HostList, Received};
use crate::protocol::metrics::{DatagramOutcome, Metrics};
use crate::protocol::{Result, advert};

impl DiscoveryState {
    /// Broadcast one query and return immediately.
    #[instrument(level = "debug", skip_all, fields(target = %self.config.query_target))]
    pub fn send_query(&mut self) -> Result<()> {
        self.open_client()?;
        let Some(client) = self.client.as_ref() else {
            return Ok(());
        };
        advert::encode_query(&mut self.outbound, self.config.protocol_version);
        client.send_to(&self.outbound, self.config.query_target)?;
        #[cfg(feature = "debug-tools")]
        self.captures.sent(&self.outbound);

        Metrics::record_query_sent();
        debug!("discovery query sent");
        Ok(())
    }

    /// Drain pending responses into the host list. Never blocks.
    ///
    /// Returns the hosts seen since the last [`clear_responses`](Self::clear_responses).
    pub fn collect_responses(&mut self) -> Result<&HostList> {
        let Some(client) = self.client.as_ref() else {
            return Ok(&self.hosts);
        };
        let version = self.config.protocol_version;

        for _ in 0..self.config.max_datagrams_per_poll {
            let (len, from) = match Received::classify(
                client.try_recv_from(&mut self.inbound),
                DatagramOutcome::ResponseDropped,
            ) {
                Received::Datagram(len, from) => (len, from),
                Received::Drained => break,
                Received::Failed => continue,
            };
            #[cfg(feature = "debug-tools")]
            self.captures.received(&self.inbound[..len]);

            let ad = match advert::decode_response(&self.inbound[..len], version) {
                Ok(ad) => ad,
                Err(err) => {
                    trace!(%from, len, error = %err, "dropping discovery datagram");
                    Metrics::record_datagram(DatagramOutcome::ResponseDropped);
                    continue;
                }
            };

            let host = DiscoveredHost::from_response(from, ad);
            debug!(addr = %host.addr, nick = %host.nick, "discovered host");
            self.hosts.push(host)?;
            Metrics::record_datagram(DatagramOutcome::ResponseAccepted);
        }
        Ok(&self.hosts)
    }

    /// Forget every collected host.
    pub fn clear_responses(&mut self) {
        self.hosts.clear();
    }
}
