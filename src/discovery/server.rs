//! Advertiser half: answer queries from the LAN.

use tracing::{debug, instrument, trace, warn};

use super::{DiscoveryState, Received};
use crate::protocol::metrics::{DatagramOutcome, Metrics};
use crate::protocol::{Advertisement, Result, advert};
use crate::session::{Content, Core};

/// What a hosting frontend advertises about its session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisedSession {
    /// TCP port accepting netplay connections.
    pub port: u16,
    /// Host nickname.
    pub nick: String,
    /// Frontend version string.
    pub frontend_version: String,
    /// Core library name.
    pub core: String,
    /// Core library version.
    pub core_version: String,
    /// Content display name; empty advertises `"N/A"`.
    pub content: String,
    /// Content checksum.
    pub content_crc: u32,
}

impl AdvertisedSession {
    /// Describe the session currently running in `core`.
    pub fn from_running<C, T>(port: u16, nick: &str, frontend_version: &str, core: &C, content: &T) -> Self
    where
        C: Core + ?Sized,
        T: Content + ?Sized,
    {
        Self {
            port,
            nick: nick.to_owned(),
            frontend_version: frontend_version.to_owned(),
            core: core.library_name().to_owned(),
            core_version: core.library_version().to_owned(),
            content: content.display_name().to_owned(),
            content_crc: content.crc(),
        }
    }

    fn advertisement(&self) -> Advertisement {
        Advertisement {
            port: u32::from(self.port),
            frontend_version: self.frontend_version.clone(),
            nick: self.nick.clone(),
            core: self.core.clone(),
            core_version: self.core_version.clone(),
            content: self.content.clone(),
            content_crc: self.content_crc,
        }
    }
}

impl DiscoveryState {
    /// Answer every pending query, binding the advertiser socket first if
    /// needed. Never blocks.
    ///
    /// Returns the number of responses sent.
    #[instrument(level = "trace", skip_all)]
    pub fn serve(&mut self, session: &AdvertisedSession) -> Result<usize> {
        self.open_server()?;
        let Some(server) = self.server.as_ref() else {
            return Ok(0);
        };
        let version = self.config.protocol_version;
        let mut answered = 0;
        let mut response_built = false;

        for _ in 0..self.config.max_datagrams_per_poll {
            let (len, from) = match Received::classify(
                server.try_recv_from(&mut self.inbound),
                DatagramOutcome::QueryDropped,
            ) {
                Received::Datagram(len, from) => (len, from),
                Received::Drained => break,
                Received::Failed => continue,
            };
            #[cfg(feature = "debug-tools")]
            self.captures.received(&self.inbound[..len]);

            if let Err(err) = advert::decode_query(&self.inbound[..len], version) {
                trace!(%from, len, error = %err, "dropping discovery datagram");
                Metrics::record_datagram(DatagramOutcome::QueryDropped);
                continue;
            }

            if !response_built {
                advert::encode_response(&mut self.outbound, version, &session.advertisement());
                response_built = true;
            }
            if let Err(err) = server.send_to(&self.outbound, from) {
                warn!(%from, error = %err, "failed to answer discovery query");
                Metrics::record_datagram(DatagramOutcome::QueryDropped);
                continue;
            }
            #[cfg(feature = "debug-tools")]
            self.captures.sent(&self.outbound);

            debug!(%from, "answered discovery query");
            Metrics::record_datagram(DatagramOutcome::QueryAnswered);
            answered += 1;
        }
        Ok(answered)
    }
}
