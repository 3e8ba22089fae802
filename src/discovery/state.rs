use bytes::BytesMut;
use tracing::debug;

use super::{DiscoveryConfig, HostList, MAX_DATAGRAM};
use crate::protocol::Result;
use crate::transport::SocketBinding;

#[cfg(feature = "debug-tools")]
use crate::transport::DatagramCapture;

/// Everything the advertiser and the querier keep between polls.
///
/// Sockets are bound lazily on first use and released by the shutdown
/// methods or on drop.
#[derive(Debug)]
pub struct DiscoveryState {
    pub(super) config: DiscoveryConfig,
    pub(super) server: Option<SocketBinding>,
    pub(super) client: Option<SocketBinding>,
    pub(super) inbound: BytesMut,
    pub(super) outbound: BytesMut,
    pub(super) hosts: HostList,
    #[cfg(feature = "debug-tools")]
    pub(super) captures: Captures,
}

impl DiscoveryState {
    /// Create discovery state; no socket is opened yet.
    #[must_use]
    pub fn new(config: DiscoveryConfig) -> Self {
        let mut inbound = BytesMut::with_capacity(MAX_DATAGRAM);
        inbound.resize(MAX_DATAGRAM, 0);
        Self {
            config,
            server: None,
            client: None,
            inbound,
            outbound: BytesMut::new(),
            hosts: HostList::new(),
            #[cfg(feature = "debug-tools")]
            captures: Captures::default(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Hosts collected so far.
    #[must_use]
    pub fn hosts(&self) -> &HostList {
        &self.hosts
    }

    /// Local address of the advertiser socket, once bound.
    pub fn server_addr(&self) -> Result<Option<std::net::SocketAddr>> {
        Ok(self.server.as_ref().map(SocketBinding::local_addr).transpose()?)
    }

    /// Local address of the querier socket, once bound.
    pub fn client_addr(&self) -> Result<Option<std::net::SocketAddr>> {
        Ok(self.client.as_ref().map(SocketBinding::local_addr).transpose()?)
    }

    /// Close the advertiser socket. The next [`serve`](Self::serve) rebinds.
    pub fn shutdown_server(&mut self) {
        if self.server.take().is_some() {
            debug!("discovery advertiser closed");
        }
    }

    /// Close the querier socket. Collected hosts are kept.
    pub fn shutdown_client(&mut self) {
        if self.client.take().is_some() {
            debug!("discovery querier closed");
        }
    }

    pub(super) fn open_server(&mut self) -> Result<()> {
        if self.server.is_none() {
            let socket = SocketBinding::bind(self.config.server_bind)?;
            debug!(addr = ?socket.local_addr().ok(), "discovery advertiser listening");
            self.server = Some(socket);
            #[cfg(feature = "debug-tools")]
            self.captures.open(&self.config);
        }
        Ok(())
    }

    pub(super) fn open_client(&mut self) -> Result<()> {
        if self.client.is_none() {
            let socket = SocketBinding::bind(self.config.client_bind)?;
            socket.set_broadcast(true)?;
            self.client = Some(socket);
            #[cfg(feature = "debug-tools")]
            self.captures.open(&self.config);
        }
        Ok(())
    }
}

impl Default for DiscoveryState {
    fn default() -> Self {
        Self::new(DiscoveryConfig::default())
    }
}

/// Optional PCAP captures of discovery traffic.
#[cfg(feature = "debug-tools")]
#[derive(Debug, Default)]
pub(super) struct Captures {
    sent: Option<DatagramCapture>,
    received: Option<DatagramCapture>,
}

#[cfg(feature = "debug-tools")]
impl Captures {
    fn open(&mut self, config: &DiscoveryConfig) {
        if self.sent.is_none() {
            self.sent = Self::create(config.capture_sent.as_deref());
        }
        if self.received.is_none() {
            self.received = Self::create(config.capture_received.as_deref());
        }
    }

    fn create(path: Option<&std::path::Path>) -> Option<DatagramCapture> {
        let path = path?;
        match DatagramCapture::create(path) {
            Ok(capture) => Some(capture),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot open capture file");
                None
            }
        }
    }

    pub(super) fn sent(&mut self, datagram: &[u8]) {
        Self::record(self.sent.as_mut(), datagram);
    }

    pub(super) fn received(&mut self, datagram: &[u8]) {
        Self::record(self.received.as_mut(), datagram);
    }

    fn record(capture: Option<&mut DatagramCapture>, datagram: &[u8]) {
        if let Some(capture) = capture {
            if let Err(err) = capture.record(datagram) {
                tracing::warn!(error = %err, "capture write failed");
            }
        }
    }
}
