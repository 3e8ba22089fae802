//! Minimal non-blocking UDP socket wrapper for LAN discovery.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use thiserror::Error;
use tracing::{debug, instrument};

/// Error type for socket operations.
#[derive(Debug, Error)]
pub enum SocketError {
    /// Underlying I/O error
    #[error("socket I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<SocketError> for crate::protocol::Error {
    fn from(err: SocketError) -> Self {
        match err {
            SocketError::Io(io) => Self::Io(io),
        }
    }
}

/// Binding for a non-blocking UDP socket.
///
/// Every receive is a zero-timeout readiness check: [`SocketBinding::try_recv_from`]
/// returns `Ok(None)` instead of blocking when nothing is pending.
#[derive(Debug)]
pub struct SocketBinding {
    socket: UdpSocket,
}

impl SocketBinding {
    /// Bind to the provided address.
    #[instrument(level = "debug")]
    pub fn bind(addr: SocketAddr) -> Result<Self, SocketError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        debug!(local = ?socket.local_addr().ok(), "udp socket bound");
        Ok(Self { socket })
    }

    /// Allow sending to broadcast addresses.
    pub fn set_broadcast(&self, enabled: bool) -> Result<(), SocketError> {
        self.socket.set_broadcast(enabled)?;
        Ok(())
    }

    /// Send bytes to a remote address.
    pub fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<usize, SocketError> {
        Ok(self.socket.send_to(buf, addr)?)
    }

    /// Receive one datagram if one is pending.
    ///
    /// Returns `Ok(None)` when the socket has nothing to read.
    pub fn try_recv_from(
        &self,
        buf: &mut [u8],
    ) -> Result<Option<(usize, SocketAddr)>, SocketError> {
        match self.socket.recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Access the local address for this binding.
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        Ok(self.socket.local_addr()?)
    }
}
