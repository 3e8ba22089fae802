//! Connection bootstrap between two netplay peers.
//!
//! The initiator announces what it is running; the responder checks it and,
//! if everything matches, hands over its save memory so both sides start
//! from byte-identical saves.
//!
//! ```text
//! initiator                              responder
//!   | -- summary {crc, fingerprint, sram size} --> |  (checked)
//!   | -- nickname ------------------------------> |
//!   | <------------------------------ save memory -- |
//!   | <--------------------------------- nickname -- |
//! ```

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use tracing::{debug, error, info, instrument};

use super::core::{Core, MemoryId, core_fingerprint, save_ram_size};
use super::notify::{Notifier, log_connection};
use crate::protocol::metrics::Metrics;
use crate::protocol::{Error, Nickname, Result, SUMMARY_SIZE};
use crate::transport::{self, StreamTransport};

/// Steps of the bootstrap exchange, named in transfer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStep {
    /// Sending the summary or the BSV header.
    SendHeader,
    /// Receiving the summary or the BSV header.
    ReceiveHeader,
    /// Sending the nickname length or bytes.
    SendNickname,
    /// Receiving the nickname length or bytes.
    ReceiveNickname,
    /// Sending save memory.
    SendSaveMemory,
    /// Receiving save memory.
    ReceiveSaveMemory,
    /// Sending a serialized state.
    SendState,
    /// Receiving a serialized state.
    ReceiveState,
}

impl std::fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::SendHeader => "sending header",
            Self::ReceiveHeader => "receiving header",
            Self::SendNickname => "sending nickname",
            Self::ReceiveNickname => "receiving nickname",
            Self::SendSaveMemory => "sending save memory",
            Self::ReceiveSaveMemory => "receiving save memory",
            Self::SendState => "sending save state",
            Self::ReceiveState => "receiving save state",
        })
    }
}

/// Handshake configuration options.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandshakeConfig {
    /// Upper bound on each blocking transfer; `None` blocks indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl HandshakeConfig {
    /// Connect to a host with the configured timeout in force.
    pub fn connect(&self, addr: SocketAddr) -> Result<TcpStream> {
        Ok(transport::connect(addr, self.timeout)?)
    }

    /// Apply the configured timeout to an accepted stream.
    pub fn prepare(&self, stream: &TcpStream) -> Result<()> {
        Ok(transport::apply_timeout(stream, self.timeout)?)
    }
}

/// Who this side is.
#[derive(Debug, Clone)]
pub struct LocalIdentity {
    /// Our nickname.
    pub nick: Nickname,
    /// Frontend version folded into the fingerprint.
    pub frontend_version: String,
}

impl LocalIdentity {
    /// Build an identity.
    #[must_use]
    pub fn new(nick: &str, frontend_version: &str) -> Self {
        Self {
            nick: Nickname::new(nick),
            frontend_version: frontend_version.to_owned(),
        }
    }
}

/// The three words the initiator announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Content checksum.
    pub content_crc: u32,
    /// Implementation fingerprint.
    pub fingerprint: u32,
    /// Save memory size.
    pub save_memory_size: u32,
}

impl Summary {
    fn local<C: Core + ?Sized>(core: &C, content_crc: u32, frontend_version: &str) -> Self {
        Self {
            content_crc,
            fingerprint: core_fingerprint(core, frontend_version),
            save_memory_size: save_ram_size(core),
        }
    }

    /// Encode as three big-endian words.
    #[must_use]
    pub fn encode(&self) -> [u8; SUMMARY_SIZE] {
        let mut bytes = [0u8; SUMMARY_SIZE];
        bytes[0..4].copy_from_slice(&self.content_crc.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.fingerprint.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.save_memory_size.to_be_bytes());
        bytes
    }

    /// Decode three big-endian words.
    #[must_use]
    pub fn decode(bytes: &[u8; SUMMARY_SIZE]) -> Self {
        let word = |i: usize| u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Self {
            content_crc: word(0),
            fingerprint: word(4),
            save_memory_size: word(8),
        }
    }

    /// Check a peer summary against ours. Order matters: content first.
    pub fn check(&self, remote: &Self) -> Result<()> {
        if self.content_crc != remote.content_crc {
            return Err(Error::ContentMismatch {
                local: self.content_crc,
                remote: remote.content_crc,
            });
        }
        if self.fingerprint != remote.fingerprint {
            return Err(Error::ImplementationMismatch {
                local: self.fingerprint,
                remote: remote.fingerprint,
            });
        }
        if self.save_memory_size != remote.save_memory_size {
            return Err(Error::SaveMemoryMismatch {
                local: self.save_memory_size,
                remote: remote.save_memory_size,
            });
        }
        Ok(())
    }
}

/// Send our nickname as a length-prefixed frame.
pub fn send_nickname<S: StreamTransport + ?Sized>(stream: &mut S, nick: &Nickname) -> Result<()> {
    stream
        .send_all(&nick.frame())
        .map_err(Error::transfer(HandshakeStep::SendNickname))
}

/// Receive a peer nickname into `peer`.
///
/// A declared length at or above the storage capacity is rejected before
/// any nickname bytes are read.
pub fn get_nickname<S: StreamTransport + ?Sized>(stream: &mut S, peer: &mut Nickname) -> Result<()> {
    let mut len = [0u8; 1];
    stream
        .recv_all(&mut len)
        .map_err(Error::transfer(HandshakeStep::ReceiveNickname))?;
    let len = Nickname::check_declared_len(len[0])?;

    let mut bytes = vec![0u8; len];
    stream
        .recv_all(&mut bytes)
        .map_err(Error::transfer(HandshakeStep::ReceiveNickname))?;
    *peer = Nickname::from_wire(&bytes);
    Ok(())
}

/// Result of a completed handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeOutcome {
    /// The other side's nickname.
    pub peer_nick: Nickname,
}

fn finish(result: Result<HandshakeOutcome>) -> Result<HandshakeOutcome> {
    match &result {
        Ok(outcome) => {
            Metrics::record_handshake(true);
            debug!(peer = %outcome.peer_nick, "handshake complete");
        }
        Err(err) => {
            Metrics::record_handshake(false);
            error!(error = %err, "handshake failed");
        }
    }
    result
}

/// The connecting side. Its save memory is overwritten by the responder's.
#[derive(Debug, Clone)]
pub struct Initiator {
    local: LocalIdentity,
}

impl Initiator {
    /// Create a new initiator.
    #[must_use]
    pub fn new(local: LocalIdentity) -> Self {
        Self { local }
    }

    /// Run the initiator side of the handshake.
    #[instrument(level = "debug", skip_all, fields(nick = %self.local.nick))]
    pub fn send_info<S, C>(
        &self,
        stream: &mut S,
        core: &mut C,
        content_crc: u32,
        notifier: &mut dyn Notifier,
    ) -> Result<HandshakeOutcome>
    where
        S: StreamTransport + ?Sized,
        C: Core + ?Sized,
    {
        finish(self.exchange(stream, core, content_crc, notifier))
    }

    fn exchange<S, C>(
        &self,
        stream: &mut S,
        core: &mut C,
        content_crc: u32,
        notifier: &mut dyn Notifier,
    ) -> Result<HandshakeOutcome>
    where
        S: StreamTransport + ?Sized,
        C: Core + ?Sized,
    {
        let summary = Summary::local(core, content_crc, &self.local.frontend_version);
        stream
            .send_all(&summary.encode())
            .map_err(Error::transfer(HandshakeStep::SendHeader))?;
        send_nickname(stream, &self.local.nick)?;

        // Staged so a short read never leaves half-overwritten save memory.
        let mut sram = vec![0u8; core.memory(MemoryId::SaveRam).len()];
        stream
            .recv_all(&mut sram)
            .map_err(Error::transfer(HandshakeStep::ReceiveSaveMemory))?;

        let mut peer_nick = Nickname::default();
        get_nickname(stream, &mut peer_nick)?;

        core.memory_mut(MemoryId::SaveRam).copy_from_slice(&sram);

        let msg = format!("Connected to: \"{peer_nick}\"");
        info!("{msg}");
        notifier.notify(&msg);
        Ok(HandshakeOutcome { peer_nick })
    }
}

/// The accepting side. Authoritative for save memory.
#[derive(Debug, Clone)]
pub struct Responder {
    local: LocalIdentity,
    peer_addr: Option<SocketAddr>,
}

impl Responder {
    /// Create a new responder.
    #[must_use]
    pub fn new(local: LocalIdentity) -> Self {
        Self {
            local,
            peer_addr: None,
        }
    }

    /// Remember the peer address for the connection log.
    #[must_use]
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Run the responder side of the handshake.
    #[instrument(level = "debug", skip_all, fields(nick = %self.local.nick, peer = ?self.peer_addr))]
    pub fn get_info<S, C>(
        &self,
        stream: &mut S,
        core: &mut C,
        content_crc: u32,
        notifier: &mut dyn Notifier,
    ) -> Result<HandshakeOutcome>
    where
        S: StreamTransport + ?Sized,
        C: Core + ?Sized,
    {
        finish(self.exchange(stream, core, content_crc, notifier))
    }

    fn exchange<S, C>(
        &self,
        stream: &mut S,
        core: &mut C,
        content_crc: u32,
        notifier: &mut dyn Notifier,
    ) -> Result<HandshakeOutcome>
    where
        S: StreamTransport + ?Sized,
        C: Core + ?Sized,
    {
        let mut raw = [0u8; SUMMARY_SIZE];
        stream
            .recv_all(&mut raw)
            .map_err(Error::transfer(HandshakeStep::ReceiveHeader))?;
        let remote = Summary::decode(&raw);
        Summary::local(core, content_crc, &self.local.frontend_version).check(&remote)?;

        let mut peer_nick = Nickname::default();
        get_nickname(stream, &mut peer_nick)?;

        stream
            .send_all(core.memory(MemoryId::SaveRam))
            .map_err(Error::transfer(HandshakeStep::SendSaveMemory))?;
        send_nickname(stream, &self.local.nick)?;

        log_connection(notifier, self.peer_addr, 0, peer_nick.as_str());
        Ok(HandshakeOutcome { peer_nick })
    }
}
