//! Spectator bootstrap.
//!
//! A spectator does not share save memory with the host. Instead the host
//! ships a session header followed by a full serialized state, and the
//! spectator starts from that snapshot.
//!
//! ```text
//! host                                   spectator
//!   | <---------------------------- nickname -- |
//!   | -- nickname ----------------------------> |
//!   | -- header (16) + state (state_size) ----> |  (verified)
//! ```

use std::net::SocketAddr;

use tracing::{error, info, instrument};

use super::core::{Core, core_fingerprint, state_buffer};
use super::handshake::{HandshakeOutcome, HandshakeStep, LocalIdentity, get_nickname, send_nickname};
use super::notify::{Notifier, log_connection};
use crate::protocol::metrics::Metrics;
use crate::protocol::{Error, HEADER_SIZE, Nickname, Result, SessionHeader};
use crate::transport::StreamTransport;

fn expected_header<C: Core + ?Sized>(core: &C, content_crc: u32, frontend_version: &str) -> SessionHeader {
    let state_size = u32::try_from(core.serialize_size()).unwrap_or(u32::MAX);
    SessionHeader::new(core_fingerprint(core, frontend_version), content_crc, state_size)
}

/// Host side: bring a freshly connected spectator up to the current state.
///
/// `slot` only labels the connection notice.
#[instrument(level = "debug", skip_all, fields(host = %host.nick, peer = ?peer_addr, slot = slot))]
pub fn accept_spectator<S, C>(
    stream: &mut S,
    core: &mut C,
    content_crc: u32,
    host: &LocalIdentity,
    peer_addr: Option<SocketAddr>,
    slot: u32,
    notifier: &mut dyn Notifier,
) -> Result<HandshakeOutcome>
where
    S: StreamTransport + ?Sized,
    C: Core + ?Sized,
{
    let result = (|| -> Result<HandshakeOutcome> {
        let mut peer_nick = Nickname::default();
        get_nickname(stream, &mut peer_nick)?;
        send_nickname(stream, &host.nick)?;

        let header = expected_header(core, content_crc, &host.frontend_version);
        let mut state = state_buffer(core.serialize_size())?;
        if !state.is_empty() && !core.serialize(&mut state) {
            return Err(Error::Core("serialize"));
        }

        stream
            .send_all(&header.encode())
            .map_err(Error::transfer(HandshakeStep::SendHeader))?;
        stream
            .send_all(&state)
            .map_err(Error::transfer(HandshakeStep::SendState))?;

        log_connection(notifier, peer_addr, slot, peer_nick.as_str());
        Ok(HandshakeOutcome { peer_nick })
    })();

    match &result {
        Ok(_) => Metrics::record_spectator(),
        Err(err) => error!(error = %err, "spectator bootstrap failed"),
    }
    result
}

/// Spectator side: join a host and load its state.
///
/// The header must match what this side would have generated; nothing is
/// loaded into the core unless it does.
#[instrument(level = "debug", skip_all, fields(nick = %local.nick))]
pub fn join_as_spectator<S, C>(
    stream: &mut S,
    core: &mut C,
    content_crc: u32,
    local: &LocalIdentity,
    notifier: &mut dyn Notifier,
) -> Result<HandshakeOutcome>
where
    S: StreamTransport + ?Sized,
    C: Core + ?Sized,
{
    let result = (|| -> Result<HandshakeOutcome> {
        send_nickname(stream, &local.nick)?;
        let mut peer_nick = Nickname::default();
        get_nickname(stream, &mut peer_nick)?;

        let msg = format!("Connected to \"{peer_nick}\"");
        info!("{msg}");
        notifier.notify(&msg);

        let mut raw = [0u8; HEADER_SIZE];
        stream
            .recv_all(&mut raw)
            .map_err(Error::transfer(HandshakeStep::ReceiveHeader))?;
        let header = SessionHeader::decode(&raw)?;
        header.verify(&expected_header(core, content_crc, &local.frontend_version))?;

        let mut state = state_buffer(core.serialize_size())?;
        stream
            .recv_all(&mut state)
            .map_err(Error::transfer(HandshakeStep::ReceiveState))?;
        if !state.is_empty() && !core.unserialize(&state) {
            return Err(Error::Core("unserialize"));
        }
        Ok(HandshakeOutcome { peer_nick })
    })();

    if let Err(err) = &result {
        error!(error = %err, "joining as spectator failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::MockCore;
    use std::io::{Cursor, Read, Write};

    /// Two one-way pipes glued into a duplex stream.
    struct Duplex {
        incoming: Cursor<Vec<u8>>,
        outgoing: Vec<u8>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.incoming.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.outgoing.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn host_stream_bytes(host_core: &mut MockCore, crc: u32) -> Vec<u8> {
        let mut host_side = Duplex {
            incoming: Cursor::new(Nickname::new("viewer").frame()),
            outgoing: Vec::new(),
        };
        let mut notes: Vec<String> = Vec::new();
        accept_spectator(
            &mut host_side,
            host_core,
            crc,
            &LocalIdentity::new("host", "1.0"),
            Some("127.0.0.1:5000".parse().unwrap()),
            2,
            &mut notes,
        )
        .unwrap();
        assert_eq!(notes, vec!["Got connection from: \"viewer (127.0.0.1)\" (#2)"]);
        host_side.outgoing
    }

    #[test]
    fn spectator_loads_host_state() {
        let mut host_core = MockCore::new(vec![1, 2, 3, 4], Vec::new());
        let host_bytes = host_stream_bytes(&mut host_core, 0xfeed);

        let mut spectator_side = Duplex {
            incoming: Cursor::new(host_bytes),
            outgoing: Vec::new(),
        };
        let mut spectator_core = MockCore::new(vec![0; 4], Vec::new());
        let mut notes: Vec<String> = Vec::new();
        let outcome = join_as_spectator(
            &mut spectator_side,
            &mut spectator_core,
            0xfeed,
            &LocalIdentity::new("viewer", "1.0"),
            &mut notes,
        )
        .unwrap();

        assert_eq!(outcome.peer_nick.as_str(), "host");
        assert_eq!(spectator_core.state, vec![1, 2, 3, 4]);
        assert_eq!(notes, vec!["Connected to \"host\""]);
    }

    #[test]
    fn spectator_rejects_other_content() {
        let mut host_core = MockCore::new(vec![1, 2, 3, 4], Vec::new());
        let host_bytes = host_stream_bytes(&mut host_core, 0xfeed);

        let mut spectator_side = Duplex {
            incoming: Cursor::new(host_bytes),
            outgoing: Vec::new(),
        };
        let mut spectator_core = MockCore::new(vec![0; 4], Vec::new());
        let err = join_as_spectator(
            &mut spectator_side,
            &mut spectator_core,
            0xbeef,
            &LocalIdentity::new("viewer", "1.0"),
            &mut Vec::<String>::new(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::ContentMismatch { .. }));
        assert_eq!(spectator_core.unserialize_calls, 0);
    }

    #[test]
    fn spectator_rejects_other_state_size() {
        let mut host_core = MockCore::new(vec![1, 2, 3, 4], Vec::new());
        let host_bytes = host_stream_bytes(&mut host_core, 1);

        let mut spectator_side = Duplex {
            incoming: Cursor::new(host_bytes),
            outgoing: Vec::new(),
        };
        let mut spectator_core = MockCore::new(vec![0; 8], Vec::new());
        let err = join_as_spectator(
            &mut spectator_side,
            &mut spectator_core,
            1,
            &LocalIdentity::new("viewer", "1.0"),
            &mut Vec::<String>::new(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::StateSizeMismatch { local: 8, remote: 4 }));
    }
}
