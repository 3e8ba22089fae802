use std::net::{TcpListener, TcpStream};
use std::thread;

use netreplay::session::{accept_spectator, join_as_spectator};
use netreplay::{
    Core, Error, ErrorKind, HandshakeConfig, Initiator, LocalIdentity, MemoryId, Responder,
};

#[derive(Clone)]
struct TestCore {
    library: String,
    state: Vec<u8>,
    sram: Vec<u8>,
}

impl TestCore {
    fn new(library: &str, sram: Vec<u8>) -> Self {
        Self {
            library: library.to_owned(),
            state: vec![0x5a; 32],
            sram,
        }
    }
}

impl Core for TestCore {
    fn api_version(&self) -> u32 {
        1
    }

    fn library_name(&self) -> &str {
        &self.library
    }

    fn library_version(&self) -> &str {
        "1.53"
    }

    fn serialize_size(&self) -> usize {
        self.state.len()
    }

    fn serialize(&mut self, buf: &mut [u8]) -> bool {
        buf.copy_from_slice(&self.state);
        true
    }

    fn unserialize(&mut self, buf: &[u8]) -> bool {
        self.state.copy_from_slice(buf);
        true
    }

    fn memory(&self, id: MemoryId) -> &[u8] {
        match id {
            MemoryId::SaveRam => &self.sram,
            _ => &[],
        }
    }

    fn memory_mut(&mut self, id: MemoryId) -> &mut [u8] {
        match id {
            MemoryId::SaveRam => &mut self.sram,
            _ => &mut [],
        }
    }
}

/// Run the responder on a background thread and the initiator here.
fn run_pair(
    host_core: TestCore,
    host_crc: u32,
    mut client_core: TestCore,
    client_crc: u32,
) -> (
    netreplay::Result<netreplay::session::HandshakeOutcome>,
    netreplay::Result<netreplay::session::HandshakeOutcome>,
    Vec<String>,
    TestCore,
) {
    let config = HandshakeConfig::default();
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");

    let host_config = config.clone();
    let host = thread::spawn(move || {
        let (mut stream, peer) = listener.accept().expect("accept");
        host_config.prepare(&stream).expect("timeouts");
        let mut core = host_core;
        let mut notes: Vec<String> = Vec::new();
        let result = Responder::new(LocalIdentity::new("host", "1.0.0"))
            .with_peer_addr(peer)
            .get_info(&mut stream, &mut core, host_crc, &mut notes);
        (result, notes)
    });

    let mut stream: TcpStream = config.connect(addr).expect("connect");
    let mut client_notes: Vec<String> = Vec::new();
    let client_result = Initiator::new(LocalIdentity::new("guest", "1.0.0")).send_info(
        &mut stream,
        &mut client_core,
        client_crc,
        &mut client_notes,
    );
    drop(stream);

    let (host_result, host_notes) = host.join().expect("host thread");
    let mut notes = host_notes;
    notes.extend(client_notes);
    (host_result, client_result, notes, client_core)
}

#[test]
fn matching_peers_share_save_memory() {
    let host = TestCore::new("snes9x", vec![0xAB; 64]);
    let client = TestCore::new("snes9x", vec![0x00; 64]);

    let (host_result, client_result, notes, client_core) = run_pair(host, 0x1234, client, 0x1234);

    let host_outcome = host_result.expect("host accepted");
    let client_outcome = client_result.expect("client accepted");
    assert_eq!(host_outcome.peer_nick.as_str(), "guest");
    assert_eq!(client_outcome.peer_nick.as_str(), "host");
    assert_eq!(client_core.sram, vec![0xAB; 64]);
    assert!(notes.contains(&"Got connection from: \"guest (127.0.0.1)\" (#0)".to_owned()));
    assert!(notes.contains(&"Connected to: \"host\"".to_owned()));
}

#[test]
fn different_content_is_rejected() {
    let host = TestCore::new("snes9x", vec![0xAB; 64]);
    let client = TestCore::new("snes9x", vec![0x11; 64]);

    let (host_result, client_result, _, client_core) = run_pair(host, 0x1234, client, 0x9999);

    let err = host_result.expect_err("content differs");
    assert!(matches!(
        err,
        Error::ContentMismatch {
            local: 0x1234,
            remote: 0x9999
        }
    ));
    assert!(err.to_string().contains("cannot use different games"));
    assert_eq!(client_result.expect_err("host hung up").kind(), ErrorKind::IoFailure);
    assert_eq!(client_core.sram, vec![0x11; 64]);
}

#[test]
fn different_core_is_rejected() {
    let host = TestCore::new("snes9x", vec![0; 8]);
    let client = TestCore::new("bsnes", vec![0x22; 8]);

    let (host_result, _, _, client_core) = run_pair(host, 7, client, 7);

    assert!(matches!(
        host_result.expect_err("core differs"),
        Error::ImplementationMismatch { .. }
    ));
    assert_eq!(client_core.sram, vec![0x22; 8]);
}

#[test]
fn different_save_memory_size_is_rejected() {
    let host = TestCore::new("snes9x", vec![0; 8]);
    let client = TestCore::new("snes9x", vec![0x33; 16]);

    let (host_result, _, _, client_core) = run_pair(host, 7, client, 7);

    assert!(matches!(
        host_result.expect_err("size differs"),
        Error::SaveMemoryMismatch {
            local: 8,
            remote: 16
        }
    ));
    assert_eq!(client_core.sram, vec![0x33; 16]);
}

#[test]
fn spectator_receives_host_state_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");

    let host = thread::spawn(move || {
        let (mut stream, peer) = listener.accept().expect("accept");
        let mut core = TestCore::new("snes9x", Vec::new());
        core.state = (0..32).collect();
        let mut notes: Vec<String> = Vec::new();
        accept_spectator(
            &mut stream,
            &mut core,
            0x42,
            &LocalIdentity::new("host", "1.0.0"),
            Some(peer),
            1,
            &mut notes,
        )
        .expect("spectator accepted");
        notes
    });

    let mut stream = HandshakeConfig::default().connect(addr).expect("connect");
    let mut core = TestCore::new("snes9x", Vec::new());
    let mut notes: Vec<String> = Vec::new();
    let outcome = join_as_spectator(
        &mut stream,
        &mut core,
        0x42,
        &LocalIdentity::new("viewer", "1.0.0"),
        &mut notes,
    )
    .expect("joined");

    assert_eq!(outcome.peer_nick.as_str(), "host");
    assert_eq!(core.state, (0..32).collect::<Vec<u8>>());
    let host_notes = host.join().expect("host thread");
    assert_eq!(host_notes, vec!["Got connection from: \"viewer (127.0.0.1)\" (#1)"]);
}
