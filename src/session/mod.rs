//! Peer handshake, spectator bootstrap and the core/content seams they use.

pub(crate) mod core;
mod handshake;
mod notify;
mod spectate;

pub use self::core::{Content, Core, MemoryId, core_fingerprint};
pub use handshake::{
    HandshakeConfig, HandshakeOutcome, HandshakeStep, Initiator, LocalIdentity, Responder,
    Summary, get_nickname, send_nickname,
};
pub use notify::{LogNotifier, Notifier};
pub use spectate::{accept_spectator, join_as_spectator};

#[cfg(test)]
pub(crate) mod testing {
    use super::{Core, MemoryId};

    /// In-memory core for unit tests.
    #[derive(Debug, Clone)]
    pub(crate) struct MockCore {
        pub state: Vec<u8>,
        pub sram: Vec<u8>,
        pub library: &'static str,
        pub unserialize_calls: usize,
        pub refuse: bool,
    }

    impl MockCore {
        pub(crate) fn new(state: Vec<u8>, sram: Vec<u8>) -> Self {
            Self {
                state,
                sram,
                library: "mock",
                unserialize_calls: 0,
                refuse: false,
            }
        }
    }

    impl Core for MockCore {
        fn api_version(&self) -> u32 {
            1
        }

        fn library_name(&self) -> &str {
            self.library
        }

        fn library_version(&self) -> &str {
            "1.0"
        }

        fn serialize_size(&self) -> usize {
            self.state.len()
        }

        fn serialize(&mut self, buf: &mut [u8]) -> bool {
            if self.refuse || buf.len() != self.state.len() {
                return false;
            }
            buf.copy_from_slice(&self.state);
            true
        }

        fn unserialize(&mut self, buf: &[u8]) -> bool {
            self.unserialize_calls += 1;
            if self.refuse || buf.len() != self.state.len() {
                return false;
            }
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
}
