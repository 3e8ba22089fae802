//! Interfaces to the emulation core and the loaded content.

use crate::protocol::{Error, Result, implementation_fingerprint};

/// Memory regions a core can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryId {
    /// Battery-backed save memory.
    SaveRam,
    /// Real-time clock data.
    Rtc,
    /// Main system work RAM.
    SystemRam,
    /// Video memory.
    VideoRam,
}

/// An emulation core, seen only through its state and memory blobs.
///
/// Sizes are whatever the core reports for the content currently loaded.
pub trait Core {
    /// Core API version.
    fn api_version(&self) -> u32;

    /// Core library name.
    fn library_name(&self) -> &str;

    /// Core library version.
    fn library_version(&self) -> &str;

    /// Size of a serialized state, or 0 when the core cannot serialize.
    fn serialize_size(&self) -> usize;

    /// Serialize the current state into `buf` (`buf.len() == serialize_size()`).
    fn serialize(&mut self, buf: &mut [u8]) -> bool;

    /// Restore a state produced by [`Core::serialize`].
    fn unserialize(&mut self, buf: &[u8]) -> bool;

    /// Borrow a memory region; empty if the core does not expose it.
    fn memory(&self, id: MemoryId) -> &[u8];

    /// Mutably borrow a memory region.
    fn memory_mut(&mut self, id: MemoryId) -> &mut [u8];
}

/// The loaded content.
pub trait Content {
    /// CRC32 of the loaded content.
    fn crc(&self) -> u32;

    /// Name shown to other players during discovery.
    fn display_name(&self) -> &str {
        ""
    }
}

/// Fingerprint of `core` running inside a frontend of `frontend_version`.
pub fn core_fingerprint<C: Core + ?Sized>(core: &C, frontend_version: &str) -> u32 {
    implementation_fingerprint(
        core.api_version(),
        core.library_name(),
        core.library_version(),
        frontend_version,
    )
}

/// Save memory size as carried on the wire.
pub(crate) fn save_ram_size<C: Core + ?Sized>(core: &C) -> u32 {
    u32::try_from(core.memory(MemoryId::SaveRam).len()).unwrap_or(u32::MAX)
}

/// Allocate a zeroed buffer for one serialized state.
pub(crate) fn state_buffer(size: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| Error::ResourceExhausted {
            what: "state buffer",
            size,
        })?;
    buf.resize(size, 0);
    Ok(buf)
}
