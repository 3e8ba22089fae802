//! Session protocol error types

use std::io;

use thiserror::Error;

use crate::session::HandshakeStep;

/// Broad classification of every [`Error`].
///
/// Callers use this to decide how a failure is surfaced: discovery drops
/// protocol mismatches silently, the handshake aborts on all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong magic, tag, length or protocol version.
    ProtocolMismatch,
    /// Peers (or a peer and a file) disagree on content or core build.
    ConsistencyMismatch,
    /// A blocking transfer or file operation failed.
    IoFailure,
    /// A buffer could not be allocated or grown.
    ResourceExhaustion,
}

/// Session protocol errors
#[derive(Error, Debug)]
pub enum Error {
    /// Input does not have the exact length the format requires
    #[error("bad length: expected {expected} bytes, got {got}")]
    BadLength {
        /// Required size
        expected: usize,
        /// Actual size
        got: usize,
    },

    /// Invalid magic number
    #[error("invalid magic number: expected 0x42535631, got {found:#x}")]
    InvalidMagic {
        /// Found magic number
        found: u32,
    },

    /// Peer speaks a different protocol version
    #[error("unsupported protocol version {found} (expected {expected})")]
    VersionMismatch {
        /// Local protocol version
        expected: u32,
        /// Version carried by the packet
        found: u32,
    },

    /// Packet tag is not the one expected in this direction
    #[error("unexpected packet tag {found:?}")]
    UnexpectedTag {
        /// Raw tag bytes
        found: [u8; 4],
    },

    /// Nickname frame declares more bytes than the receiver can hold
    #[error("nickname too long: {len} bytes (capacity {capacity})")]
    NicknameTooLong {
        /// Declared length
        len: usize,
        /// Receiver storage capacity
        capacity: usize,
    },

    /// Content checksums differ
    #[error("content CRC32s differ (local {local:#010x}, remote {remote:#010x}); cannot use different games")]
    ContentMismatch {
        /// Locally loaded content checksum
        local: u32,
        /// Checksum announced by the peer
        remote: u32,
    },

    /// Implementation fingerprints differ
    #[error("implementations differ (local {local:#010x}, remote {remote:#010x}); use the exact same core and frontend version")]
    ImplementationMismatch {
        /// Local fingerprint
        local: u32,
        /// Peer fingerprint
        remote: u32,
    },

    /// Save memory sizes differ
    #[error("save memory sizes do not correspond (local {local}, remote {remote})")]
    SaveMemoryMismatch {
        /// Local save memory size
        local: u32,
        /// Peer save memory size
        remote: u32,
    },

    /// Serializer state sizes differ
    #[error("serialization size mismatch (local {local}, remote {remote})")]
    StateSizeMismatch {
        /// Local serialize size
        local: u32,
        /// Size carried by the header
        remote: u32,
    },

    /// A handshake step failed on the wire
    #[error("{step} failed: {source}")]
    Transfer {
        /// The step that was in progress
        step: HandshakeStep,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The core refused to serialize or unserialize its state
    #[error("core failed to {0} state")]
    Core(&'static str),

    /// Allocation failure while growing a buffer
    #[error("failed to allocate {what} ({size} entries)")]
    ResourceExhausted {
        /// What was being allocated
        what: &'static str,
        /// Requested size
        size: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadLength { .. }
            | Self::InvalidMagic { .. }
            | Self::VersionMismatch { .. }
            | Self::UnexpectedTag { .. }
            | Self::NicknameTooLong { .. } => ErrorKind::ProtocolMismatch,
            Self::ContentMismatch { .. }
            | Self::ImplementationMismatch { .. }
            | Self::SaveMemoryMismatch { .. }
            | Self::StateSizeMismatch { .. } => ErrorKind::ConsistencyMismatch,
            Self::Transfer { .. } | Self::Core(_) | Self::Io(_) => ErrorKind::IoFailure,
            Self::ResourceExhausted { .. } => ErrorKind::ResourceExhaustion,
        }
    }

    pub(crate) fn transfer(step: HandshakeStep) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Transfer { step, source }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
