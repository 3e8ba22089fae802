//! Session protocol core implementation
//!
//! This module provides the wire formats shared by the handshake, the LAN
//! discovery service and the movie file: the consistency header, nickname
//! frames, advertisement packets and the implementation fingerprint.

pub mod advert;
mod error;
pub mod fingerprint;
pub mod fixed_str;
mod header;
pub mod metrics;
mod nickname;

pub use advert::Advertisement;
pub use error::{Error, ErrorKind, Result};
pub use fingerprint::implementation_fingerprint;
pub use header::{SessionHeader, verify_magic};
pub use metrics::MetricsSnapshot;
pub use nickname::Nickname;

/// BSV magic number: "BSV1" in ASCII
pub const BSV_MAGIC: u32 = 0x4253_5631;

/// Header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Handshake summary size in bytes (three big-endian words)
pub const SUMMARY_SIZE: usize = 12;

/// Receiver-side nickname storage capacity
pub const NICK_CAPACITY: usize = 32;

/// LAN discovery protocol version
pub const PROTOCOL_VERSION: u32 = 1;
