//! netreplay - session consistency and replay for emulator frontends
//!
//! This library checks that two frontend instances, or a recorded movie and a
//! live instance, run byte-compatible content and core builds before any
//! state is shared. It covers the peer handshake, spectator bootstrap, LAN
//! discovery of hosted sessions and BSV input movies.
//!
//! # Quick Start
//!
//! ```rust
//! use netreplay::{SessionHeader, implementation_fingerprint};
//!
//! let fingerprint = implementation_fingerprint(1, "snes9x", "1.53", "1.0.0");
//! let header = SessionHeader::new(fingerprint, 0xDEAD_BEEF, 4096);
//!
//! let bytes = header.encode();
//! let decoded = SessionHeader::decode(&bytes)?;
//! assert_eq!(decoded, header);
//! # Ok::<(), netreplay::Error>(())
//! ```
//!
//! # Features
//!
//! - **Handshake** - summary exchange, nickname frames, save-memory sync
//! - **Spectators** - header plus full state bootstrap
//! - **LAN discovery** - non-blocking UDP advertiser and querier
//! - **Movies** - record and play back BSV input logs with rewind
//!
//! Diagnostics go through `tracing`; install a subscriber to see them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod discovery;
pub mod movie;
pub mod protocol;
pub mod session;
pub mod transport;

pub use discovery::{AdvertisedSession, DiscoveredHost, DiscoveryConfig, DiscoveryState};
pub use movie::{MovieConfig, MovieController, MovieHandle, MovieState};
pub use protocol::{
    BSV_MAGIC, Error, ErrorKind, HEADER_SIZE, Nickname, Result, SessionHeader,
    implementation_fingerprint, verify_magic,
};
pub use session::{
    Content, Core, HandshakeConfig, Initiator, LocalIdentity, MemoryId, Notifier, Responder,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default netplay and discovery port
pub const DEFAULT_PORT: u16 = 55435;
