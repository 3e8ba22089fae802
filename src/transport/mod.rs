//! Stream and datagram transport primitives

#[cfg(feature = "debug-tools")]
mod debug;
mod socket;
mod stream;

#[cfg(feature = "debug-tools")]
pub use debug::DatagramCapture;
pub use socket::{SocketBinding, SocketError};
pub use stream::{StreamTransport, apply_timeout, connect};
