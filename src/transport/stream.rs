//! Blocking stream transport used by the handshake.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

/// Blocking all-or-nothing transfers over a connected stream.
///
/// Implemented for every `Read + Write`, so TCP streams, Unix sockets and
/// in-memory pipes all work.
pub trait StreamTransport {
    /// Send the whole buffer or fail.
    fn send_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Fill the whole buffer or fail.
    fn recv_all(&mut self, buf: &mut [u8]) -> io::Result<()>;
}

impl<T: Read + Write> StreamTransport for T {
    fn send_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)?;
        self.flush()
    }

    fn recv_all(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.read_exact(buf)
    }
}

/// Bound every blocking read and write on `stream` by `timeout`.
///
/// `None` restores fully blocking behavior.
pub fn apply_timeout(stream: &TcpStream, timeout: Option<Duration>) -> io::Result<()> {
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;
    stream.set_nodelay(true)?;
    Ok(())
}

/// Connect to a host with the handshake timeout applied to the connect
/// itself and to every later transfer.
pub fn connect(addr: SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let stream = match timeout {
        Some(limit) => TcpStream::connect_timeout(&addr, limit)?,
        None => TcpStream::connect(addr)?,
    };
    apply_timeout(&stream, timeout)?;
    debug!(%addr, ?timeout, "tcp connection established");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn cursor_short_read_fails() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; 4];
        let err = cursor.recv_all(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn timeout_applies_to_reads() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = connect(addr, Some(Duration::from_millis(50))).unwrap();
        let (_server, _) = listener.accept().unwrap();

        let mut buf = [0u8; 1];
        let err = client.recv_all(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));
    }
}
