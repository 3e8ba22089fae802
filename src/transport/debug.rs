//! PCAP capture of discovery datagrams (feature `debug-tools`).
//!
//! Payloads are stored without IP/UDP framing under a user link type, so
//! Wireshark shows the raw advertisement bytes.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const PCAP_MAGIC: u32 = 0xa1b2_c3d4;
const PCAP_VERSION_MAJOR: u16 = 2;
const PCAP_VERSION_MINOR: u16 = 4;
const PCAP_SNAPLEN: u32 = 65_535;
const LINKTYPE_USER0: u32 = 147;

/// Append-only capture file for one direction of discovery traffic.
pub struct DatagramCapture {
    out: BufWriter<File>,
    packets: u64,
}

impl DatagramCapture {
    /// Create a capture at `path`, truncating any existing file.
    pub fn create(path: &Path) -> io::Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        let mut header = [0u8; 24];
        header[0..4].copy_from_slice(&PCAP_MAGIC.to_le_bytes());
        header[4..6].copy_from_slice(&PCAP_VERSION_MAJOR.to_le_bytes());
        header[6..8].copy_from_slice(&PCAP_VERSION_MINOR.to_le_bytes());
        // thiszone and sigfigs stay zero
        header[16..20].copy_from_slice(&PCAP_SNAPLEN.to_le_bytes());
        header[20..24].copy_from_slice(&LINKTYPE_USER0.to_le_bytes());
        out.write_all(&header)?;
        out.flush()?;
        Ok(Self { out, packets: 0 })
    }

    /// Record one datagram with the current wall-clock time.
    pub fn record(&mut self, datagram: &[u8]) -> io::Result<()> {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let secs = u32::try_from(since_epoch.as_secs()).unwrap_or(u32::MAX);
        let captured = datagram.len().min(PCAP_SNAPLEN as usize);
        let original = u32::try_from(datagram.len()).unwrap_or(u32::MAX);

        let mut record = [0u8; 16];
        record[0..4].copy_from_slice(&secs.to_le_bytes());
        record[4..8].copy_from_slice(&since_epoch.subsec_micros().to_le_bytes());
        record[8..12].copy_from_slice(&(captured as u32).to_le_bytes());
        record[12..16].copy_from_slice(&original.to_le_bytes());

        self.out.write_all(&record)?;
        self.out.write_all(&datagram[..captured])?;
        self.out.flush()?;
        self.packets += 1;
        Ok(())
    }

    /// Number of datagrams captured so far.
    #[must_use]
    pub fn packets(&self) -> u64 {
        self.packets
    }
}

impl std::fmt::Debug for DatagramCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatagramCapture")
            .field("packets", &self.packets)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("send.pcap");
        let mut capture = DatagramCapture::create(&path).unwrap();
        capture.record(b"RANQ\0\0\0\x01").unwrap();
        assert_eq!(capture.packets(), 1);
        drop(capture);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 24 + 16 + 8);
        assert_eq!(&bytes[0..4], &PCAP_MAGIC.to_le_bytes());
        assert_eq!(&bytes[24 + 8..24 + 12], &8u32.to_le_bytes());
        assert_eq!(&bytes[40..44], b"RANQ");
    }
}
