//! Session consistency header
//!
//! The same 16-byte header opens every BSV movie file and every spectator
//! bootstrap stream.

use super::{BSV_MAGIC, Error, HEADER_SIZE, Result};

/// Session consistency header (16 bytes)
///
/// # Wire Format
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     Magic "BSV1" (4)                          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     Serializer Tag (4)                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     Content CRC32 (4)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     State Size (4)                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The magic is stored so its ASCII bytes read "BSV1" in a hex dump. Files
/// written by older builds carry it in the opposite order, so readers accept
/// both (see [`verify_magic`]). The remaining words are big-endian and only
/// ever read in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionHeader {
    magic: u32,
    serializer_tag: u32,
    content_crc: u32,
    state_size: u32,
}

impl SessionHeader {
    /// Create a header carrying the canonical magic.
    #[must_use]
    pub const fn new(serializer_tag: u32, content_crc: u32, state_size: u32) -> Self {
        Self {
            magic: BSV_MAGIC,
            serializer_tag,
            content_crc,
            state_size,
        }
    }

    /// Create a header from raw words, magic included.
    #[must_use]
    pub const fn from_words(
        magic: u32,
        serializer_tag: u32,
        content_crc: u32,
        state_size: u32,
    ) -> Self {
        Self {
            magic,
            serializer_tag,
            content_crc,
            state_size,
        }
    }

    /// Get magic number as decoded from the wire
    #[must_use]
    pub const fn magic(&self) -> u32 {
        self.magic
    }

    /// Get serializer tag
    #[must_use]
    pub const fn serializer_tag(&self) -> u32 {
        self.serializer_tag
    }

    /// Get content checksum
    #[must_use]
    pub const fn content_crc(&self) -> u32 {
        self.content_crc
    }

    /// Get size of the state blob that follows the header
    #[must_use]
    pub const fn state_size(&self) -> u32 {
        self.state_size
    }

    /// Whether the magic is recognised in either byte order.
    #[must_use]
    pub const fn has_valid_magic(&self) -> bool {
        verify_magic(self.magic)
    }

    /// Encode to the 16-byte wire form.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];

        bytes[0..4].copy_from_slice(&self.magic.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.serializer_tag.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.content_crc.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.state_size.to_be_bytes());

        bytes
    }

    /// Decode from exactly 16 bytes.
    ///
    /// The magic is not validated here; playback and spectator bootstrap
    /// apply different policies to it.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let Ok(raw) = <&[u8; HEADER_SIZE]>::try_from(bytes) else {
            return Err(Error::BadLength {
                expected: HEADER_SIZE,
                got: bytes.len(),
            });
        };

        Ok(Self {
            magic: word(raw, 0),
            serializer_tag: word(raw, 1),
            content_crc: word(raw, 2),
            state_size: word(raw, 3),
        })
    }

    /// Strictly compare against the header this side would have produced.
    ///
    /// Only the canonical magic order is accepted here: a live peer is never
    /// an old file.
    pub fn verify(&self, expected: &Self) -> Result<()> {
        if self.magic != BSV_MAGIC {
            return Err(Error::InvalidMagic { found: self.magic });
        }
        if self.serializer_tag != expected.serializer_tag {
            return Err(Error::ImplementationMismatch {
                local: expected.serializer_tag,
                remote: self.serializer_tag,
            });
        }
        if self.content_crc != expected.content_crc {
            return Err(Error::ContentMismatch {
                local: expected.content_crc,
                remote: self.content_crc,
            });
        }
        if self.state_size != expected.state_size {
            return Err(Error::StateSizeMismatch {
                local: expected.state_size,
                remote: self.state_size,
            });
        }
        Ok(())
    }
}

fn word(raw: &[u8; HEADER_SIZE], index: usize) -> u32 {
    let start = index * 4;
    u32::from_be_bytes([
        raw[start],
        raw[start + 1],
        raw[start + 2],
        raw[start + 3],
    ])
}

/// Accept the BSV magic in either byte order.
#[must_use]
pub const fn verify_magic(word: u32) -> bool {
    word == BSV_MAGIC || word.swap_bytes() == BSV_MAGIC
}
