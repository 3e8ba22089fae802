//! Length-prefixed nickname frames.
//!
//! ```text
//! [len (u8)][len bytes of nickname]
//! ```

use std::fmt;

use super::{Error, NICK_CAPACITY, Result};

/// A player nickname bounded by [`NICK_CAPACITY`].
///
/// At most `NICK_CAPACITY - 1` bytes are kept, mirroring the receiver-side
/// rule that a declared length equal to the capacity is already too long.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nickname(String);

impl Nickname {
    /// Build a nickname, truncating on a character boundary if needed.
    #[must_use]
    pub fn new(value: &str) -> Self {
        let mut len = value.len().min(NICK_CAPACITY - 1);
        while !value.is_char_boundary(len) {
            len -= 1;
        }
        Self(value[..len].to_owned())
    }

    /// Build a nickname from raw wire bytes.
    ///
    /// Callers validate the length first with [`Nickname::check_declared_len`].
    #[must_use]
    pub fn from_wire(bytes: &[u8]) -> Self {
        Self::new(&String::from_utf8_lossy(bytes))
    }

    /// Validate a length prefix read from the wire.
    pub fn check_declared_len(len: u8) -> Result<usize> {
        let len = usize::from(len);
        if len >= NICK_CAPACITY {
            return Err(Error::NicknameTooLong {
                len,
                capacity: NICK_CAPACITY,
            });
        }
        Ok(len)
    }

    /// Borrow the nickname.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes; always below [`NICK_CAPACITY`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the nickname is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as a length-prefixed frame.
    #[must_use]
    pub fn frame(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.0.len());
        // len < NICK_CAPACITY, so it always fits in the prefix byte.
        out.push(self.0.len() as u8);
        out.extend_from_slice(self.0.as_bytes());
        out
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Nickname {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
