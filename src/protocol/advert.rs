//! LAN advertisement packets (encode/decode)
//!
//! # Format
//!
//! ```text
//! [TAG "RANQ"|"RANS" (4)] [PROTOCOL VERSION (4)]
//! response only:
//! [PORT (4)] [FRONTEND VERSION (32)] [NICK (32)] [CORE (32)]
//! [CORE VERSION (32)] [CONTENT (256)] [CONTENT CRC, decimal text (32)]
//! ```
//!
//! Integers are big-endian. String fields are NUL-padded and always
//! terminated.

use bytes::{Buf, BufMut, BytesMut};

use super::{Error, Result, fixed_str};

/// Tag opening a discovery query.
pub const QUERY_TAG: [u8; 4] = *b"RANQ";

/// Tag opening a discovery response.
pub const RESPONSE_TAG: [u8; 4] = *b"RANS";

/// Width of short string fields.
pub const HOST_STR_LEN: usize = 32;

/// Width of the content name field.
pub const HOST_LONGSTR_LEN: usize = 256;

/// Size of a query on the wire (tag + version).
pub const QUERY_SIZE: usize = 8;

/// Size of a full response on the wire.
pub const RESPONSE_SIZE: usize = 12 + 5 * HOST_STR_LEN + HOST_LONGSTR_LEN;

/// Content shown when the host has no content name to advertise.
pub const NO_CONTENT: &str = "N/A";

/// Fields carried by a discovery response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advertisement {
    /// TCP port the host accepts netplay connections on.
    pub port: u32,
    /// Frontend version string.
    pub frontend_version: String,
    /// Host nickname.
    pub nick: String,
    /// Core library name.
    pub core: String,
    /// Core library version.
    pub core_version: String,
    /// Content display name.
    pub content: String,
    /// Content checksum.
    pub content_crc: u32,
}

/// Build a query into `buf`, replacing its contents.
pub fn encode_query(buf: &mut BytesMut, protocol_version: u32) {
    buf.clear();
    buf.put_slice(&QUERY_TAG);
    buf.put_u32(protocol_version);
}

/// Build a response into `buf`, replacing its contents.
pub fn encode_response(buf: &mut BytesMut, protocol_version: u32, ad: &Advertisement) {
    buf.clear();
    buf.reserve(RESPONSE_SIZE);
    buf.put_slice(&RESPONSE_TAG);
    buf.put_u32(protocol_version);
    buf.put_u32(ad.port);
    put_str::<HOST_STR_LEN>(buf, &ad.frontend_version);
    put_str::<HOST_STR_LEN>(buf, &ad.nick);
    put_str::<HOST_STR_LEN>(buf, &ad.core);
    put_str::<HOST_STR_LEN>(buf, &ad.core_version);
    let content = if ad.content.is_empty() {
        NO_CONTENT
    } else {
        ad.content.as_str()
    };
    put_str::<HOST_LONGSTR_LEN>(buf, content);
    // Written as a signed decimal, the way existing hosts print it.
    put_str::<HOST_STR_LEN>(buf, &(ad.content_crc as i32).to_string());
}

fn put_str<const N: usize>(buf: &mut BytesMut, value: &str) {
    let mut field = [0u8; N];
    fixed_str::write(&mut field, value);
    buf.put_slice(&field);
}

fn get_str<const N: usize>(cur: &mut &[u8]) -> String {
    let mut field = [0u8; N];
    cur.copy_to_slice(&mut field);
    fixed_str::read(&field)
}

/// Validate the common tag + version prefix.
pub fn check_prefix(bytes: &[u8], tag: [u8; 4], protocol_version: u32) -> Result<()> {
    if bytes.len() < QUERY_SIZE {
        return Err(Error::BadLength {
            expected: QUERY_SIZE,
            got: bytes.len(),
        });
    }
    let mut cur = bytes;
    let mut found = [0u8; 4];
    cur.copy_to_slice(&mut found);
    if found != tag {
        return Err(Error::UnexpectedTag { found });
    }
    let version = cur.get_u32();
    if version != protocol_version {
        return Err(Error::VersionMismatch {
            expected: protocol_version,
            found: version,
        });
    }
    Ok(())
}

/// Validate a query.
pub fn decode_query(bytes: &[u8], protocol_version: u32) -> Result<()> {
    check_prefix(bytes, QUERY_TAG, protocol_version)
}

/// Validate and parse a response.
pub fn decode_response(bytes: &[u8], protocol_version: u32) -> Result<Advertisement> {
    if bytes.len() < RESPONSE_SIZE {
        return Err(Error::BadLength {
            expected: RESPONSE_SIZE,
            got: bytes.len(),
        });
    }
    check_prefix(bytes, RESPONSE_TAG, protocol_version)?;

    let mut cur = &bytes[QUERY_SIZE..RESPONSE_SIZE];
    let port = cur.get_u32();
    let frontend_version = get_str::<HOST_STR_LEN>(&mut cur);
    let nick = get_str::<HOST_STR_LEN>(&mut cur);
    let core = get_str::<HOST_STR_LEN>(&mut cur);
    let core_version = get_str::<HOST_STR_LEN>(&mut cur);
    let content = get_str::<HOST_LONGSTR_LEN>(&mut cur);
    let content_crc = parse_decimal(&get_str::<HOST_STR_LEN>(&mut cur));

    Ok(Advertisement {
        port,
        frontend_version,
        nick,
        core,
        core_version,
        content,
        content_crc,
    })
}

/// Lenient decimal parse: optional sign then leading digits; anything
/// unparsable yields 0. Negative values wrap into the u32 range.
fn parse_decimal(text: &str) -> u32 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, d| {
            acc.wrapping_mul(10).wrapping_add(u32::from(d - b'0'))
        });
    if negative { value.wrapping_neg() } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Advertisement {
        Advertisement {
            port: 55435,
            frontend_version: "1.0.0".into(),
            nick: "host".into(),
            core: "snes9x".into(),
            core_version: "1.53".into(),
            content: "game.sfc".into(),
            content_crc: 0xDEAD_BEEF,
        }
    }

    #[test]
    fn test_response_size_and_layout() {
        let mut buf = BytesMut::new();
        encode_response(&mut buf, 1, &sample());
        assert_eq!(buf.len(), RESPONSE_SIZE);
        assert_eq!(&buf[0..4], b"RANS");
        assert_eq!(&buf[4..8], &1u32.to_be_bytes());
        assert_eq!(&buf[8..12], &55435u32.to_be_bytes());
        assert_eq!(&buf[12..17], b"1.0.0");
    }

    #[test]
    fn test_response_roundtrip_with_high_crc() {
        let mut buf = BytesMut::new();
        encode_response(&mut buf, 1, &sample());
        let decoded = decode_response(&buf, 1).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_empty_content_advertised_as_na() {
        let mut buf = BytesMut::new();
        let ad = Advertisement {
            content: String::new(),
            ..sample()
        };
        encode_response(&mut buf, 1, &ad);
        assert_eq!(decode_response(&buf, 1).unwrap().content, NO_CONTENT);
    }

    #[test]
    fn test_query_checks() {
        let mut buf = BytesMut::new();
        encode_query(&mut buf, 3);
        assert_eq!(buf.len(), QUERY_SIZE);
        assert!(decode_query(&buf, 3).is_ok());
        assert!(matches!(
            decode_query(&buf, 4),
            Err(Error::VersionMismatch {
                expected: 4,
                found: 3
            })
        ));
        assert!(matches!(
            decode_response(&buf, 3),
            Err(Error::BadLength { .. })
        ));
        assert!(matches!(
            decode_query(b"RANS\0\0\0\x03", 3),
            Err(Error::UnexpectedTag { .. })
        ));
    }

    #[test]
    fn test_response_checks() {
        let mut buf = BytesMut::new();
        encode_response(&mut buf, 2, &sample());
        assert!(matches!(
            decode_response(&buf, 1),
            Err(Error::VersionMismatch {
                expected: 1,
                found: 2
            })
        ));

        let mut query_tagged = buf.to_vec();
        query_tagged[..4].copy_from_slice(&QUERY_TAG);
        assert!(matches!(
            decode_response(&query_tagged, 2),
            Err(Error::UnexpectedTag { found }) if found == QUERY_TAG
        ));
    }

    #[test]
    fn test_unterminated_fields_are_terminated() {
        let mut buf = BytesMut::new();
        encode_response(&mut buf, 1, &sample());
        // Fill the nick field with non-NUL bytes.
        buf[12 + HOST_STR_LEN..12 + 2 * HOST_STR_LEN].fill(b'z');
        let decoded = decode_response(&buf, 1).unwrap();
        assert_eq!(decoded.nick, "z".repeat(HOST_STR_LEN - 1));
        assert_eq!(decoded.core, "snes9x");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("42"), 42);
        assert_eq!(parse_decimal("-1"), u32::MAX);
        assert_eq!(parse_decimal("  17abc"), 17);
        assert_eq!(parse_decimal("junk"), 0);
        assert_eq!(parse_decimal("4294967295"), u32::MAX);
    }
}
