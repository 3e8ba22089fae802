//! Fixed-width, NUL-padded string fields.
//!
//! Every write into a wire string field goes through [`write`], which
//! truncates to `field.len() - 1` bytes and zero-fills the rest, so the
//! field is always terminated. [`read`] never trusts the wire to have done
//! the same.

/// Copy `value` into `field`, truncating and NUL-terminating.
///
/// Returns the number of bytes of `value` that were kept. Truncation never
/// splits a UTF-8 sequence.
pub fn write(field: &mut [u8], value: &str) -> usize {
    let Some(limit) = field.len().checked_sub(1) else {
        return 0;
    };
    let mut len = value.len().min(limit);
    while !value.is_char_boundary(len) {
        len -= 1;
    }
    field[..len].copy_from_slice(&value.as_bytes()[..len]);
    field[len..].fill(0);
    len
}

/// Read a string field, stopping at the first NUL or at `field.len() - 1`.
///
/// Invalid UTF-8 is replaced rather than rejected; these fields are for
/// display only.
#[must_use]
pub fn read(field: &[u8]) -> String {
    let limit = field.len().saturating_sub(1);
    let bounded = &field[..limit];
    let end = bounded.iter().position(|&b| b == 0).unwrap_or(limit);
    String::from_utf8_lossy(&bounded[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_pads_with_zeroes() {
        let mut field = [0xFFu8; 8];
        assert_eq!(write(&mut field, "abc"), 3);
        assert_eq!(&field, b"abc\0\0\0\0\0");
    }

    #[test]
    fn write_truncates_and_terminates() {
        let mut field = [0xFFu8; 4];
        assert_eq!(write(&mut field, "abcdef"), 3);
        assert_eq!(&field, b"abc\0");
    }

    #[test]
    fn write_respects_char_boundaries() {
        let mut field = [0u8; 4];
        // 'é' is two bytes; only one fits after "ab".
        assert_eq!(write(&mut field, "abé"), 2);
        assert_eq!(read(&field), "ab");
    }

    #[test]
    fn read_forces_termination() {
        let field = *b"abcdefgh";
        assert_eq!(read(&field), "abcdefg");
    }

    #[test]
    fn read_stops_at_nul() {
        assert_eq!(read(b"ab\0cd\0\0\0"), "ab");
        assert_eq!(read(b""), "");
    }

    proptest::proptest! {
        #[test]
        fn written_field_reads_back_as_prefix(value in "[^\\x00]{0,48}", width in 1usize..40) {
            let mut field = vec![0xAAu8; width];
            let kept = write(&mut field, &value);
            proptest::prop_assert!(kept < width);
            proptest::prop_assert_eq!(field[width - 1], 0);
            proptest::prop_assert_eq!(read(&field), &value[..kept]);
        }
    }
}
