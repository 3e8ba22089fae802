//! Implementation fingerprint.
//!
//! Not really a hash, but enough to tell most core builds and frontend
//! versions apart. It is a heuristic sanity check and collides easily:
//! subtle implementation differences that leave the four inputs unchanged
//! go unnoticed. Never use it as a security boundary.

/// Fold the core API version, core library name and version and the
/// frontend version into a single 32-bit value.
///
/// Core strings are shifted by `index & 0xf`; the frontend version by
/// `(index & 0xf) + 16`, so it lands in the upper half of the word.
#[must_use]
pub fn implementation_fingerprint(
    api_version: u32,
    library_name: &str,
    library_version: &str,
    frontend_version: &str,
) -> u32 {
    let mut res = api_version;
    res = fold(res, library_name.as_bytes(), 0);
    res = fold(res, library_version.as_bytes(), 0);
    fold(res, frontend_version.as_bytes(), 16)
}

fn fold(mut acc: u32, bytes: &[u8], bias: usize) -> u32 {
    for (i, &b) in bytes.iter().enumerate() {
        acc ^= u32::from(b) << ((i & 0xf) + bias);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_yield_api_version() {
        assert_eq!(implementation_fingerprint(1, "", "", ""), 1);
    }

    #[test]
    fn known_value() {
        // 'a' = 0x61, 'b' << 1 = 0xC4, 'c' = 0x63 in the upper half.
        let expected = 1 ^ 0x61 ^ (0x62 << 1) ^ (0x63 << 16);
        assert_eq!(implementation_fingerprint(1, "ab", "", "c"), expected);
    }

    #[test]
    fn deterministic() {
        let a = implementation_fingerprint(1, "snes9x", "1.53", "0.9.9");
        let b = implementation_fingerprint(1, "snes9x", "1.53", "0.9.9");
        assert_eq!(a, b);
    }

    #[test]
    fn single_character_changes_output() {
        let base = implementation_fingerprint(1, "snes9x", "1.53", "0.9.9");
        assert_ne!(base, implementation_fingerprint(1, "snes9y", "1.53", "0.9.9"));
        assert_ne!(base, implementation_fingerprint(1, "snes9x", "1.54", "0.9.9"));
        assert_ne!(base, implementation_fingerprint(1, "snes9x", "1.53", "0.9.8"));
        assert_ne!(base, implementation_fingerprint(2, "snes9x", "1.53", "0.9.9"));
    }

    #[test]
    fn shift_wraps_every_sixteen_bytes() {
        // Index 16 shifts by 0 again, so the same byte at index 0 and 16 cancels.
        let name = "a_______________a";
        let with_pair = implementation_fingerprint(0, name, "", "");
        let underscores = implementation_fingerprint(0, &name[1..16], "", "");
        assert_eq!(with_pair, underscores << 1);
    }
}
