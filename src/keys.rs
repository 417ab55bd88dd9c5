//! Hex-encoded AES key decoding (C3, §4.3).
//!
//! The editor's encryption key field accepts a 64-character hex string but is
//! tolerant of user error: characters are decoded pairwise, and a byte whose
//! two hex digits can't be parsed decodes to zero rather than rejecting the
//! whole key. A key shorter than 64 characters is treated as if the remainder
//! were all zero digits. [`hex::decode`] does not offer this behavior, since it
//! fails the whole string on any invalid nibble, so the decode is done by hand.

/// Decodes a (possibly malformed or short) 64-hex-character string into a 32-byte
/// AES-256 key, zero-filling anything that doesn't parse.
pub fn decode_key(input: &str) -> [u8; 32] {
    let mut key = [0u8; 32];
    let digits: Vec<u8> = input.bytes().collect();
    for (i, slot) in key.iter_mut().enumerate() {
        let hi = digits.get(i * 2).copied();
        let lo = digits.get(i * 2 + 1).copied();
        let hi = hi.and_then(hex_nibble).unwrap_or(0);
        let lo = lo.and_then(hex_nibble).unwrap_or(0);
        *slot = (hi << 4) | lo;
    }
    key
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Encodes a 32-byte key back to a 64-character lowercase hex string, as written
/// into `export_presets.cfg` (§6.4).
pub fn encode_key(key: &[u8; 32]) -> String {
    hex::encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_key() {
        let key = decode_key(&"ab".repeat(32));
        assert_eq!(key, [0xab; 32]);
    }

    #[test]
    fn zero_fills_short_input() {
        let key = decode_key("abcd");
        assert_eq!(key[0], 0xab);
        assert_eq!(key[1], 0xcd);
        assert_eq!(&key[2..], &[0u8; 30]);
    }

    #[test]
    fn zero_fills_invalid_nibbles() {
        let key = decode_key("zzcd");
        assert_eq!(key[0], 0x00);
        assert_eq!(key[1], 0xcd);
    }

    #[test]
    fn round_trips_through_encode() {
        let original = [0x42u8; 32];
        let decoded = decode_key(&encode_key(&original));
        assert_eq!(decoded, original);
    }
}
