//! Alignment padding and content hashing (C1).
use rand::RngCore;

/// Default alignment, in bytes, used for PCK body entries (§4.1, §6.1).
pub const DEFAULT_ALIGNMENT: u64 = 16;

/// Returns the number of padding bytes needed after writing `len` bytes so that the
/// next write starts on an `align`-byte boundary. Returns `0` when `align <= 1`.
pub fn pad_amount(align: u64, len: u64) -> u64 {
    if align <= 1 {
        return 0;
    }
    let remainder = len % align;
    if remainder == 0 { 0 } else { align - remainder }
}

/// Fills `buf` with cryptographically-insignificant random bytes for use as padding.
///
/// Godot deliberately pads with random bytes rather than zeroes, matching [`DEFAULT_ALIGNMENT`]-byte
/// aligned emission (§4.1 invariant I4); re-running a build against unchanged inputs will vary
/// by padding bytes alone unless [`fill_padding_deterministic`] is used instead.
pub fn fill_padding(buf: &mut [u8]) {
    rand::rng().fill_bytes(buf);
}

/// Fills `buf` with zero bytes. Used by test scenarios that need byte-for-byte
/// reproducible archives (R2).
pub fn fill_padding_deterministic(buf: &mut [u8]) {
    buf.fill(0);
}

/// Computes the MD5 digest of a byte buffer, as stored in the PCK directory (§6.1).
pub fn md5_digest(data: &[u8]) -> [u8; 16] {
    md5::compute(data).0
}
