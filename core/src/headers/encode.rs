// ## 📂 File: `src/headers/encode.rs`
//! src/headers/encode.rs
//!
//! Header encoding utilities.
//!
//! Design notes:
//! - Serializes frame headers in big-endian (network) order.
//! - Field order must match `decode.rs` exactly.
//! - The CRC-32 trailer is always recomputed from the packed body.

use crate::constants::MAX_KEY_FIELD_LEN;
use crate::headers::types::FrameHeader;
use crate::utils::compute_checksum;

/// Serialize a frame header and append its CRC-32 trailer.
pub fn encode_header<H: FrameHeader>(h: &H) -> Vec<u8> {
    let mut out = Vec::with_capacity(H::LEN);
    h.put_body(&mut out);

    let crc = compute_checksum(&out);
    put_u32(&mut out, crc);

    // Sanity check: ensure we wrote exactly H::LEN bytes.
    debug_assert_eq!(out.len(), H::LEN, "encoding wrote incorrect length");
    out
}

#[inline]
pub(crate) fn put_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

#[inline]
pub(crate) fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

#[inline]
pub(crate) fn put_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// Write a zero-padded fixed key slot; returns the number of bytes used.
/// Constructors already reject oversized keys, so clamping never drops data.
pub(crate) fn put_key_slot(out: &mut Vec<u8>, key: &[u8]) -> usize {
    debug_assert!(key.len() <= MAX_KEY_FIELD_LEN);
    let used = key.len().min(MAX_KEY_FIELD_LEN);
    out.extend_from_slice(&key[..used]);
    out.resize(out.len() + MAX_KEY_FIELD_LEN - used, 0);
    used
}
