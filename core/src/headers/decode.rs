// ## 📂 File: `src/headers/decode.rs`
//! src/headers/decode.rs
//!
//! Header decoding utilities.
//!
//! Design notes:
//! - Checks length, then magic, then the CRC-32 trailer, then the body.
//! - Field order must match `encode.rs` exactly.

use byteorder::{BigEndian, ByteOrder};

use crate::headers::types::{FrameHeader, HeaderError};
use crate::utils::compute_checksum;

/// Parse and validate a frame header from the first `H::LEN` bytes of `buf`.
///
/// # Returns
/// - `Err(HeaderError::BadMagic)` if byte 0 is not the frame's sentinel.
/// - `Err(HeaderError::BadHeaderChecksum)` if the CRC trailer disagrees.
pub fn decode_header<H: FrameHeader>(buf: &[u8]) -> Result<H, HeaderError> {
    if buf.len() < H::LEN {
        return Err(HeaderError::BufferTooShort { have: buf.len(), need: H::LEN });
    }
    if buf[0] != H::MAGIC {
        return Err(HeaderError::BadMagic { found: buf[0], expected: H::MAGIC });
    }

    let body = &buf[..H::LEN - 4];
    let stored = BigEndian::read_u32(&buf[H::LEN - 4..H::LEN]);
    let computed = compute_checksum(body);
    if stored != computed {
        return Err(HeaderError::BadHeaderChecksum { stored, computed });
    }

    H::get_body(body, stored)
}

/// Sequential big-endian reader over an already length-checked header body.
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn u8(&mut self) -> u8 {
        let v = self.buf[self.pos];
        self.pos += 1;
        v
    }

    pub(crate) fn u32(&mut self) -> u32 {
        let v = BigEndian::read_u32(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        v
    }

    pub(crate) fn i32(&mut self) -> i32 {
        let v = BigEndian::read_i32(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        v
    }

    pub(crate) fn bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut dst = [0u8; N];
        dst.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        dst
    }
}
