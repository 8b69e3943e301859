// ## 📂 File: `src/headers/types.rs`

//! headers/types.rs
//! Fixed binary frame headers and the signer record.
//!
//! Wire notes:
//! - Every frame header starts with its own sentinel byte and ends with a
//!   CRC-32 over all preceding header bytes.
//! - Integers are big-endian. Key and signature slots are fixed 130-byte
//!   arrays followed by their used length.
//! - Header structs never outlive the parse that produced them.

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{magic, MAX_KEY_FIELD_LEN};
use crate::headers::encode::{put_i32, put_key_slot, put_u32, put_u8};
use crate::headers::decode::FieldReader;
use crate::utils::compute_checksum;

/// Stage selected by a stream-glue frame.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
pub enum StageType {
    /// Raw document bytes, innermost frame.
    Document = 1,
    Compress = 2,
    Crypto   = 3,
    Sign     = 4,
    /// Payload is itself dispatcher-framed data.
    LoopBack = 5,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("header buffer too short: {have} < {need}")]
    BufferTooShort { have: usize, need: usize },

    #[error("bad magic 0x{found:02x}, expected 0x{expected:02x}")]
    BadMagic { found: u8, expected: u8 },

    #[error("header checksum mismatch (stored 0x{stored:08x}, computed 0x{computed:08x})")]
    BadHeaderChecksum { stored: u32, computed: u32 },

    #[error("field {field}: length {len} does not fit slot of {max} bytes")]
    FieldOverflow { field: &'static str, len: i64, max: usize },

    #[error("field {field}: not valid UTF-8")]
    InvalidText { field: &'static str },
}

/// Common shape of every CRC-trailed frame header.
///
/// Implementors only describe their body; `encode`/`decode` add the CRC
/// trailer and the magic / checksum validation.
pub trait FrameHeader: Sized {
    /// Encoded size including magic and CRC trailer.
    const LEN: usize;
    /// Sentinel byte at offset 0.
    const MAGIC: u8;

    /// Pack every field except the CRC trailer.
    fn put_body(&self, out: &mut Vec<u8>);

    /// Unpack the body (magic and CRC already validated).
    fn get_body(body: &[u8], crc: u32) -> Result<Self, HeaderError>;

    /// CRC-32 over the packed body.
    fn compute_crc(&self) -> u32 {
        let mut out = Vec::with_capacity(Self::LEN);
        self.put_body(&mut out);
        compute_checksum(&out)
    }

    fn encode(&self) -> Vec<u8> {
        crate::headers::encode::encode_header(self)
    }

    fn decode(buf: &[u8]) -> Result<Self, HeaderError> {
        crate::headers::decode::decode_header(buf)
    }
}

// ---------------------------------------------------------------------------
// Stream-glue frame
// ---------------------------------------------------------------------------

/// Precedes every stage frame; selects the stage on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamGlueFrame {
    pub magic: u8,
    /// Bytes belonging to the stage after this header.
    pub total_length: u32,
    pub stage_type: u32,
    pub header_crc32: u32,
}

impl StreamGlueFrame {
    pub fn new(stage: StageType, total_length: u32) -> Self {
        let mut frame = Self {
            magic: magic::STREAM_GLUE,
            total_length,
            stage_type: stage as u32,
            header_crc32: 0,
        };
        frame.header_crc32 = frame.compute_crc();
        frame
    }

    pub fn stage(&self) -> Option<StageType> {
        StageType::try_from_primitive(self.stage_type).ok()
    }
}

impl FrameHeader for StreamGlueFrame {
    const LEN: usize = 1 + 4 + 4 + 4;
    const MAGIC: u8 = magic::STREAM_GLUE;

    fn put_body(&self, out: &mut Vec<u8>) {
        put_u8(out, self.magic);
        put_u32(out, self.total_length);
        put_u32(out, self.stage_type);
    }

    fn get_body(body: &[u8], crc: u32) -> Result<Self, HeaderError> {
        let mut r = FieldReader::new(body);
        Ok(Self {
            magic: r.u8(),
            total_length: r.u32(),
            stage_type: r.u32(),
            header_crc32: crc,
        })
    }
}

// ---------------------------------------------------------------------------
// Compress frame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressFrame {
    pub magic: u8,
    pub compressed_length: u32,
    pub uncompressed_length: u32,
    pub dictionary_id: u32,
    /// CRC-32 of the dictionary bytes used by the compressor.
    pub dictionary_checksum: u32,
    pub header_crc32: u32,
}

impl CompressFrame {
    pub fn new(compressed_length: u32, uncompressed_length: u32, dictionary_id: u32, dictionary_checksum: u32) -> Self {
        let mut frame = Self {
            magic: magic::COMPRESS,
            compressed_length,
            uncompressed_length,
            dictionary_id,
            dictionary_checksum,
            header_crc32: 0,
        };
        frame.header_crc32 = frame.compute_crc();
        frame
    }
}

impl FrameHeader for CompressFrame {
    const LEN: usize = 1 + 4 * 5;
    const MAGIC: u8 = magic::COMPRESS;

    fn put_body(&self, out: &mut Vec<u8>) {
        put_u8(out, self.magic);
        put_u32(out, self.compressed_length);
        put_u32(out, self.uncompressed_length);
        put_u32(out, self.dictionary_id);
        put_u32(out, self.dictionary_checksum);
    }

    fn get_body(body: &[u8], crc: u32) -> Result<Self, HeaderError> {
        let mut r = FieldReader::new(body);
        Ok(Self {
            magic: r.u8(),
            compressed_length: r.u32(),
            uncompressed_length: r.u32(),
            dictionary_id: r.u32(),
            dictionary_checksum: r.u32(),
            header_crc32: crc,
        })
    }
}

// ---------------------------------------------------------------------------
// Crypto frame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoFrame {
    pub magic: u8,
    /// Ciphertext bytes following the header.
    pub payload_length: u32,
    /// Recipient public key (≤ 130 bytes).
    pub public_key: Vec<u8>,
    /// Symmetric key material wrapped under `public_key` (≤ 130 bytes).
    pub wrapped_key: Vec<u8>,
    /// CRC-32 of the ciphertext.
    pub payload_checksum: u32,
    pub header_crc32: u32,
}

impl CryptoFrame {
    pub fn new(
        payload_length: u32,
        public_key: &[u8],
        wrapped_key: &[u8],
        payload_checksum: u32,
    ) -> Result<Self, HeaderError> {
        check_slot("public_key", public_key.len())?;
        check_slot("wrapped_key", wrapped_key.len())?;
        let mut frame = Self {
            magic: magic::CRYPTO,
            payload_length,
            public_key: public_key.to_vec(),
            wrapped_key: wrapped_key.to_vec(),
            payload_checksum,
            header_crc32: 0,
        };
        frame.header_crc32 = frame.compute_crc();
        Ok(frame)
    }
}

impl FrameHeader for CryptoFrame {
    const LEN: usize = 1 + 4 + MAX_KEY_FIELD_LEN + 4 + MAX_KEY_FIELD_LEN + 4 + 4 + 4;
    const MAGIC: u8 = magic::CRYPTO;

    fn put_body(&self, out: &mut Vec<u8>) {
        put_u8(out, self.magic);
        put_u32(out, self.payload_length);
        let pk_len = put_key_slot(out, &self.public_key);
        put_u32(out, pk_len as u32);
        let wk_len = put_key_slot(out, &self.wrapped_key);
        put_i32(out, wk_len as i32);
        put_u32(out, self.payload_checksum);
    }

    fn get_body(body: &[u8], crc: u32) -> Result<Self, HeaderError> {
        let mut r = FieldReader::new(body);
        let magic = r.u8();
        let payload_length = r.u32();
        let pk_slot = r.bytes::<MAX_KEY_FIELD_LEN>();
        let pk_len = r.u32() as i64;
        let wk_slot = r.bytes::<MAX_KEY_FIELD_LEN>();
        let wk_len = r.i32() as i64;
        let payload_checksum = r.u32();
        Ok(Self {
            magic,
            payload_length,
            public_key: take_slot("public_key", &pk_slot, pk_len)?,
            wrapped_key: take_slot("wrapped_key", &wk_slot, wk_len)?,
            payload_checksum,
            header_crc32: crc,
        })
    }
}

// ---------------------------------------------------------------------------
// Sign frame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignFrame {
    pub magic: u8,
    /// Payload bytes following the signer record.
    pub payload_length: u32,
    /// Signer public key (≤ 130 bytes).
    pub public_key: Vec<u8>,
    /// Signature over digest(SignerInfo ‖ payload) (≤ 130 bytes).
    pub signature: Vec<u8>,
    /// CRC-32 of the payload.
    pub payload_checksum: u32,
    pub header_crc32: u32,
}

impl SignFrame {
    pub fn new(
        payload_length: u32,
        public_key: &[u8],
        signature: &[u8],
        payload_checksum: u32,
    ) -> Result<Self, HeaderError> {
        check_slot("public_key", public_key.len())?;
        check_slot("signature", signature.len())?;
        let mut frame = Self {
            magic: magic::SIGN,
            payload_length,
            public_key: public_key.to_vec(),
            signature: signature.to_vec(),
            payload_checksum,
            header_crc32: 0,
        };
        frame.header_crc32 = frame.compute_crc();
        Ok(frame)
    }
}

impl FrameHeader for SignFrame {
    const LEN: usize = 1 + 4 + MAX_KEY_FIELD_LEN + 4 + MAX_KEY_FIELD_LEN + 4 + 4 + 4;
    const MAGIC: u8 = magic::SIGN;

    fn put_body(&self, out: &mut Vec<u8>) {
        put_u8(out, self.magic);
        put_u32(out, self.payload_length);
        let pk_len = put_key_slot(out, &self.public_key);
        put_u32(out, pk_len as u32);
        let sig_len = put_key_slot(out, &self.signature);
        put_i32(out, sig_len as i32);
        put_u32(out, self.payload_checksum);
    }

    fn get_body(body: &[u8], crc: u32) -> Result<Self, HeaderError> {
        let mut r = FieldReader::new(body);
        let magic = r.u8();
        let payload_length = r.u32();
        let pk_slot = r.bytes::<MAX_KEY_FIELD_LEN>();
        let pk_len = r.u32() as i64;
        let sig_slot = r.bytes::<MAX_KEY_FIELD_LEN>();
        let sig_len = r.i32() as i64;
        let payload_checksum = r.u32();
        Ok(Self {
            magic,
            payload_length,
            public_key: take_slot("public_key", &pk_slot, pk_len)?,
            signature: take_slot("signature", &sig_slot, sig_len)?,
            payload_checksum,
            header_crc32: crc,
        })
    }
}

// ---------------------------------------------------------------------------
// Signer record
// ---------------------------------------------------------------------------

/// Slot sizes of the signer record, in wire order.
pub mod signer_slots {
    pub const NAME: usize = 64;
    pub const EMAIL: usize = 64;
    pub const HOME_URL: usize = 256;
    pub const FREE_TEXT: usize = 256;
    pub const KEY_URL_PRIMARY: usize = 256;
    pub const KEY_URL_SECONDARY: usize = 256;
}

/// Identity of whoever signed a document. Streamed right after the sign
/// frame header and covered by the signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    pub name: String,
    pub email: String,
    pub home_url: String,
    pub free_text: String,
    pub key_url_primary: String,
    pub key_url_secondary: String,
}

impl SignerInfo {
    pub const LEN: usize = signer_slots::NAME
        + signer_slots::EMAIL
        + signer_slots::HOME_URL
        + signer_slots::FREE_TEXT
        + signer_slots::KEY_URL_PRIMARY
        + signer_slots::KEY_URL_SECONDARY;

    fn fields(&self) -> [(&'static str, &str, usize); 6] {
        [
            ("name", &self.name, signer_slots::NAME),
            ("email", &self.email, signer_slots::EMAIL),
            ("home_url", &self.home_url, signer_slots::HOME_URL),
            ("free_text", &self.free_text, signer_slots::FREE_TEXT),
            ("key_url_primary", &self.key_url_primary, signer_slots::KEY_URL_PRIMARY),
            ("key_url_secondary", &self.key_url_secondary, signer_slots::KEY_URL_SECONDARY),
        ]
    }

    /// NUL-padded fixed-size record. Fails if a field does not fit its slot.
    pub fn encode(&self) -> Result<Vec<u8>, HeaderError> {
        let mut out = Vec::with_capacity(Self::LEN);
        for (field, value, slot) in self.fields() {
            let bytes = value.as_bytes();
            if bytes.len() > slot {
                return Err(HeaderError::FieldOverflow { field, len: bytes.len() as i64, max: slot });
            }
            out.extend_from_slice(bytes);
            out.resize(out.len() + slot - bytes.len(), 0);
        }
        debug_assert_eq!(out.len(), Self::LEN);
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < Self::LEN {
            return Err(HeaderError::BufferTooShort { have: buf.len(), need: Self::LEN });
        }
        let mut off = 0usize;
        let mut next = |field: &'static str, slot: usize| -> Result<String, HeaderError> {
            let raw = &buf[off..off + slot];
            off += slot;
            let end = raw.iter().position(|&b| b == 0).unwrap_or(slot);
            String::from_utf8(raw[..end].to_vec()).map_err(|_| HeaderError::InvalidText { field })
        };
        Ok(Self {
            name: next("name", signer_slots::NAME)?,
            email: next("email", signer_slots::EMAIL)?,
            home_url: next("home_url", signer_slots::HOME_URL)?,
            free_text: next("free_text", signer_slots::FREE_TEXT)?,
            key_url_primary: next("key_url_primary", signer_slots::KEY_URL_PRIMARY)?,
            key_url_secondary: next("key_url_secondary", signer_slots::KEY_URL_SECONDARY)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Slot helpers
// ---------------------------------------------------------------------------

fn check_slot(field: &'static str, len: usize) -> Result<(), HeaderError> {
    if len > MAX_KEY_FIELD_LEN {
        return Err(HeaderError::FieldOverflow { field, len: len as i64, max: MAX_KEY_FIELD_LEN });
    }
    Ok(())
}

fn take_slot(field: &'static str, slot: &[u8; MAX_KEY_FIELD_LEN], len: i64) -> Result<Vec<u8>, HeaderError> {
    if len < 0 || len as usize > MAX_KEY_FIELD_LEN {
        return Err(HeaderError::FieldOverflow { field, len, max: MAX_KEY_FIELD_LEN });
    }
    Ok(slot[..len as usize].to_vec())
}
