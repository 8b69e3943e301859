//! constants.rs
//! Wire constants shared by every stage.
//!
//! All multi-byte integers on the wire are big-endian (network order).

/// Magic token opening every document.
pub const DOCUMENT_MAGIC: [u8; 7] = *b"GLUEDOC";

/// Size of the reserved block at the end of the document header.
pub const DOCUMENT_RESERVED_LEN: usize = 12;

/// Runtime bundle trailer marker (last 8 bytes of a bundle).
pub const RUNTIME_MARKER: [u8; 8] = *b"GLUERUNT";
/// `[start_offset u32][marker 8]`
pub const RUNTIME_TRAILER_LEN: usize = 4 + RUNTIME_MARKER.len();

/// Sentinel bytes opening each frame header.
pub mod magic {
    pub const STREAM_GLUE: u8 = 0xA5;
    pub const COMPRESS: u8 = 0xC7;
    pub const CRYPTO: u8 = 0xE3;
    pub const SIGN: u8 = 0x5D;
}

/// Upper bound for key / signature slots inside crypto and sign frames.
pub const MAX_KEY_FIELD_LEN: usize = 130;

/// Maximum number of actions in one write action list.
pub const MAX_ACTIONS: usize = 10;

/// Deepest stage nesting a reader will follow.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Read cache used by the terminal stage when the config does not override it.
pub const DEFAULT_READ_CACHE_SIZE: usize = 32 * 1024;
/// Read cache sanity bounds.
pub const MIN_READ_CACHE_SIZE: usize = 1;
pub const MAX_READ_CACHE_SIZE: usize = 16 * 1024 * 1024;

/// Scratch buffer used to drain the inflater.
pub const INFLATE_SCRATCH_LEN: usize = 16 * 1024;

/// Default zlib level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Version triples `(major, minor, patch)`.
pub const CURRENT_VERSION: (u8, u8, u8) = (2, 3, 1);
pub const MIN_COMPATIBLE_VERSION: (u8, u8, u8) = (2, 0, 0);

/// Document header flag bits.
pub mod flags {
    pub const HAS_COMPRESSION: u32 = 0x0001;
    pub const HAS_CRYPTO: u32 = 0x0002;
    pub const HAS_SIGNATURE: u32 = 0x0004;
}
