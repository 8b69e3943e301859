//! compression/mod.rs
//! Compression stage: zlib streams preset with a shared dictionary.

pub mod dictionary;
pub mod deflate;
pub mod inflate;

pub use dictionary::Dictionary;
pub use deflate::{compress, CompressedFrame};
pub use inflate::{decompress, Inflater};
