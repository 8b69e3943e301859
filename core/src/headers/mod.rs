//! headers/mod.rs
//! Header codec for every frame shape in the stream.
//!
//! Notes:
//! - Fixed-size headers enable push-based parsing: a stage accumulates exactly
//!   `LEN` bytes before it can validate anything.
//! - Each header carries its own sentinel byte and CRC-32 trailer.

pub mod types;
pub mod encode;
pub mod decode;

pub use types::*;
pub use encode::encode_header;
pub use decode::decode_header;
