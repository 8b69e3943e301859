//! compression/dictionary.rs
//! Fixed shared preset dictionary.
//!
//! Both sides must preset the same bytes. The frame records the dictionary id
//! and a CRC-32 of its bytes so a reader built with a different dictionary
//! reports `DictionaryMismatch` instead of silently producing garbage.

use std::sync::Arc;

use crate::utils::compute_checksum;

/// Tokens that recur in document streams; seeding them shortens small frames.
const BUILTIN_BYTES: &[u8] = b"\
GLUEDOC\nDATA\0NAME\0TYPE\0TLEN\0STRC\0ENDB\0REND\0TEST\0GLOB\0USER\0\
object\0mesh\0material\0texture\0camera\0light\0world\0scene\0screen\0\
vertex\0edge\0face\0loop\0layer\0custom\0data\0flag\0index\0count\0\
location\0rotation\0scale\0matrix\0parent\0children\0modifier\0\
\0\0\0\0\0\0\0\0\xff\xff\xff\xff\0\0\x80\x3f\0\0\0\0\0\0\0\0";

/// Preset dictionary shared by writer and reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dictionary {
    id: u32,
    bytes: Arc<[u8]>,
    checksum: u32,
}

impl Dictionary {
    pub const BUILTIN_ID: u32 = 1;

    /// The dictionary every document written by this crate uses.
    pub fn builtin() -> Self {
        Self::new(Self::BUILTIN_ID, BUILTIN_BYTES)
    }

    pub fn new(id: u32, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let checksum = compute_checksum(&bytes);
        Self { id, bytes, checksum }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// CRC-32 of the dictionary bytes, computed once at construction.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::builtin()
    }
}
