//! terminal/header.rs
//! Outer document header.
//!
//! ```text
//! [magic "GLUEDOC" 7][terminator "\n" | "\r\n"]
//! [min_version 4][version 4][flags u32][total_size u32][reserved 12]
//! ```
//! Versions are packed `[0, major, minor, patch]`. `total_size` counts every
//! byte after the header and is back-patched once the body is written.

use std::fmt;
use std::io::{self, Read};

use byteorder::{BigEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use crate::constants::{CURRENT_VERSION, DOCUMENT_MAGIC, DOCUMENT_RESERVED_LEN, MIN_COMPATIBLE_VERSION};
use crate::types::{PipelineError, Result, Stage};
use crate::utils::fmt_bytes;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionTriple {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl VersionTriple {
    pub const CURRENT: Self = Self::from_tuple(CURRENT_VERSION);
    pub const MIN_COMPATIBLE: Self = Self::from_tuple(MIN_COMPATIBLE_VERSION);

    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self { major, minor, patch }
    }

    const fn from_tuple(t: (u8, u8, u8)) -> Self {
        Self::new(t.0, t.1, t.2)
    }

    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes([0, self.major, self.minor, self.patch])
    }

    /// The leading byte is ignored.
    pub fn from_u32(raw: u32) -> Self {
        let [_, major, minor, patch] = raw.to_be_bytes();
        Self { major, minor, patch }
    }
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentHeader {
    pub line_ending: LineEnding,
    pub min_version: VersionTriple,
    pub version: VersionTriple,
    pub flags: u32,
    pub total_size: u32,
}

impl DocumentHeader {
    /// Header for a document written by this build; size still unknown.
    pub fn new(line_ending: LineEnding, flags: u32) -> Self {
        Self {
            line_ending,
            min_version: VersionTriple::MIN_COMPATIBLE,
            version: VersionTriple::CURRENT,
            flags,
            total_size: 0,
        }
    }

    pub fn encoded_len(&self) -> usize {
        DOCUMENT_MAGIC.len() + self.line_ending.as_bytes().len() + 4 * 4 + DOCUMENT_RESERVED_LEN
    }

    /// Offset of `total_size` from the start of the header.
    pub fn size_field_offset(&self) -> usize {
        DOCUMENT_MAGIC.len() + self.line_ending.as_bytes().len() + 4 * 3
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&DOCUMENT_MAGIC);
        out.extend_from_slice(self.line_ending.as_bytes());
        out.extend_from_slice(&self.min_version.to_u32().to_be_bytes());
        out.extend_from_slice(&self.version.to_u32().to_be_bytes());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.extend_from_slice(&self.total_size.to_be_bytes());
        out.extend_from_slice(&[0u8; DOCUMENT_RESERVED_LEN]);
        out
    }

    /// Parse and validate a header from the front of `r`.
    ///
    /// # Errors
    /// - `NotADocument` on a wrong magic or terminator (or a stream too short for either).
    /// - `TooNew` when the document needs a newer reader.
    /// - `Truncated` when the stream ends inside the remaining fields.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let mut magic = [0u8; DOCUMENT_MAGIC.len()];
        r.read_exact(&mut magic).map_err(not_a_document)?;
        if magic != DOCUMENT_MAGIC {
            return Err(PipelineError::NotADocument(format!("bad magic {}", fmt_bytes(&magic))));
        }

        let line_ending = match r.read_u8().map_err(not_a_document)? {
            b'\n' => LineEnding::Lf,
            b'\r' => match r.read_u8().map_err(not_a_document)? {
                b'\n' => LineEnding::CrLf,
                other => {
                    return Err(PipelineError::NotADocument(format!("bad terminator \\r 0x{other:02x}")));
                }
            },
            other => return Err(PipelineError::NotADocument(format!("bad terminator 0x{other:02x}"))),
        };

        let min_version = VersionTriple::from_u32(r.read_u32::<BigEndian>().map_err(truncated)?);
        if min_version > VersionTriple::CURRENT {
            return Err(PipelineError::TooNew { required: min_version, supported: VersionTriple::CURRENT });
        }
        let version = VersionTriple::from_u32(r.read_u32::<BigEndian>().map_err(truncated)?);
        let flags = r.read_u32::<BigEndian>().map_err(truncated)?;
        let total_size = r.read_u32::<BigEndian>().map_err(truncated)?;
        let mut reserved = [0u8; DOCUMENT_RESERVED_LEN];
        r.read_exact(&mut reserved).map_err(truncated)?;

        Ok(Self { line_ending, min_version, version, flags, total_size })
    }
}

fn not_a_document(e: io::Error) -> PipelineError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => PipelineError::NotADocument("stream too short for a header".into()),
        _ => PipelineError::Io(e),
    }
}

fn truncated(e: io::Error) -> PipelineError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => PipelineError::Truncated { stage: Stage::Terminal },
        _ => PipelineError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_packs_with_leading_zero() {
        let v = VersionTriple::new(2, 3, 1);
        assert_eq!(v.to_u32().to_be_bytes(), [0, 2, 3, 1]);
        assert_eq!(VersionTriple::from_u32(v.to_u32()), v);
        assert_eq!(v.to_string(), "2.3.1");
    }

    #[test]
    fn crlf_header_parses_back() {
        let mut h = DocumentHeader::new(LineEnding::CrLf, 0x5);
        h.total_size = 77;
        let bytes = h.encode();
        assert_eq!(bytes.len(), h.encoded_len());
        assert_eq!(&bytes[7..9], b"\r\n");
        let back = DocumentHeader::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn lone_carriage_return_is_rejected() {
        let mut bytes = DocumentHeader::new(LineEnding::CrLf, 0).encode();
        bytes[8] = b'x';
        let err = DocumentHeader::read_from(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, PipelineError::NotADocument(_)));
    }
}
