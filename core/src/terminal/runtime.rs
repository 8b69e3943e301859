//! terminal/runtime.rs
//! Runtime bundles: an executable with a document appended, located through
//! a 12-byte trailer `[start_offset u32 BE]["GLUERUNT"]` at the very end.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use tracing::{debug, warn};

use crate::constants::{RUNTIME_MARKER, RUNTIME_TRAILER_LEN};
use crate::pipeline::{ActionList, WriteEnv};
use crate::terminal::header::LineEnding;
use crate::terminal::write::write_document;
use crate::types::{PipelineError, Result};
use crate::utils::fmt_bytes;

/// Check the trailer and seek `input` to the embedded document.
/// Returns the document's start offset.
pub fn locate_document<R: Read + Seek>(input: &mut R) -> Result<u64> {
    let len = input.seek(SeekFrom::End(0))?;
    if len < RUNTIME_TRAILER_LEN as u64 {
        return Err(PipelineError::NotADocument("file too short for a runtime trailer".into()));
    }

    input.seek(SeekFrom::End(-(RUNTIME_TRAILER_LEN as i64)))?;
    let mut trailer = [0u8; RUNTIME_TRAILER_LEN];
    input.read_exact(&mut trailer)?;

    let marker = &trailer[4..];
    if marker != RUNTIME_MARKER {
        warn!(marker = %fmt_bytes(marker), "runtime trailer marker mismatch");
        return Err(PipelineError::NotADocument(format!("bad runtime marker {}", fmt_bytes(marker))));
    }

    let offset = u64::from(BigEndian::read_u32(&trailer[..4]));
    if offset >= len - RUNTIME_TRAILER_LEN as u64 {
        return Err(PipelineError::NotADocument(format!("runtime offset {offset} past end of bundle")));
    }
    input.seek(SeekFrom::Start(offset))?;
    debug!(offset, bundle_len = len, "runtime document located");
    Ok(offset)
}

/// Write `executable`, then the document, then the trailer.
/// Returns the total bundle length.
pub fn write_runtime<W: Write + Seek>(
    out: &mut W,
    executable: &[u8],
    payload: &[u8],
    actions: &ActionList,
    env: &mut WriteEnv<'_>,
    line_ending: LineEnding,
    extra_flags: u32,
) -> Result<u64> {
    out.write_all(executable)?;
    let offset = out.stream_position()?;
    let start = u32::try_from(offset)
        .map_err(|_| PipelineError::Internal("executable too large for a runtime offset".into()))?;

    let doc_len = write_document(out, payload, actions, env, line_ending, extra_flags)?;
    out.write_u32::<BigEndian>(start)?;
    out.write_all(&RUNTIME_MARKER)?;
    out.flush()?;

    Ok(offset + doc_len + RUNTIME_TRAILER_LEN as u64)
}
