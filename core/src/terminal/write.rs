//! terminal/write.rs
//! Document writer: header, dispatcher output, size back-patch.

use std::io::{self, Seek, SeekFrom, Write};

use byteorder::{BigEndian, WriteBytesExt};
use tracing::debug;

use crate::pipeline::{ActionList, WriteDispatcher, WriteEnv};
use crate::terminal::header::{DocumentHeader, LineEnding};
use crate::types::{PipelineError, Result};

/// Writes through to `inner` and counts what landed.
struct CountingSink<'w, W: Write> {
    inner: &'w mut W,
    written: u64,
}

impl<'w, W: Write> CountingSink<'w, W> {
    fn put(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write_all(buf).map_err(|e| short_write(e, self.written, buf.len()))?;
        self.written += buf.len() as u64;
        Ok(())
    }
}

fn short_write(e: io::Error, written: u64, len: usize) -> PipelineError {
    match e.kind() {
        io::ErrorKind::WriteZero => PipelineError::ShortWrite { written, expected: written + len as u64 },
        _ => PipelineError::Io(e),
    }
}

/// Write one document at the current position of `out`.
///
/// Returns the number of bytes written (header included). On return the
/// cursor sits at the end of the stream.
pub fn write_document<W: Write + Seek>(
    out: &mut W,
    payload: &[u8],
    actions: &ActionList,
    env: &mut WriteEnv<'_>,
    line_ending: LineEnding,
    extra_flags: u32,
) -> Result<u64> {
    let mut header = DocumentHeader::new(line_ending, actions.flags() | extra_flags);
    let start = out.stream_position()?;

    let mut sink = CountingSink { inner: &mut *out, written: 0 };
    sink.put(&header.encode())?;
    let header_len = sink.written;

    let mut dispatcher = WriteDispatcher::from_actions(actions.clone());
    dispatcher.push(payload)?;
    dispatcher.finish(env, &mut |b: &[u8]| sink.put(b))?;

    let body_len = sink.written - header_len;
    header.total_size = u32::try_from(body_len)
        .map_err(|_| PipelineError::Internal(format!("document body of {body_len} bytes exceeds the size field")))?;

    out.seek(SeekFrom::Start(start + header.size_field_offset() as u64))?;
    out.write_u32::<BigEndian>(header.total_size)
        .map_err(|e| short_write(e, 0, 4))?;
    out.seek(SeekFrom::End(0))?;
    out.flush()?;

    debug!(total_size = header.total_size, flags = header.flags, levels = actions.len() + 1, "document written");
    Ok(header_len + body_len)
}
