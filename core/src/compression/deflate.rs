//! Deflate (zlib wrapper) via flate2, preset with the shared dictionary.
//!
//! The write side always has the whole payload in hand, so compression is
//! one-shot: the frame needs both lengths before anything is emitted.

use flate2::{Compress, Compression, FlushCompress, Status};
use tracing::debug;

use crate::compression::Dictionary;
use crate::headers::{CompressFrame, FrameHeader};
use crate::types::{PipelineError, Result};

/// Output of the compression stage on write.
#[derive(Debug, Clone)]
pub struct CompressedFrame {
    pub header: CompressFrame,
    pub body: Vec<u8>,
}

impl CompressedFrame {
    /// Header bytes followed by the zlib stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CompressFrame::LEN + self.body.len());
        out.extend_from_slice(&self.header.encode());
        out.extend_from_slice(&self.body);
        out
    }
}

/// Compress `payload` into a zlib stream preset with `dictionary`.
pub fn compress(payload: &[u8], dictionary: &Dictionary, level: u32) -> Result<CompressedFrame> {
    let uncompressed_length = u32::try_from(payload.len())
        .map_err(|_| PipelineError::Internal("payload exceeds the 4 GiB frame limit".into()))?;

    let mut z = Compress::new(Compression::new(level.min(9)), true);
    z.set_dictionary(dictionary.bytes())
        .map_err(|e| PipelineError::Codec(format!("preset dictionary rejected: {e}")))?;

    let mut body = Vec::with_capacity(payload.len() / 2 + 64);
    let mut input = payload;
    loop {
        if body.capacity() - body.len() < 1024 {
            body.reserve(64 * 1024);
        }
        let before_in = z.total_in();
        let before_out = z.total_out();
        let status = z
            .compress_vec(input, &mut body, FlushCompress::Finish)
            .map_err(|e| PipelineError::Codec(e.to_string()))?;
        let consumed = (z.total_in() - before_in) as usize;
        input = &input[consumed..];

        match status {
            Status::StreamEnd => break,
            Status::Ok => {}
            Status::BufError => {
                if consumed == 0 && z.total_out() == before_out {
                    return Err(PipelineError::Codec("compressor made no progress".into()));
                }
            }
        }
    }

    let compressed_length = u32::try_from(body.len())
        .map_err(|_| PipelineError::Internal("compressed stream exceeds the 4 GiB frame limit".into()))?;
    debug!(uncompressed_length, compressed_length, dictionary_id = dictionary.id(), "deflate frame built");

    Ok(CompressedFrame {
        header: CompressFrame::new(compressed_length, uncompressed_length, dictionary.id(), dictionary.checksum()),
        body,
    })
}
