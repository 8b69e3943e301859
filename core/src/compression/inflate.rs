//! compression/inflate.rs
//! Push-driven decompression.
//!
//! The reader hands over arbitrarily sized chunks. The first `CompressFrame::LEN`
//! bytes are accumulated into a header; everything after is fed to the zlib
//! inflater and drained through a fixed scratch buffer into `sink`.

use flate2::{Decompress, FlushDecompress, Status};
use tracing::{debug, trace};

use crate::compression::Dictionary;
use crate::constants::INFLATE_SCRATCH_LEN;
use crate::headers::{CompressFrame, FrameHeader};
use crate::types::{PipelineError, Result, Stage};
use crate::utils::fill_from;

/// Incremental reader for one compress frame.
pub struct Inflater {
    dictionary: Dictionary,
    header_buf: Vec<u8>,
    frame: Option<CompressFrame>,
    z: Decompress,
    scratch: Vec<u8>,
    consumed_body: u64,
    produced: u64,
    stream_end: bool,
    output_pending: bool,
}

impl Inflater {
    pub fn new(dictionary: &Dictionary) -> Self {
        Self {
            dictionary: dictionary.clone(),
            header_buf: Vec::with_capacity(CompressFrame::LEN),
            frame: None,
            z: Decompress::new(true),
            scratch: vec![0u8; INFLATE_SCRATCH_LEN],
            consumed_body: 0,
            produced: 0,
            stream_end: false,
            output_pending: false,
        }
    }

    /// Parsed header, once enough bytes have arrived.
    pub fn frame(&self) -> Option<&CompressFrame> {
        self.frame.as_ref()
    }

    /// Feed one chunk. Decompressed bytes are handed to `sink` as soon as the
    /// inflater yields them. Returns the number of input bytes taken, which is
    /// always `chunk.len()` on success.
    pub fn decompress_push(
        &mut self,
        chunk: &[u8],
        sink: &mut dyn FnMut(&[u8]) -> Result<()>,
    ) -> Result<usize> {
        let mut input = chunk;

        if self.frame.is_none() {
            let took = fill_from(&mut self.header_buf, CompressFrame::LEN, input);
            input = &input[took..];
            if self.header_buf.len() < CompressFrame::LEN {
                return Ok(chunk.len());
            }
            let frame = CompressFrame::decode(&self.header_buf)
                .map_err(|e| PipelineError::from_header(Stage::Compression, e))?;
            if frame.dictionary_id != self.dictionary.id()
                || frame.dictionary_checksum != self.dictionary.checksum()
            {
                return Err(PipelineError::DictionaryMismatch {
                    stream: frame.dictionary_checksum,
                    local: self.dictionary.checksum(),
                });
            }
            debug!(
                compressed = frame.compressed_length,
                uncompressed = frame.uncompressed_length,
                "compress frame header accepted"
            );
            self.frame = Some(frame);
        }

        let Some(frame) = self.frame else {
            return Err(PipelineError::Internal("inflater lost its header".into()));
        };

        let remaining = u64::from(frame.compressed_length) - self.consumed_body;
        if input.len() as u64 > remaining {
            return Err(PipelineError::LengthMismatch {
                stage: Stage::Compression,
                expected: u64::from(frame.compressed_length),
                actual: self.consumed_body + input.len() as u64,
            });
        }

        self.inflate(input, u64::from(frame.uncompressed_length), sink)?;
        Ok(chunk.len())
    }

    fn inflate(
        &mut self,
        mut input: &[u8],
        expected_out: u64,
        sink: &mut dyn FnMut(&[u8]) -> Result<()>,
    ) -> Result<()> {
        loop {
            if self.stream_end {
                if !input.is_empty() {
                    return Err(PipelineError::Codec(format!(
                        "{} bytes after end of deflate stream",
                        input.len()
                    )));
                }
                return Ok(());
            }
            if input.is_empty() && !self.output_pending {
                return Ok(());
            }

            let before_in = self.z.total_in();
            let before_out = self.z.total_out();
            let result = self.z.decompress(input, &mut self.scratch, FlushDecompress::None);
            let used = (self.z.total_in() - before_in) as usize;
            let made = (self.z.total_out() - before_out) as usize;

            input = &input[used..];
            self.consumed_body += used as u64;
            if made > 0 {
                self.produced += made as u64;
                if self.produced > expected_out {
                    return Err(PipelineError::LengthMismatch {
                        stage: Stage::Compression,
                        expected: expected_out,
                        actual: self.produced,
                    });
                }
                sink(&self.scratch[..made])?;
            }
            self.output_pending = made == self.scratch.len();

            let mut progressed = used > 0 || made > 0;
            match result {
                Ok(Status::StreamEnd) => {
                    trace!(produced = self.produced, "deflate stream end");
                    self.stream_end = true;
                }
                Ok(Status::Ok) | Ok(Status::BufError) => {}
                Err(e) => match e.needs_dictionary() {
                    Some(adler) => {
                        self.z.set_dictionary(self.dictionary.bytes()).map_err(|_| {
                            PipelineError::DictionaryMismatch {
                                stream: adler,
                                local: self.dictionary.checksum(),
                            }
                        })?;
                        progressed = true;
                    }
                    None => return Err(PipelineError::Codec(e.to_string())),
                },
            }

            if !progressed && !self.stream_end {
                // Inflater wants more input than this chunk carried.
                return Ok(());
            }
        }
    }

    /// Close the frame: every declared byte must have been consumed and
    /// produced, and the deflate stream must have terminated.
    pub fn decompress_end(self) -> Result<CompressFrame> {
        let frame = self.frame.ok_or(PipelineError::Truncated { stage: Stage::Compression })?;
        if self.consumed_body != u64::from(frame.compressed_length) {
            return Err(PipelineError::LengthMismatch {
                stage: Stage::Compression,
                expected: u64::from(frame.compressed_length),
                actual: self.consumed_body,
            });
        }
        if !self.stream_end {
            return Err(PipelineError::Codec("deflate stream did not terminate".into()));
        }
        if self.produced != u64::from(frame.uncompressed_length) {
            return Err(PipelineError::LengthMismatch {
                stage: Stage::Compression,
                expected: u64::from(frame.uncompressed_length),
                actual: self.produced,
            });
        }
        Ok(frame)
    }
}

impl std::fmt::Debug for Inflater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inflater")
            .field("frame", &self.frame)
            .field("consumed_body", &self.consumed_body)
            .field("produced", &self.produced)
            .field("stream_end", &self.stream_end)
            .finish()
    }
}

/// Inflate a complete frame (header + body) in one call.
pub fn decompress(frame_bytes: &[u8], dictionary: &Dictionary) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut inflater = Inflater::new(dictionary);
    inflater.decompress_push(frame_bytes, &mut |b: &[u8]| {
        out.extend_from_slice(b);
        Ok(())
    })?;
    inflater.decompress_end()?;
    Ok(out)
}
