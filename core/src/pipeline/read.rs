//! pipeline/read.rs
//! Read-side dispatcher.
//!
//! State machine per nesting level:
//! `AwaitingHeader → StageActive → Done`, with `Failed` reachable from any
//! state. The glue header's `total_length` is tracked here, independently of
//! whatever lengths the stage header claims, and decides when the stage is
//! finalised. On failure the active stage, and every dispatcher it owns, is
//! dropped at once.

use tracing::{debug, trace, warn};

use crate::compression::Dictionary;
use crate::constants::MAX_NESTING_DEPTH;
use crate::crypto::KeyStore;
use crate::headers::{FrameHeader, SignerInfo, StageType, StreamGlueFrame};
use crate::pipeline::stage::ActiveStage;
use crate::telemetry::StageCounters;
use crate::types::{PipelineError, Result, Stage};
use crate::utils::{enum_name_or_hex, fill_from};

/// State shared by every level of one read.
#[derive(Debug)]
pub struct ReadContext<'a> {
    pub keys: Option<&'a KeyStore>,
    pub dictionary: &'a Dictionary,
    /// Innermost document bytes, appended as the document stage sees them.
    pub document: Vec<u8>,
    /// Signer of the most recently verified sign frame.
    pub signer: Option<SignerInfo>,
    pub counters: StageCounters,
}

impl<'a> ReadContext<'a> {
    pub fn new(keys: Option<&'a KeyStore>, dictionary: &'a Dictionary) -> Self {
        Self { keys, dictionary, document: Vec::new(), signer: None, counters: StageCounters::default() }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadState {
    AwaitingHeader,
    StageActive,
    Done,
    Failed,
}

#[derive(Debug)]
pub struct ReadDispatcher {
    state: ReadState,
    header_buf: Vec<u8>,
    glue: Option<StreamGlueFrame>,
    stage: Option<ActiveStage>,
    remaining: u64,
    consumed: u64,
    depth: usize,
}

impl ReadDispatcher {
    /// Outermost dispatcher.
    pub fn new() -> Self {
        Self::at_depth(0)
    }

    fn at_depth(depth: usize) -> Self {
        Self {
            state: ReadState::AwaitingHeader,
            header_buf: Vec::with_capacity(StreamGlueFrame::LEN),
            glue: None,
            stage: None,
            remaining: 0,
            consumed: 0,
            depth,
        }
    }

    /// Dispatcher one level below `self`, owned by a stage.
    pub(crate) fn nested(&self) -> Result<Box<Self>> {
        let depth = self.depth + 1;
        if depth > MAX_NESTING_DEPTH {
            return Err(PipelineError::NestingTooDeep { max: MAX_NESTING_DEPTH });
        }
        Ok(Box::new(Self::at_depth(depth)))
    }

    pub fn state(&self) -> ReadState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ReadState::Done
    }

    /// Bytes taken from the caller so far, glue header included.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Glue header of the frame at this level, once parsed.
    pub fn glue(&self) -> Option<&StreamGlueFrame> {
        self.glue.as_ref()
    }

    /// Feed bytes. Returns how many were taken; fewer than `data.len()` only
    /// when this level's frame ended inside `data`.
    pub fn push(&mut self, data: &[u8], cx: &mut ReadContext<'_>) -> Result<usize> {
        if self.state == ReadState::Failed {
            return Err(PipelineError::Internal("push into a failed dispatcher".into()));
        }
        match self.push_inner(data, cx) {
            Ok(n) => Ok(n),
            Err(e) => {
                warn!(depth = self.depth, consumed = self.consumed, error = %e, "dispatcher failed");
                self.state = ReadState::Failed;
                self.stage = None;
                Err(e)
            }
        }
    }

    fn push_inner(&mut self, data: &[u8], cx: &mut ReadContext<'_>) -> Result<usize> {
        let mut off = 0usize;
        while off < data.len() {
            match self.state {
                ReadState::Done | ReadState::Failed => break,
                ReadState::AwaitingHeader => {
                    let took = fill_from(&mut self.header_buf, StreamGlueFrame::LEN, &data[off..]);
                    off += took;
                    self.consumed += took as u64;
                    if self.header_buf.len() == StreamGlueFrame::LEN {
                        self.begin_stage(cx)?;
                    }
                }
                ReadState::StageActive => {
                    let take = (self.remaining.min((data.len() - off) as u64)) as usize;
                    let chunk = &data[off..off + take];
                    let stage = self
                        .stage
                        .as_mut()
                        .ok_or_else(|| PipelineError::Internal("active state without a stage".into()))?;
                    stage.push(chunk, cx)?;
                    trace!(depth = self.depth, bytes = take, "stage chunk");
                    off += take;
                    self.consumed += take as u64;
                    self.remaining -= take as u64;
                    if self.remaining == 0 {
                        self.end_stage(cx)?;
                    }
                }
            }
        }
        Ok(off)
    }

    fn begin_stage(&mut self, cx: &mut ReadContext<'_>) -> Result<()> {
        let glue = StreamGlueFrame::decode(&self.header_buf)
            .map_err(|e| PipelineError::from_header(Stage::Dispatcher, e))?;
        trace!(depth = self.depth, stage = %enum_name_or_hex::<StageType>(glue.stage_type), "glue header decoded");
        let Some(stage_type) = glue.stage() else {
            return Err(PipelineError::UnknownStageType { raw: glue.stage_type });
        };
        debug!(depth = self.depth, stage = ?stage_type, total_length = glue.total_length, "glue frame");
        cx.counters.add_frame(stage_type, StreamGlueFrame::LEN);

        self.stage = Some(ActiveStage::begin(stage_type, self, cx)?);
        self.remaining = u64::from(glue.total_length);
        self.glue = Some(glue);
        self.state = ReadState::StageActive;
        if self.remaining == 0 {
            self.end_stage(cx)?;
        }
        Ok(())
    }

    fn end_stage(&mut self, cx: &mut ReadContext<'_>) -> Result<()> {
        let stage = self
            .stage
            .take()
            .ok_or_else(|| PipelineError::Internal("stage finished twice".into()))?;
        stage.finish(cx)?;
        self.state = ReadState::Done;
        debug!(depth = self.depth, consumed = self.consumed, "frame complete");
        Ok(())
    }

    /// End of input. Anything short of `Done` means the stream was cut.
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            ReadState::Done => Ok(()),
            ReadState::Failed => Err(PipelineError::Internal("finish on a failed dispatcher".into())),
            ReadState::AwaitingHeader | ReadState::StageActive => {
                self.state = ReadState::Failed;
                self.stage = None;
                Err(PipelineError::Truncated { stage: Stage::Dispatcher })
            }
        }
    }
}

impl Default for ReadDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Push all of `data` into a nested dispatcher. Bytes past the end of its
/// frame mean the outer stage carried trailing garbage.
pub(crate) fn forward(inner: &mut ReadDispatcher, data: &[u8], cx: &mut ReadContext<'_>) -> Result<()> {
    let taken = inner.push(data, cx)?;
    if taken < data.len() {
        return Err(PipelineError::LengthMismatch {
            stage: Stage::Dispatcher,
            expected: inner.consumed(),
            actual: inner.consumed() + (data.len() - taken) as u64,
        });
    }
    Ok(())
}
