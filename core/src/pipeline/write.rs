//! pipeline/write.rs
//! Write-side dispatcher chain.
//!
//! Each level buffers what it is given. On `finish` it encodes its own stage
//! frame, prefixes a glue header and pushes the result into the next level;
//! the last level hands it to the terminal sink. The first level is always
//! the document stage, followed by one level per action in list order.

use tracing::debug;

use crate::compression::{compress, Dictionary};
use crate::crypto::{seal, KeyStore};
use crate::headers::{FrameHeader, StageType, StreamGlueFrame};
use crate::pipeline::action::ActionList;
use crate::signature::sign;
use crate::types::{PipelineError, Result, Stage};

/// Inputs every level needs while finalising.
#[derive(Debug)]
pub struct WriteEnv<'a> {
    pub keys: Option<&'a KeyStore>,
    pub dictionary: &'a Dictionary,
    pub compression_level: u32,
}

impl<'a> WriteEnv<'a> {
    pub fn new(keys: Option<&'a KeyStore>, dictionary: &'a Dictionary, compression_level: u32) -> Self {
        Self { keys, dictionary, compression_level }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriteState {
    Buffering,
    Finalizing,
    Done,
}

#[derive(Debug)]
pub struct WriteDispatcher {
    stage: StageType,
    state: WriteState,
    buffer: Vec<u8>,
    next: Option<Box<WriteDispatcher>>,
}

impl WriteDispatcher {
    /// Build the chain for `actions`, consuming the list front to back.
    pub fn from_actions(mut actions: ActionList) -> Self {
        let mut stages = Vec::with_capacity(actions.len());
        while let Some(action) = actions.pop_front() {
            stages.push(action.stage_type());
        }
        let mut next = None;
        for stage in stages.into_iter().rev() {
            next = Some(Box::new(Self::level(stage, next)));
        }
        Self::level(StageType::Document, next)
    }

    fn level(stage: StageType, next: Option<Box<WriteDispatcher>>) -> Self {
        Self { stage, state: WriteState::Buffering, buffer: Vec::new(), next }
    }

    pub fn stage(&self) -> StageType {
        self.stage
    }

    pub fn state(&self) -> WriteState {
        self.state
    }

    /// Number of levels from here to the sink.
    pub fn depth(&self) -> usize {
        1 + self.next.as_ref().map_or(0, |n| n.depth())
    }

    pub fn push(&mut self, data: &[u8]) -> Result<()> {
        if self.state != WriteState::Buffering {
            return Err(PipelineError::Internal(format!("{:?} level already finalised", self.stage)));
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Finalise this level and every level after it.
    pub fn finish(&mut self, env: &mut WriteEnv<'_>, sink: &mut dyn FnMut(&[u8]) -> Result<()>) -> Result<()> {
        if self.state != WriteState::Buffering {
            return Err(PipelineError::Internal(format!("{:?} level finished twice", self.stage)));
        }
        self.state = WriteState::Finalizing;
        let payload = std::mem::take(&mut self.buffer);

        let body = match self.stage {
            StageType::Document | StageType::LoopBack => payload,
            StageType::Compress => compress(&payload, env.dictionary, env.compression_level)?.to_bytes(),
            StageType::Crypto => {
                let keys = env.keys.ok_or(PipelineError::MissingKeyStore { stage: Stage::Crypto })?;
                seal(&payload, keys)?.to_bytes()
            }
            StageType::Sign => {
                let keys = env.keys.ok_or(PipelineError::MissingKeyStore { stage: Stage::Signature })?;
                sign(&payload, keys)?.to_bytes()
            }
        };

        let total_length = u32::try_from(body.len())
            .map_err(|_| PipelineError::Internal("stage frame exceeds the 4 GiB glue limit".into()))?;
        let glue = StreamGlueFrame::new(self.stage, total_length).encode();
        debug!(stage = ?self.stage, total_length, "stage frame emitted");

        match self.next.as_mut() {
            Some(next) => {
                next.push(&glue)?;
                next.push(&body)?;
                next.finish(env, sink)?;
            }
            None => {
                sink(&glue)?;
                sink(&body)?;
            }
        }
        self.state = WriteState::Done;
        Ok(())
    }
}
