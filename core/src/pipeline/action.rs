//! pipeline/action.rs
//! Ordered write actions, bounded to `MAX_ACTIONS`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::{flags, MAX_ACTIONS};
use crate::headers::StageType;
use crate::types::{PipelineError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineAction {
    Compress,
    Encrypt,
    Sign,
    LoopBack,
}

impl PipelineAction {
    pub fn stage_type(self) -> StageType {
        match self {
            PipelineAction::Compress => StageType::Compress,
            PipelineAction::Encrypt => StageType::Crypto,
            PipelineAction::Sign => StageType::Sign,
            PipelineAction::LoopBack => StageType::LoopBack,
        }
    }

    /// Document header flag announcing this action, if any.
    pub fn flag(self) -> u32 {
        match self {
            PipelineAction::Compress => flags::HAS_COMPRESSION,
            PipelineAction::Encrypt => flags::HAS_CRYPTO,
            PipelineAction::Sign => flags::HAS_SIGNATURE,
            PipelineAction::LoopBack => 0,
        }
    }
}

/// Actions applied to the document in order: the first action wraps the
/// document frame, each later one wraps the result of the previous.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PipelineAction>", into = "Vec<PipelineAction>")]
pub struct ActionList {
    actions: VecDeque<PipelineAction>,
}

impl ActionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slice(actions: &[PipelineAction]) -> Result<Self> {
        let mut list = Self::new();
        for &a in actions {
            list.push(a)?;
        }
        Ok(list)
    }

    pub fn push(&mut self, action: PipelineAction) -> Result<()> {
        if self.actions.len() >= MAX_ACTIONS {
            return Err(PipelineError::ActionListFull { max: MAX_ACTIONS });
        }
        self.actions.push_back(action);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<PipelineAction> {
        self.actions.pop_front()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PipelineAction> + '_ {
        self.actions.iter().copied()
    }

    /// OR of every action's document flag.
    pub fn flags(&self) -> u32 {
        self.iter().fold(0, |acc, a| acc | a.flag())
    }
}

impl TryFrom<Vec<PipelineAction>> for ActionList {
    type Error = PipelineError;

    fn try_from(v: Vec<PipelineAction>) -> Result<Self> {
        Self::from_slice(&v)
    }
}

impl From<ActionList> for Vec<PipelineAction> {
    fn from(list: ActionList) -> Self {
        list.actions.into_iter().collect()
    }
}
