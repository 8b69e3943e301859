//! pipeline/mod.rs
//! Stream-glue dispatchers for both directions.
//!
//! - `read`: push-driven parser that picks a stage per glue frame and nests.
//! - `write`: chain of buffering levels built from an `ActionList`.

pub mod action;
pub mod read;
pub mod stage;
pub mod write;

pub use action::{ActionList, PipelineAction};
pub use read::{ReadContext, ReadDispatcher, ReadState};
pub use stage::ActiveStage;
pub use write::{WriteDispatcher, WriteEnv, WriteState};
