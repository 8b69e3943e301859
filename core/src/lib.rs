//! streamglue-core
//!
//! Push-based document pipeline: stream-glue framing over compression,
//! encryption and signing stages, with a terminal stage for disk I/O.
//! Single-threaded and synchronous.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod config;
pub mod report;

// Stages
pub mod headers;
pub mod compression;
pub mod crypto;
pub mod signature;
pub mod terminal;
pub mod telemetry;

// Dispatch and entry points
pub mod pipeline;
pub mod api;

pub use api::{open, open_from_memory, open_runtime, save, save_runtime, save_to_memory, Document, PipelineContext};
pub use types::{ErrorCode, PipelineError, ReportCategory, Result};

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::api::{open, open_from_memory, open_runtime, save, save_runtime, save_to_memory, Document, PipelineContext};
    pub use crate::compression::Dictionary;
    pub use crate::config::PipelineConfig;
    pub use crate::crypto::KeyStore;
    pub use crate::headers::SignerInfo;
    pub use crate::pipeline::{ActionList, PipelineAction};
    pub use crate::report::{report_error, Reporter};
    pub use crate::terminal::LineEnding;
    pub use crate::types::{PipelineError, ReportCategory};
}
