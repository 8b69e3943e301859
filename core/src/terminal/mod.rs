//! terminal/mod.rs
//! Terminal I/O stage: the only stage that touches files.
//!
//! Write: header with a placeholder size, dispatcher output, back-patch.
//! Read: header checks, then the declared body size through a read cache.

pub mod header;
pub mod read;
pub mod runtime;
pub mod write;

pub use header::{DocumentHeader, LineEnding, VersionTriple};
pub use read::read_document;
pub use runtime::{locate_document, write_runtime};
pub use write::write_document;
