//! telemetry/mod.rs
//! Per-call counters and the snapshot returned to the host.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
