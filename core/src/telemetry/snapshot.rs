//! telemetry/snapshot.rs
//! Immutable summary handed back with every opened document.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::StageCounters;
use crate::telemetry::timers::TelemetryTimer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub counters: StageCounters,
    /// `bytes_compressed / bytes_document`, 0 when nothing was compressed.
    pub compression_ratio: f64,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
}

impl TelemetrySnapshot {
    pub fn from(counters: &StageCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();
        let compression_ratio = if counters.bytes_document > 0 && counters.frames_compress > 0 {
            counters.bytes_compressed as f64 / counters.bytes_document as f64
        } else {
            0.0
        };
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_document as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        Self {
            counters: counters.clone(),
            compression_ratio,
            throughput_bytes_per_sec: throughput,
            elapsed,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
