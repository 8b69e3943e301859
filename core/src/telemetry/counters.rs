//! telemetry/counters.rs
//! Mutable counters filled while a read dispatcher runs.
//!
//! Each read owns one `StageCounters`; nested dispatchers record into the
//! same instance through the context.

use serde::{Deserialize, Serialize};

use crate::headers::StageType;

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounters {
    pub frames_glue: u64,
    pub frames_document: u64,
    pub frames_compress: u64,
    pub frames_crypto: u64,
    pub frames_sign: u64,
    pub frames_loopback: u64,
    /// Document bytes produced (read) or accepted (write).
    pub bytes_document: u64,
    /// Deflate stream bytes, excluding the compress header.
    pub bytes_compressed: u64,
    /// Ciphertext bytes, excluding the crypto header.
    pub bytes_ciphertext: u64,
    /// Glue headers, stage headers and signer records.
    pub bytes_overhead: u64,
}

impl StageCounters {
    /// Record one recognised glue frame and its header bytes.
    pub fn add_frame(&mut self, stage: StageType, header_len: usize) {
        self.frames_glue += 1;
        self.bytes_overhead += header_len as u64;
        match stage {
            StageType::Document => self.frames_document += 1,
            StageType::Compress => self.frames_compress += 1,
            StageType::Crypto => self.frames_crypto += 1,
            StageType::Sign => self.frames_sign += 1,
            StageType::LoopBack => self.frames_loopback += 1,
        }
    }

    pub fn add_overhead(&mut self, len: usize) {
        self.bytes_overhead += len as u64;
    }

    pub fn add_document(&mut self, len: usize) {
        self.bytes_document += len as u64;
    }

    pub fn add_compressed(&mut self, len: u64) {
        self.bytes_compressed += len;
    }

    pub fn add_ciphertext(&mut self, len: u64) {
        self.bytes_ciphertext += len;
    }

    /// Total stage frames, glue frames excluded.
    pub fn stage_frames(&self) -> u64 {
        self.frames_document + self.frames_compress + self.frames_crypto + self.frames_sign + self.frames_loopback
    }
}
