//! config.rs
//! Per-context pipeline settings, loadable from JSON.

use serde::{Deserialize, Serialize};

use crate::constants::{flags, DEFAULT_COMPRESSION_LEVEL, DEFAULT_READ_CACHE_SIZE, MAX_READ_CACHE_SIZE, MIN_READ_CACHE_SIZE};
use crate::terminal::LineEnding;
use crate::types::{PipelineError, Result};

/// Bits the writer derives from the action list; callers may not set them.
const STAGE_FLAG_MASK: u32 = flags::HAS_COMPRESSION | flags::HAS_CRYPTO | flags::HAS_SIGNATURE;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Bytes read from disk per dispatcher push.
    pub read_cache_size: usize,
    /// zlib level, 0..=9.
    pub compression_level: u32,
    pub line_ending: LineEnding,
    /// Extra document header flags, OR-ed with the stage flags.
    pub flags: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            read_cache_size: DEFAULT_READ_CACHE_SIZE,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            line_ending: LineEnding::Lf,
            flags: 0,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_READ_CACHE_SIZE..=MAX_READ_CACHE_SIZE).contains(&self.read_cache_size) {
            return Err(PipelineError::Config(format!(
                "read_cache_size {} outside {MIN_READ_CACHE_SIZE}..={MAX_READ_CACHE_SIZE}",
                self.read_cache_size
            )));
        }
        if self.compression_level > 9 {
            return Err(PipelineError::Config(format!(
                "compression_level {} outside 0..=9",
                self.compression_level
            )));
        }
        if self.flags & STAGE_FLAG_MASK != 0 {
            return Err(PipelineError::Config(format!(
                "flags 0x{:08x} overlap stage bits 0x{STAGE_FLAG_MASK:08x}",
                self.flags
            )));
        }
        Ok(())
    }

    /// Parse and validate. Missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| PipelineError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PipelineError::Internal(e.to_string()))
    }
}
