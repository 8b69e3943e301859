//! types.rs
//! Unified pipeline error, bit-packed error code and user-facing categories.
//!
//! Every failure is fatal to the whole read/write. The host never sees the raw
//! code; it maps `PipelineError::category()` to one fixed message.

use std::io;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::headers::HeaderError;
use crate::terminal::VersionTriple;

/// Stage that raised an error (upper byte group of [`ErrorCode`]).
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
pub enum Stage {
    Header      = 0x01,
    Dispatcher  = 0x02,
    Compression = 0x03,
    Crypto      = 0x04,
    Signature   = 0x05,
    Terminal    = 0x06,
}

/// Generic failure kinds shared by all stages.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
pub enum GenericKind {
    None               = 0x00,
    OutOfMemory        = 0x01,
    Internal           = 0x02,
    BadMagic           = 0x03,
    BadHeaderChecksum  = 0x04,
    BadPayloadChecksum = 0x05,
    LengthMismatch     = 0x06,
    NotImplemented     = 0x07,
}

/// Stage-specific nuance (lower byte of [`ErrorCode`]).
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
pub enum SpecificKind {
    None               = 0x00,
    UntrustedKey       = 0x01,
    KeyWrap            = 0x02,
    KeyUnwrap          = 0x03,
    SignatureInvalid   = 0x04,
    Codec              = 0x05,
    DictionaryMismatch = 0x06,
    BadFileDescriptor  = 0x07,
    ShortWrite         = 0x08,
    TooNew             = 0x09,
    NotADocument       = 0x0A,
    UnknownStage       = 0x0B,
    Truncated          = 0x0C,
    ActionListFull     = 0x0D,
    MissingKeyStore    = 0x0E,
    InvalidKey         = 0x0F,
    MalformedHeader    = 0x10,
    InvalidConfig      = 0x11,
    NestingTooDeep     = 0x12,
}

/// `stage << 16 | generic << 8 | specific`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode(u32);

impl ErrorCode {
    pub const fn pack(stage: Stage, generic: GenericKind, specific: SpecificKind) -> Self {
        Self(((stage as u32) << 16) | ((generic as u32) << 8) | specific as u32)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub fn stage(self) -> Option<Stage> {
        Stage::try_from_primitive((self.0 >> 16) as u8).ok()
    }

    pub fn generic(self) -> Option<GenericKind> {
        GenericKind::try_from_primitive((self.0 >> 8) as u8).ok()
    }

    pub fn specific(self) -> Option<SpecificKind> {
        SpecificKind::try_from_primitive(self.0 as u8).ok()
    }
}

/// The only error classes a host application shows to the user.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportCategory {
    NotADocument,
    TooNew,
    Corrupt,
    Incomplete,
    NotPermitted,
    InternalError,
}

impl ReportCategory {
    pub fn message(self) -> &'static str {
        match self {
            ReportCategory::NotADocument => "File is not a document",
            ReportCategory::TooNew => "File was written by a newer version",
            ReportCategory::Corrupt => "File is corrupt",
            ReportCategory::Incomplete => "File is incomplete",
            ReportCategory::NotPermitted => "Not permitted to open this file",
            ReportCategory::InternalError => "Internal error",
        }
    }
}

/// Unified pipeline error covering every stage.
/// - `From<io::Error>` enables `?` on disk I/O.
/// - Header codec failures are lifted with the stage that parsed them.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage:?}: bad magic 0x{found:02x}, expected 0x{expected:02x}")]
    BadMagic { stage: Stage, found: u8, expected: u8 },

    #[error("{stage:?}: header checksum mismatch (stored 0x{stored:08x}, computed 0x{computed:08x})")]
    BadHeaderChecksum { stage: Stage, stored: u32, computed: u32 },

    #[error("{stage:?}: payload checksum mismatch (stored 0x{stored:08x}, computed 0x{computed:08x})")]
    ChecksumMismatch { stage: Stage, stored: u32, computed: u32 },

    #[error("{stage:?}: length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { stage: Stage, expected: u64, actual: u64 },

    #[error("{stage:?}: stream ended before the frame was complete")]
    Truncated { stage: Stage },

    #[error("{stage:?}: malformed header: {source}")]
    Header {
        stage: Stage,
        #[source]
        source: HeaderError,
    },

    #[error("unknown stage type: {raw}")]
    UnknownStageType { raw: u32 },

    #[error("stage nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },

    #[error("action list is full (max {max} actions)")]
    ActionListFull { max: usize },

    #[error("codec error: {0}")]
    Codec(String),

    #[error("dictionary mismatch: stream 0x{stream:08x}, local 0x{local:08x}")]
    DictionaryMismatch { stream: u32, local: u32 },

    #[error("embedded public key is not the trusted local key")]
    UntrustedKey,

    #[error("{stage:?}: no key store available")]
    MissingKeyStore { stage: Stage },

    #[error("{stage:?}: invalid key material: {reason}")]
    InvalidKey { stage: Stage, reason: String },

    #[error("key wrap failed: {0}")]
    KeyWrap(String),

    #[error("key unwrap failed: {0}")]
    KeyUnwrap(String),

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("document requires version {required}, newest supported is {supported}")]
    TooNew { required: VersionTriple, supported: VersionTriple },

    #[error("not a document: {0}")]
    NotADocument(String),

    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: u64, expected: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Lift a header codec error, keeping the stage that was parsing.
    pub fn from_header(stage: Stage, e: HeaderError) -> Self {
        match e {
            HeaderError::BadMagic { found, expected } => PipelineError::BadMagic { stage, found, expected },
            HeaderError::BadHeaderChecksum { stored, computed } => {
                PipelineError::BadHeaderChecksum { stage, stored, computed }
            }
            other => PipelineError::Header { stage, source: other },
        }
    }

    /// Stage that failed.
    pub fn stage(&self) -> Stage {
        use PipelineError::*;
        match self {
            BadMagic { stage, .. }
            | BadHeaderChecksum { stage, .. }
            | ChecksumMismatch { stage, .. }
            | LengthMismatch { stage, .. }
            | Truncated { stage }
            | Header { stage, .. }
            | MissingKeyStore { stage }
            | InvalidKey { stage, .. } => *stage,
            UnknownStageType { .. } | NestingTooDeep { .. } | ActionListFull { .. } => Stage::Dispatcher,
            Codec(_) | DictionaryMismatch { .. } => Stage::Compression,
            UntrustedKey | KeyWrap(_) | KeyUnwrap(_) => Stage::Crypto,
            SignatureInvalid => Stage::Signature,
            TooNew { .. } | NotADocument(_) | ShortWrite { .. } | Io(_) | Config(_) => Stage::Terminal,
            Internal(_) => Stage::Dispatcher,
        }
    }

    /// Bit-packed `{stage, generic, specific}` code.
    pub fn code(&self) -> ErrorCode {
        use PipelineError::*;
        let (generic, specific) = match self {
            BadMagic { .. } => (GenericKind::BadMagic, SpecificKind::None),
            BadHeaderChecksum { .. } => (GenericKind::BadHeaderChecksum, SpecificKind::None),
            ChecksumMismatch { .. } => (GenericKind::BadPayloadChecksum, SpecificKind::None),
            LengthMismatch { .. } => (GenericKind::LengthMismatch, SpecificKind::None),
            Truncated { .. } => (GenericKind::LengthMismatch, SpecificKind::Truncated),
            Header { .. } => (GenericKind::Internal, SpecificKind::MalformedHeader),
            UnknownStageType { .. } => (GenericKind::NotImplemented, SpecificKind::UnknownStage),
            NestingTooDeep { .. } => (GenericKind::NotImplemented, SpecificKind::NestingTooDeep),
            ActionListFull { .. } => (GenericKind::Internal, SpecificKind::ActionListFull),
            Codec(_) => (GenericKind::Internal, SpecificKind::Codec),
            DictionaryMismatch { .. } => (GenericKind::BadPayloadChecksum, SpecificKind::DictionaryMismatch),
            UntrustedKey => (GenericKind::None, SpecificKind::UntrustedKey),
            MissingKeyStore { .. } => (GenericKind::None, SpecificKind::MissingKeyStore),
            InvalidKey { .. } => (GenericKind::Internal, SpecificKind::InvalidKey),
            KeyWrap(_) => (GenericKind::Internal, SpecificKind::KeyWrap),
            KeyUnwrap(_) => (GenericKind::Internal, SpecificKind::KeyUnwrap),
            SignatureInvalid => (GenericKind::None, SpecificKind::SignatureInvalid),
            TooNew { .. } => (GenericKind::None, SpecificKind::TooNew),
            NotADocument(_) => (GenericKind::BadMagic, SpecificKind::NotADocument),
            ShortWrite { .. } => (GenericKind::LengthMismatch, SpecificKind::ShortWrite),
            Io(e) => match e.kind() {
                io::ErrorKind::OutOfMemory => (GenericKind::OutOfMemory, SpecificKind::None),
                io::ErrorKind::WriteZero => (GenericKind::LengthMismatch, SpecificKind::ShortWrite),
                io::ErrorKind::UnexpectedEof => (GenericKind::LengthMismatch, SpecificKind::Truncated),
                _ => (GenericKind::Internal, SpecificKind::BadFileDescriptor),
            },
            Config(_) => (GenericKind::Internal, SpecificKind::InvalidConfig),
            Internal(_) => (GenericKind::Internal, SpecificKind::None),
        };
        ErrorCode::pack(self.stage(), generic, specific)
    }

    /// User-facing class of this error.
    pub fn category(&self) -> ReportCategory {
        use PipelineError::*;
        match self {
            NotADocument(_) => ReportCategory::NotADocument,
            TooNew { .. } => ReportCategory::TooNew,
            BadMagic { .. }
            | BadHeaderChecksum { .. }
            | ChecksumMismatch { .. }
            | LengthMismatch { .. }
            | Header { .. }
            | UnknownStageType { .. }
            | NestingTooDeep { .. }
            | Codec(_)
            | DictionaryMismatch { .. }
            | SignatureInvalid => ReportCategory::Corrupt,
            Truncated { .. } => ReportCategory::Incomplete,
            UntrustedKey | MissingKeyStore { .. } | KeyUnwrap(_) => ReportCategory::NotPermitted,
            Io(e) => match e.kind() {
                io::ErrorKind::UnexpectedEof => ReportCategory::Incomplete,
                io::ErrorKind::PermissionDenied => ReportCategory::NotPermitted,
                _ => ReportCategory::InternalError,
            },
            InvalidKey { .. }
            | KeyWrap(_)
            | ActionListFull { .. }
            | ShortWrite { .. }
            | Config(_)
            | Internal(_) => ReportCategory::InternalError,
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
