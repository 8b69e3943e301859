//! signature/verify.rs
//! Push-driven read side of the signature stage.
//!
//! Stream order is `SignFrame ‖ SignerInfo ‖ payload`. The signer record and
//! every payload byte are folded into one SHA-256 as they arrive; payload bytes
//! also feed a CRC-32 and are forwarded before the signature is known.

use ed25519_dalek::{Signature, Verifier as _, VerifyingKey};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::headers::{FrameHeader, SignFrame, SignerInfo};
use crate::types::{PipelineError, Result, Stage};
use crate::utils::{fill_from, RunningCrc};

pub struct Verifier {
    header_buf: Vec<u8>,
    frame: Option<SignFrame>,
    signer_buf: Vec<u8>,
    signer: Option<SignerInfo>,
    digest: Sha256,
    crc: RunningCrc,
}

impl Verifier {
    pub fn new() -> Self {
        Self {
            header_buf: Vec::with_capacity(SignFrame::LEN),
            frame: None,
            signer_buf: Vec::with_capacity(SignerInfo::LEN),
            signer: None,
            digest: Sha256::new(),
            crc: RunningCrc::new(),
        }
    }

    pub fn push(&mut self, chunk: &[u8], sink: &mut dyn FnMut(&[u8]) -> Result<()>) -> Result<usize> {
        let mut input = chunk;

        if self.frame.is_none() {
            let took = fill_from(&mut self.header_buf, SignFrame::LEN, input);
            input = &input[took..];
            if self.header_buf.len() < SignFrame::LEN {
                return Ok(chunk.len());
            }
            let frame = SignFrame::decode(&self.header_buf)
                .map_err(|e| PipelineError::from_header(Stage::Signature, e))?;
            debug!(payload_length = frame.payload_length, "sign frame header accepted");
            self.frame = Some(frame);
        }

        if self.signer.is_none() {
            let took = fill_from(&mut self.signer_buf, SignerInfo::LEN, input);
            input = &input[took..];
            if self.signer_buf.len() < SignerInfo::LEN {
                return Ok(chunk.len());
            }
            let info = SignerInfo::decode(&self.signer_buf)
                .map_err(|e| PipelineError::from_header(Stage::Signature, e))?;
            self.digest.update(&self.signer_buf);
            self.signer = Some(info);
        }

        let Some(frame) = self.frame.as_ref() else {
            return Err(PipelineError::Internal("verifier lost its header".into()));
        };
        let total = self.crc.len() + input.len() as u64;
        if total > u64::from(frame.payload_length) {
            return Err(PipelineError::LengthMismatch {
                stage: Stage::Signature,
                expected: u64::from(frame.payload_length),
                actual: total,
            });
        }
        if !input.is_empty() {
            self.digest.update(input);
            self.crc.update(input);
            sink(input)?;
        }
        Ok(chunk.len())
    }

    /// Length, CRC and signature checks, in that order. Returns the signer on success.
    pub fn finish(self) -> Result<(SignFrame, SignerInfo)> {
        let (Some(frame), Some(signer)) = (self.frame, self.signer) else {
            return Err(PipelineError::Truncated { stage: Stage::Signature });
        };

        let received = self.crc.len();
        if received != u64::from(frame.payload_length) {
            return Err(PipelineError::LengthMismatch {
                stage: Stage::Signature,
                expected: u64::from(frame.payload_length),
                actual: received,
            });
        }
        let computed = self.crc.finalize();
        if computed != frame.payload_checksum {
            warn!(stored = frame.payload_checksum, computed, "signed payload checksum mismatch");
            return Err(PipelineError::ChecksumMismatch {
                stage: Stage::Signature,
                stored: frame.payload_checksum,
                computed,
            });
        }

        let digest: [u8; 32] = self.digest.finalize().into();
        verify_digest(&frame, &digest)?;
        debug!(signer = %signer.name, "signature verified");
        Ok((frame, signer))
    }
}

fn verify_digest(frame: &SignFrame, digest: &[u8; 32]) -> Result<()> {
    let key_bytes: [u8; 32] = frame.public_key.as_slice().try_into().map_err(|_| {
        warn!(len = frame.public_key.len(), "embedded signer key has the wrong length");
        PipelineError::SignatureInvalid
    })?;
    let key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| {
        warn!("embedded signer key is not a valid curve point");
        PipelineError::SignatureInvalid
    })?;
    let signature = Signature::from_slice(&frame.signature).map_err(|_| PipelineError::SignatureInvalid)?;
    key.verify(digest, &signature).map_err(|_| {
        warn!("signature does not match the signed digest");
        PipelineError::SignatureInvalid
    })
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("frame", &self.frame)
            .field("signer", &self.signer.as_ref().map(|s| s.name.as_str()))
            .field("crc", &self.crc)
            .finish()
    }
}
