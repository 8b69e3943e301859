//! signature/sign.rs
//! Write side of the signature stage.

use ed25519_dalek::Signer;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::crypto::KeyStore;
use crate::headers::{FrameHeader, SignFrame, SignerInfo};
use crate::types::{PipelineError, Result, Stage};
use crate::utils::compute_checksum;

/// Header, encoded signer record and payload, in stream order.
#[derive(Debug, Clone)]
pub struct SignedFrame {
    pub header: SignFrame,
    pub signer: Vec<u8>,
    pub body: Vec<u8>,
}

impl SignedFrame {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SignFrame::LEN + self.signer.len() + self.body.len());
        out.extend_from_slice(&self.header.encode());
        out.extend_from_slice(&self.signer);
        out.extend_from_slice(&self.body);
        out
    }
}

/// SHA-256 over `signer ‖ payload`; the value that gets signed.
pub fn signing_digest(signer: &[u8], payload: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(signer);
    h.update(payload);
    h.finalize().into()
}

/// Sign `payload` with the key store's identity and Ed25519 key.
pub fn sign(payload: &[u8], keys: &KeyStore) -> Result<SignedFrame> {
    let payload_length = u32::try_from(payload.len())
        .map_err(|_| PipelineError::Internal("payload exceeds the 4 GiB frame limit".into()))?;

    let info: &SignerInfo = keys.identity();
    let signer = info.encode().map_err(|e| PipelineError::from_header(Stage::Signature, e))?;
    let digest = signing_digest(&signer, payload);
    let signature = keys.signing_key().sign(&digest);

    let header = SignFrame::new(
        payload_length,
        keys.verifying_key().as_bytes(),
        &signature.to_bytes(),
        compute_checksum(payload),
    )
    .map_err(|e| PipelineError::from_header(Stage::Signature, e))?;

    debug!(payload_length, signer = %info.name, "sign frame built");
    Ok(SignedFrame { header, signer, body: payload.to_vec() })
}
