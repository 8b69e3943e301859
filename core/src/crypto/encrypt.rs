//! crypto/encrypt.rs
//! Write side of the crypto stage.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use tracing::debug;

use crate::crypto::{wrap_key, KeyStore, StreamKey};
use crate::headers::{CryptoFrame, FrameHeader};
use crate::types::{PipelineError, Result, Stage};
use crate::utils::compute_checksum;

#[derive(Debug, Clone)]
pub struct SealedFrame {
    pub header: CryptoFrame,
    pub body: Vec<u8>,
}

impl SealedFrame {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CryptoFrame::LEN + self.body.len());
        out.extend_from_slice(&self.header.encode());
        out.extend_from_slice(&self.body);
        out
    }
}

/// Encrypt `payload` for the key store's own wrap key.
///
/// A fresh key and nonce are drawn per call. The ciphertext is written into a
/// new buffer and its CRC-32 goes into the frame.
pub fn seal(payload: &[u8], keys: &KeyStore) -> Result<SealedFrame> {
    let payload_length = u32::try_from(payload.len())
        .map_err(|_| PipelineError::Internal("payload exceeds the 4 GiB frame limit".into()))?;

    let stream_key = StreamKey::random();
    let mut cipher = ChaCha20::new_from_slices(stream_key.key(), stream_key.nonce())
        .map_err(|_| PipelineError::InvalidKey { stage: Stage::Crypto, reason: "stream key length".into() })?;

    let mut body = payload.to_vec();
    cipher.apply_keystream(&mut body);
    let checksum = compute_checksum(&body);

    let recipient = keys.wrap_public_key();
    let wrapped = wrap_key(&stream_key, &recipient)?;
    let header = CryptoFrame::new(payload_length, &recipient, &wrapped, checksum)
        .map_err(|e| PipelineError::from_header(Stage::Crypto, e))?;

    debug!(payload_length, wrapped_len = wrapped.len(), "crypto frame sealed");
    Ok(SealedFrame { header, body })
}
