//! crypto/decrypt.rs
//! Push-driven read side of the crypto stage.
//!
//! Nothing is decrypted until the embedded recipient key has been matched
//! against the local key store and the stream key has been unwrapped.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use tracing::{debug, trace, warn};

use crate::crypto::{unwrap_key, KeyStore};
use crate::headers::{CryptoFrame, FrameHeader};
use crate::types::{PipelineError, Result, Stage};
use crate::utils::{fill_from, RunningCrc};

pub struct Decryptor {
    header_buf: Vec<u8>,
    frame: Option<CryptoFrame>,
    cipher: Option<ChaCha20>,
    crc: RunningCrc,
    scratch: Vec<u8>,
}

impl Decryptor {
    pub fn new() -> Self {
        Self {
            header_buf: Vec::with_capacity(CryptoFrame::LEN),
            frame: None,
            cipher: None,
            crc: RunningCrc::new(),
            scratch: Vec::new(),
        }
    }

    pub fn frame(&self) -> Option<&CryptoFrame> {
        self.frame.as_ref()
    }

    /// Feed one chunk; plaintext goes to `sink` chunk by chunk.
    pub fn push(
        &mut self,
        chunk: &[u8],
        keys: Option<&KeyStore>,
        sink: &mut dyn FnMut(&[u8]) -> Result<()>,
    ) -> Result<usize> {
        let mut input = chunk;

        if self.cipher.is_none() {
            let took = fill_from(&mut self.header_buf, CryptoFrame::LEN, input);
            input = &input[took..];
            if self.header_buf.len() < CryptoFrame::LEN {
                return Ok(chunk.len());
            }
            self.accept_header(keys)?;
        }

        let (Some(frame), Some(cipher)) = (self.frame.as_ref(), self.cipher.as_mut()) else {
            return Err(PipelineError::Internal("decryptor has no cipher after header".into()));
        };

        if self.crc.len() + input.len() as u64 > u64::from(frame.payload_length) {
            return Err(PipelineError::LengthMismatch {
                stage: Stage::Crypto,
                expected: u64::from(frame.payload_length),
                actual: self.crc.len() + input.len() as u64,
            });
        }
        if input.is_empty() {
            return Ok(chunk.len());
        }

        self.crc.update(input);
        self.scratch.clear();
        self.scratch.extend_from_slice(input);
        cipher.apply_keystream(&mut self.scratch);
        trace!(bytes = input.len(), "crypto chunk decrypted");
        sink(&self.scratch)?;
        Ok(chunk.len())
    }

    fn accept_header(&mut self, keys: Option<&KeyStore>) -> Result<()> {
        let frame = CryptoFrame::decode(&self.header_buf)
            .map_err(|e| PipelineError::from_header(Stage::Crypto, e))?;
        let keys = keys.ok_or(PipelineError::MissingKeyStore { stage: Stage::Crypto })?;

        if !keys.trusts_wrap_key(&frame.public_key) {
            warn!(embedded = %hex::encode(&frame.public_key), "crypto frame addressed to an untrusted key");
            return Err(PipelineError::UntrustedKey);
        }

        let stream_key = unwrap_key(&frame.wrapped_key, keys.wrap_secret())?;
        let cipher = ChaCha20::new_from_slices(stream_key.key(), stream_key.nonce())
            .map_err(|_| PipelineError::InvalidKey { stage: Stage::Crypto, reason: "stream key length".into() })?;

        debug!(payload_length = frame.payload_length, "crypto frame header accepted");
        self.cipher = Some(cipher);
        self.frame = Some(frame);
        Ok(())
    }

    /// Close the frame: payload length and ciphertext CRC must match.
    pub fn finish(self) -> Result<CryptoFrame> {
        let frame = self.frame.ok_or(PipelineError::Truncated { stage: Stage::Crypto })?;
        let received = self.crc.len();
        if received != u64::from(frame.payload_length) {
            return Err(PipelineError::LengthMismatch {
                stage: Stage::Crypto,
                expected: u64::from(frame.payload_length),
                actual: received,
            });
        }
        let computed = self.crc.finalize();
        if computed != frame.payload_checksum {
            warn!(stored = frame.payload_checksum, computed, "ciphertext checksum mismatch");
            return Err(PipelineError::ChecksumMismatch {
                stage: Stage::Crypto,
                stored: frame.payload_checksum,
                computed,
            });
        }
        Ok(frame)
    }
}

impl Default for Decryptor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Decryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decryptor")
            .field("frame", &self.frame)
            .field("keyed", &self.cipher.is_some())
            .field("crc", &self.crc)
            .finish()
    }
}
