//! crypto/keystore.rs
//! Local key store: X25519 key for unwrapping stream keys, Ed25519 key for
//! signing, and the identity written into signer records.
//!
//! Secrets never appear in `Debug` output. The store is read-only while a
//! pipeline call runs and is borrowed through `PipelineContext`.

use std::fmt;

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::crypto::KEY_LEN;
use crate::headers::SignerInfo;
use crate::types::{PipelineError, Result, Stage};

pub struct KeyStore {
    wrap_secret: StaticSecret,
    wrap_public: PublicKey,
    signing: SigningKey,
    identity: SignerInfo,
}

impl KeyStore {
    /// Fresh random keys from the OS generator.
    pub fn generate(identity: SignerInfo) -> Self {
        let mut wrap = Zeroizing::new([0u8; KEY_LEN]);
        let mut sign = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(wrap.as_mut());
        OsRng.fill_bytes(sign.as_mut());
        Self::from_secrets(*wrap, *sign, identity)
    }

    pub fn from_secrets(wrap_secret: [u8; KEY_LEN], signing_secret: [u8; KEY_LEN], identity: SignerInfo) -> Self {
        let wrap_secret = StaticSecret::from(wrap_secret);
        let wrap_public = PublicKey::from(&wrap_secret);
        Self {
            wrap_secret,
            wrap_public,
            signing: SigningKey::from_bytes(&signing_secret),
            identity,
        }
    }

    /// Public half of the wrap key; embedded in every crypto frame we write.
    pub fn wrap_public_key(&self) -> [u8; KEY_LEN] {
        *self.wrap_public.as_bytes()
    }

    pub(crate) fn wrap_secret(&self) -> &StaticSecret {
        &self.wrap_secret
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    pub fn identity(&self) -> &SignerInfo {
        &self.identity
    }

    /// Byte-for-byte comparison against the one local wrap key.
    pub fn trusts_wrap_key(&self, embedded: &[u8]) -> bool {
        embedded == self.wrap_public.as_bytes()
    }

    /// Load from the JSON form written by [`KeyStore::to_json`].
    pub fn from_json(s: &str) -> Result<Self> {
        let file: KeyStoreFile = serde_json::from_str(s)
            .map_err(|e| PipelineError::Config(format!("key store: {e}")))?;
        let wrap = decode_secret("wrap_secret", &file.wrap_secret)?;
        let sign = decode_secret("signing_secret", &file.signing_secret)?;
        Ok(Self::from_secrets(*wrap, *sign, file.identity))
    }

    pub fn to_json(&self) -> Result<String> {
        let file = KeyStoreFile {
            wrap_secret: hex::encode(self.wrap_secret.to_bytes()),
            signing_secret: hex::encode(self.signing.to_bytes()),
            identity: self.identity.clone(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| PipelineError::Internal(e.to_string()))
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("wrap_public", &hex::encode(self.wrap_public.as_bytes()))
            .field("verifying", &hex::encode(self.verifying_key().as_bytes()))
            .field("identity", &self.identity.name)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize, Deserialize)]
struct KeyStoreFile {
    wrap_secret: String,
    signing_secret: String,
    identity: SignerInfo,
}

fn decode_secret(field: &str, hex_str: &str) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let raw = Zeroizing::new(hex::decode(hex_str).map_err(|e| PipelineError::InvalidKey {
        stage: Stage::Crypto,
        reason: format!("{field}: {e}"),
    })?);
    if raw.len() != KEY_LEN {
        return Err(PipelineError::InvalidKey {
            stage: Stage::Crypto,
            reason: format!("{field}: expected {KEY_LEN} bytes, got {}", raw.len()),
        });
    }
    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    out.copy_from_slice(&raw);
    Ok(out)
}
