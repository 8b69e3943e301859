//! crypto/wrap.rs
//! Per-message stream key and its wrap under the recipient's X25519 key.
//!
//! Wrapped form: `ephemeral_public[32] ‖ ChaCha20-Poly1305(kek, zero nonce, key ‖ nonce)[44 + 16]`.
//! The KEK is HKDF-SHA256 over the ECDH shared secret, salted with both public
//! keys. Each KEK encrypts exactly one message, so the zero nonce is never reused.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::crypto::{KEY_LEN, NONCE_LEN, TAG_LEN};
use crate::types::{PipelineError, Result};

const WRAP_INFO: &[u8] = b"streamglue/key-wrap/v1";

/// Key and nonce packed together.
pub const KEY_MATERIAL_LEN: usize = KEY_LEN + NONCE_LEN;

/// Size of the wrapped key slot payload.
pub const WRAPPED_KEY_LEN: usize = KEY_LEN + KEY_MATERIAL_LEN + TAG_LEN;

/// Random symmetric key for one crypto frame.
pub struct StreamKey {
    key: Zeroizing<[u8; KEY_LEN]>,
    nonce: [u8; NONCE_LEN],
}

impl StreamKey {
    pub fn random() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(key.as_mut());
        OsRng.fill_bytes(&mut nonce);
        Self { key, nonce }
    }

    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    fn to_material(&self) -> Zeroizing<[u8; KEY_MATERIAL_LEN]> {
        let mut m = Zeroizing::new([0u8; KEY_MATERIAL_LEN]);
        m[..KEY_LEN].copy_from_slice(self.key.as_ref());
        m[KEY_LEN..].copy_from_slice(&self.nonce);
        m
    }

    fn from_material(m: &[u8]) -> Result<Self> {
        if m.len() != KEY_MATERIAL_LEN {
            return Err(PipelineError::KeyUnwrap(format!(
                "key material is {} bytes, expected {KEY_MATERIAL_LEN}",
                m.len()
            )));
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        let mut nonce = [0u8; NONCE_LEN];
        key.copy_from_slice(&m[..KEY_LEN]);
        nonce.copy_from_slice(&m[KEY_LEN..]);
        Ok(Self { key, nonce })
    }
}

fn derive_kek(shared: &[u8; 32], eph_pub: &[u8; 32], recipient: &[u8; 32]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let mut salt = [0u8; 64];
    salt[..32].copy_from_slice(eph_pub);
    salt[32..].copy_from_slice(recipient);
    let hk = Hkdf::<Sha256>::new(Some(&salt[..]), shared);
    let mut kek = Zeroizing::new([0u8; KEY_LEN]);
    hk.expand(WRAP_INFO, kek.as_mut())
        .map_err(|_| PipelineError::Internal("HKDF expand failed".into()))?;
    Ok(kek)
}

/// Wrap `stream_key` for the holder of `recipient`'s secret.
pub fn wrap_key(stream_key: &StreamKey, recipient: &[u8; 32]) -> Result<Vec<u8>> {
    let recipient_pk = PublicKey::from(*recipient);
    let eph = EphemeralSecret::random_from_rng(OsRng);
    let eph_pub = PublicKey::from(&eph);
    let shared = eph.diffie_hellman(&recipient_pk);
    if !shared.was_contributory() {
        return Err(PipelineError::KeyWrap("recipient key is a low-order point".into()));
    }

    let kek = derive_kek(shared.as_bytes(), eph_pub.as_bytes(), recipient)?;
    let aead = ChaCha20Poly1305::new_from_slice(kek.as_ref())
        .map_err(|_| PipelineError::KeyWrap("bad KEK length".into()))?;
    let material = stream_key.to_material();
    let sealed = aead
        .encrypt(Nonce::from_slice(&[0u8; NONCE_LEN]), &material[..])
        .map_err(|_| PipelineError::KeyWrap("AEAD seal failed".into()))?;

    let mut out = Vec::with_capacity(WRAPPED_KEY_LEN);
    out.extend_from_slice(eph_pub.as_bytes());
    out.extend_from_slice(&sealed);
    debug_assert_eq!(out.len(), WRAPPED_KEY_LEN);
    Ok(out)
}

/// Recover the stream key with the local wrap secret.
pub fn unwrap_key(wrapped: &[u8], secret: &StaticSecret) -> Result<StreamKey> {
    if wrapped.len() != WRAPPED_KEY_LEN {
        return Err(PipelineError::KeyUnwrap(format!(
            "wrapped key is {} bytes, expected {WRAPPED_KEY_LEN}",
            wrapped.len()
        )));
    }
    let mut eph_bytes = [0u8; 32];
    eph_bytes.copy_from_slice(&wrapped[..32]);
    let eph_pub = PublicKey::from(eph_bytes);
    let recipient = PublicKey::from(secret);

    let shared = secret.diffie_hellman(&eph_pub);
    if !shared.was_contributory() {
        return Err(PipelineError::KeyUnwrap("ephemeral key is a low-order point".into()));
    }

    let kek = derive_kek(shared.as_bytes(), &eph_bytes, recipient.as_bytes())?;
    let aead = ChaCha20Poly1305::new_from_slice(kek.as_ref())
        .map_err(|_| PipelineError::KeyUnwrap("bad KEK length".into()))?;
    let material = Zeroizing::new(
        aead.decrypt(Nonce::from_slice(&[0u8; NONCE_LEN]), &wrapped[32..])
            .map_err(|_| PipelineError::KeyUnwrap("authentication failed".into()))?,
    );
    StreamKey::from_material(&material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_recovers_key_and_nonce() {
        let secret = StaticSecret::from([7u8; 32]);
        let public = PublicKey::from(&secret);
        let sk = StreamKey::random();
        let wrapped = wrap_key(&sk, public.as_bytes()).unwrap();
        assert_eq!(wrapped.len(), WRAPPED_KEY_LEN);

        let back = unwrap_key(&wrapped, &secret).unwrap();
        assert_eq!(back.key(), sk.key());
        assert_eq!(back.nonce(), sk.nonce());
    }

    #[test]
    fn wrong_secret_fails_unwrap() {
        let public = PublicKey::from(&StaticSecret::from([7u8; 32]));
        let wrapped = wrap_key(&StreamKey::random(), public.as_bytes()).unwrap();
        let err = unwrap_key(&wrapped, &StaticSecret::from([9u8; 32])).err().unwrap();
        assert!(matches!(err, PipelineError::KeyUnwrap(_)));
    }
}
