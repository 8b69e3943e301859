//! crypto/mod.rs
//! Crypto stage: ChaCha20 over the payload under a random per-message key,
//! with that key wrapped for the local X25519 recipient key.

pub mod keystore;
pub mod wrap;
pub mod encrypt;
pub mod decrypt;

pub use keystore::KeyStore;
pub use wrap::{unwrap_key, wrap_key, StreamKey, WRAPPED_KEY_LEN};
pub use encrypt::{seal, SealedFrame};
pub use decrypt::Decryptor;

/// Symmetric and X25519 key size.
pub const KEY_LEN: usize = 32;

/// ChaCha20 nonce size.
pub const NONCE_LEN: usize = 12;

/// Poly1305 tag size.
pub const TAG_LEN: usize = 16;
