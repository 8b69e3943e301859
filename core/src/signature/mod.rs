//! signature/mod.rs
//! Signature stage: Ed25519 over SHA-256(SignerInfo ‖ payload).

pub mod identity;
pub mod sign;
pub mod verify;

pub use sign::{sign, signing_digest, SignedFrame};
pub use verify::Verifier;
