//! Cryptographic primitives for RNS.
//!
//! This crate provides:
//! - Ed25519 identity keys and their derived addresses
//! - X25519 link key agreement using the identity key's Montgomery form
//! - XChaCha20-Poly1305 sealing for handshake proofs and data packets
//!
//! # Design
//!
//! A node has exactly one long-term key. The same key names the node (its
//! address is a BLAKE2b-160 digest of the Ed25519 public key) and serves as
//! Diffie-Hellman material: the Ed25519 secret scalar is used as an X25519
//! secret, and peers' Ed25519 public keys are mapped to Montgomery form.
//! Both sides therefore arrive at the same link key from a single exchange
//! of public keys.
//!
//! Every packet carries an explicit 24-byte nonce, so no nonce state is kept
//! per link.

#![forbid(unsafe_code)]

pub mod identity;
pub mod link;

pub use identity::{derive_address, IdentityKeypair};
pub use link::{random_nonce, LinkKey};

use thiserror::Error;

/// Cryptographic failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("public key is not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("key agreement produced a non-contributory secret")]
    NonContributory,

    #[error("sealing failed")]
    Seal,

    #[error("authentication failed")]
    Open,
}
