//! Link key agreement and packet sealing.
//!
//! A [`LinkKey`] is the raw X25519 output between the local identity and a
//! peer's identity. It is used unmodified as the XChaCha20-Poly1305 key for
//! every packet on the link, in both directions. Nonces are 24 random bytes
//! carried in the clear next to each ciphertext.

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use ed25519_dalek::VerifyingKey;
use rand::{rngs::OsRng, RngCore};
use rns_common::helpers::constant_time_eq;
use rns_core::{NONCE_LEN, PUBLIC_KEY_LEN};
use x25519_dalek::PublicKey as X25519PublicKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::identity::IdentityKeypair;
use crate::CryptoError;

/// Fresh random nonce from the OS CSPRNG.
pub fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Symmetric key shared by the two ends of a link.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LinkKey([u8; 32]);

impl LinkKey {
    /// Agree on a link key with the holder of `peer_public_key`.
    ///
    /// The peer's Ed25519 key is mapped to its Montgomery form and combined
    /// with the local identity's secret scalar.
    pub fn agree(
        identity: &IdentityKeypair,
        peer_public_key: &[u8; PUBLIC_KEY_LEN],
    ) -> Result<Self, CryptoError> {
        let verifying_key =
            VerifyingKey::from_bytes(peer_public_key).map_err(|_| CryptoError::InvalidPublicKey)?;
        let peer = X25519PublicKey::from(verifying_key.to_montgomery().to_bytes());

        let shared = identity.dh_secret().diffie_hellman(&peer);
        if !shared.was_contributory() {
            return Err(CryptoError::NonContributory);
        }

        Ok(Self(*shared.as_bytes()))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encrypt and authenticate `plaintext`.
    ///
    /// Returns ciphertext with the 16-byte tag appended.
    pub fn seal(&self, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.cipher()
            .encrypt(XNonce::from_slice(nonce), plaintext)
            .map_err(|_| CryptoError::Seal)
    }

    /// Authenticate and decrypt `ciphertext`.
    pub fn open(&self, nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.cipher()
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Open)
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(Key::from_slice(&self.0))
    }
}

impl PartialEq for LinkKey {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for LinkKey {}

impl fmt::Debug for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LinkKey([REDACTED])")
    }
}
