//! Ed25519 identity keys and RNS addresses.
//!
//! An **address** is the BLAKE2b digest of the Ed25519 public key, sized to
//! 20 bytes and written as 40 hex characters.
//!
//! # Example
//!
//! ```
//! use rns_crypto::identity::{derive_address, IdentityKeypair};
//!
//! let identity = IdentityKeypair::generate();
//! let address = identity.address();
//!
//! assert_eq!(address, derive_address(&identity.public_key_bytes()));
//! println!("address: {}", address);
//! ```

use std::fmt;

use blake2::digest::consts::U20;
use blake2::{Blake2b, Digest};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rns_core::{Address, ADDRESS_LEN, PUBLIC_KEY_LEN};
use x25519_dalek::StaticSecret;
use zeroize::Zeroize;

type Blake2b160 = Blake2b<U20>;

/// Derive the address for an Ed25519 public key.
pub fn derive_address(public_key: &[u8; PUBLIC_KEY_LEN]) -> Address {
    let digest = Blake2b160::digest(public_key);
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&digest);
    Address::from_bytes(bytes)
}

/// Long-term node identity.
///
/// The signing key is zeroized on drop by `ed25519-dalek`.
pub struct IdentityKeypair {
    signing_key: SigningKey,
    address: Address,
}

impl IdentityKeypair {
    /// Generate a new random identity using the OS CSPRNG.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Create from a raw 32-byte Ed25519 seed.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(bytes))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = derive_address(signing_key.verifying_key().as_bytes());
        Self {
            signing_key,
            address,
        }
    }

    /// Get the address derived from this identity's public key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the Ed25519 public key bytes.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        *self.signing_key.verifying_key().as_bytes()
    }

    /// Get the raw 32-byte Ed25519 seed.
    pub fn private_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// X25519 secret equivalent to this identity's Ed25519 secret scalar.
    pub(crate) fn dh_secret(&self) -> StaticSecret {
        let mut scalar = self.signing_key.to_scalar_bytes();
        let secret = StaticSecret::from(scalar);
        scalar.zeroize();
        secret
    }
}

impl fmt::Debug for IdentityKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityKeypair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_determinism() {
        let identity = IdentityKeypair::generate();
        let public = identity.public_key_bytes();

        assert_eq!(derive_address(&public), derive_address(&public));
        assert_eq!(identity.address(), derive_address(&public));
    }

    #[test]
    fn test_same_seed_same_address() {
        let seed = [7u8; 32];
        let a = IdentityKeypair::from_bytes(&seed);
        let b = IdentityKeypair::from_bytes(&seed);

        assert_eq!(a.public_key_bytes(), b.public_key_bytes());
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn test_different_keys_different_addresses() {
        let a = IdentityKeypair::generate();
        let b = IdentityKeypair::generate();
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_address_is_blake2b_160() {
        let identity = IdentityKeypair::generate();
        let mut hasher = Blake2b160::new();
        hasher.update(identity.public_key_bytes());
        let expected = hasher.finalize();

        assert_eq!(identity.address().as_bytes().as_slice(), expected.as_slice());
        assert_eq!(identity.address().to_hex().len(), 40);
    }

    #[test]
    fn test_debug_hides_key_material() {
        let identity = IdentityKeypair::from_bytes(&[9u8; 32]);
        let rendered = format!("{:?}", identity);

        assert!(rendered.contains(&identity.address().to_hex()));
        assert!(!rendered.contains("signing_key"));
    }
}
