//! Link engine errors.

use rns_core::{Address, WireError};
use rns_crypto::CryptoError;
use thiserror::Error;

/// Errors returned by [`Engine`](crate::Engine) operations.
///
/// None of these are fatal: each one is local to the packet or call that
/// produced it, and leaves the tables of unrelated peers untouched.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Packet shorter than its type's fixed prefix, or empty.
    #[error("malformed packet: {0}")]
    Malformed(#[from] WireError),

    /// LINK_PROOF ciphertext did not authenticate under the agreed key.
    #[error("link proof from {peer} failed authentication")]
    HandshakeAuthentication { peer: String },

    /// LINK_PROOF opened, but sealed a key other than the one it carries.
    #[error("link proof from {peer} does not match its public key")]
    IdentityMismatch { peer: String },

    /// LINK_PROOF from a handle we never sent a LINK_REQUEST to.
    #[error("unsolicited link proof from {peer}")]
    UnsolicitedProof { peer: String },

    #[error("invalid public key from {peer}: {source}")]
    InvalidPeerKey {
        peer: String,
        #[source]
        source: CryptoError,
    },

    /// No established link can reach the address.
    #[error("no route to {0}")]
    NoRoute(Address),

    #[error("payload too large: {len} bytes, maximum {max}")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl LinkError {
    /// True for failures of the handshake that should be treated as
    /// security-relevant events.
    pub fn is_handshake_failure(&self) -> bool {
        matches!(
            self,
            Self::HandshakeAuthentication { .. }
                | Self::IdentityMismatch { .. }
                | Self::UnsolicitedProof { .. }
                | Self::InvalidPeerKey { .. }
        )
    }
}
