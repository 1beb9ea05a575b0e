//! Core RNS protocol types, framing, and constants.
//!
//! This crate provides:
//! - `Address`: the 20-byte routable identifier derived from a public key
//! - Packet type tags and the fixed-prefix wire layout of each packet kind
//! - `Packet`: the tagged packet enum, decoded once at the transport boundary
//!
//! It performs no cryptography. Ciphertext fields are carried as opaque
//! bytes and interpreted by `rns-crypto`.

#![forbid(unsafe_code)]

pub mod address;
pub mod packet;

pub use address::Address;
pub use packet::{DataPacket, LinkProof, LinkRequest, Packet, PacketType};

/// Length of an address on the wire (BLAKE2b-160 digest).
pub const ADDRESS_LEN: usize = 20;

/// Length of an Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of the extended AEAD nonce carried by every packet.
pub const NONCE_LEN: usize = 24;

/// Length of the Poly1305 authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Wire-format errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("empty packet")]
    Empty,

    #[error("{packet_type} packet too short: {len} bytes, minimum {min}")]
    TooShort {
        packet_type: PacketType,
        len: usize,
        min: usize,
    },

    #[error("unknown packet type: 0x{0:02x}")]
    UnknownPacketType(u8),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
