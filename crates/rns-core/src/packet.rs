//! RNS packet framing.
//!
//! Every packet is a one-byte type tag followed by a fixed-layout prefix.
//! Packets that carry a ciphertext take it as *everything after the prefix*;
//! there is no length field.
//!
//! # Packet Format
//!
//! ```text
//! LINK_REQUEST (0x01)
//! +------+----------------------+------------------+
//! | 0x01 | public key (32)      | nonce (24)       |
//! +------+----------------------+------------------+
//!
//! LINK_PROOF (0x02)
//! +------+----------------------+------------------+-----------------------+
//! | 0x02 | public key (32)      | nonce (24)       | ciphertext (rest)     |
//! +------+----------------------+------------------+-----------------------+
//!
//! DATA (0x04)
//! +------+----------------------+------------------+-----------------------+
//! | 0x04 | destination (20)     | nonce (24)       | ciphertext (rest)     |
//! +------+----------------------+------------------+-----------------------+
//! ```

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{Address, WireError, ADDRESS_LEN, NONCE_LEN, PUBLIC_KEY_LEN};

/// Packet type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Initiator's half of the handshake.
    LinkRequest = 0x01,
    /// Responder's half of the handshake.
    LinkProof = 0x02,
    /// Encrypted application message.
    Data = 0x04,
}

impl PacketType {
    /// Smallest valid packet of this type, tag byte included.
    pub const fn min_len(self) -> usize {
        match self {
            Self::LinkRequest | Self::LinkProof => 1 + PUBLIC_KEY_LEN + NONCE_LEN,
            Self::Data => 1 + ADDRESS_LEN + NONCE_LEN,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::LinkRequest => "LINK_REQUEST",
            Self::LinkProof => "LINK_PROOF",
            Self::Data => "DATA",
        }
    }
}

impl TryFrom<u8> for PacketType {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::LinkRequest),
            0x02 => Ok(Self::LinkProof),
            0x04 => Ok(Self::Data),
            _ => Err(WireError::UnknownPacketType(value)),
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// LINK_REQUEST body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    pub public_key: [u8; PUBLIC_KEY_LEN],
    pub nonce: [u8; NONCE_LEN],
}

/// LINK_PROOF body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkProof {
    pub public_key: [u8; PUBLIC_KEY_LEN],
    /// Echo of the nonce chosen by the requester.
    pub nonce: [u8; NONCE_LEN],
    /// Sealed copy of the responder's public key.
    pub ciphertext: Bytes,
}

/// DATA body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    pub destination: Address,
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Bytes,
}

/// A decoded RNS packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    LinkRequest(LinkRequest),
    LinkProof(LinkProof),
    Data(DataPacket),
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Self::LinkRequest(_) => PacketType::LinkRequest,
            Self::LinkProof(_) => PacketType::LinkProof,
            Self::Data(_) => PacketType::Data,
        }
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> Bytes {
        let packet_type = self.packet_type();

        match self {
            Self::LinkRequest(req) => {
                let mut buf = BytesMut::with_capacity(packet_type.min_len());
                buf.put_u8(packet_type as u8);
                buf.put_slice(&req.public_key);
                buf.put_slice(&req.nonce);
                buf.freeze()
            }
            Self::LinkProof(proof) => {
                let mut buf =
                    BytesMut::with_capacity(packet_type.min_len() + proof.ciphertext.len());
                buf.put_u8(packet_type as u8);
                buf.put_slice(&proof.public_key);
                buf.put_slice(&proof.nonce);
                buf.put_slice(&proof.ciphertext);
                buf.freeze()
            }
            Self::Data(data) => {
                let mut buf =
                    BytesMut::with_capacity(packet_type.min_len() + data.ciphertext.len());
                buf.put_u8(packet_type as u8);
                buf.put_slice(data.destination.as_bytes());
                buf.put_slice(&data.nonce);
                buf.put_slice(&data.ciphertext);
                buf.freeze()
            }
        }
    }

    /// Decode a single, already-delimited packet.
    ///
    /// Bytes past a LINK_REQUEST's fixed prefix are ignored. For the other
    /// kinds the remainder is the ciphertext, which may be empty here and is
    /// left for the AEAD layer to reject.
    pub fn decode(bytes: Bytes) -> Result<Self, WireError> {
        let Some(&tag) = bytes.first() else {
            return Err(WireError::Empty);
        };

        let packet_type = PacketType::try_from(tag)?;
        let min = packet_type.min_len();
        if bytes.len() < min {
            return Err(WireError::TooShort {
                packet_type,
                len: bytes.len(),
                min,
            });
        }

        let mut buf = bytes;
        buf.advance(1);

        let packet = match packet_type {
            PacketType::LinkRequest => {
                let mut public_key = [0u8; PUBLIC_KEY_LEN];
                buf.copy_to_slice(&mut public_key);
                let mut nonce = [0u8; NONCE_LEN];
                buf.copy_to_slice(&mut nonce);
                Self::LinkRequest(LinkRequest { public_key, nonce })
            }
            PacketType::LinkProof => {
                let mut public_key = [0u8; PUBLIC_KEY_LEN];
                buf.copy_to_slice(&mut public_key);
                let mut nonce = [0u8; NONCE_LEN];
                buf.copy_to_slice(&mut nonce);
                Self::LinkProof(LinkProof {
                    public_key,
                    nonce,
                    ciphertext: buf,
                })
            }
            PacketType::Data => {
                let mut destination = [0u8; ADDRESS_LEN];
                buf.copy_to_slice(&mut destination);
                let mut nonce = [0u8; NONCE_LEN];
                buf.copy_to_slice(&mut nonce);
                Self::Data(DataPacket {
                    destination: Address::from_bytes(destination),
                    nonce,
                    ciphertext: buf,
                })
            }
        };

        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> LinkRequest {
        LinkRequest {
            public_key: [0x11; PUBLIC_KEY_LEN],
            nonce: [0x22; NONCE_LEN],
        }
    }

    #[test]
    fn test_link_request_layout() {
        let bytes = Packet::LinkRequest(sample_request()).encode();

        assert_eq!(bytes.len(), 57);
        assert_eq!(bytes[0], 0x01);
        assert_eq!(&bytes[1..33], &[0x11; 32]);
        assert_eq!(&bytes[33..57], &[0x22; 24]);
    }

    #[test]
    fn test_link_proof_ciphertext_is_remainder() {
        let mut raw = vec![0x02];
        raw.extend_from_slice(&[0xaa; PUBLIC_KEY_LEN]);
        raw.extend_from_slice(&[0xbb; NONCE_LEN]);
        raw.extend_from_slice(b"sealed key and tag");

        match Packet::decode(Bytes::from(raw)).unwrap() {
            Packet::LinkProof(proof) => {
                assert_eq!(proof.public_key, [0xaa; PUBLIC_KEY_LEN]);
                assert_eq!(proof.nonce, [0xbb; NONCE_LEN]);
                assert_eq!(&proof.ciphertext[..], b"sealed key and tag");
            }
            other => panic!("expected LINK_PROOF, got {:?}", other),
        }
    }

    #[test]
    fn test_data_layout() {
        let packet = Packet::Data(DataPacket {
            destination: Address::from_bytes([0x33; ADDRESS_LEN]),
            nonce: [0x44; NONCE_LEN],
            ciphertext: Bytes::from_static(b"ct"),
        });
        let bytes = packet.encode();

        assert_eq!(bytes[0], 0x04);
        assert_eq!(&bytes[1..21], &[0x33; 20]);
        assert_eq!(&bytes[21..45], &[0x44; 24]);
        assert_eq!(&bytes[45..], b"ct");

        assert_eq!(Packet::decode(bytes).unwrap(), packet);
    }

    #[test]
    fn test_request_trailing_bytes_ignored() {
        let mut raw = Packet::LinkRequest(sample_request()).encode().to_vec();
        raw.extend_from_slice(b"junk");

        let decoded = Packet::decode(Bytes::from(raw)).unwrap();
        assert_eq!(decoded, Packet::LinkRequest(sample_request()));
    }

    #[test]
    fn test_empty_ciphertext_still_decodes() {
        let mut raw = vec![0x04];
        raw.extend_from_slice(&[0u8; ADDRESS_LEN + NONCE_LEN]);

        match Packet::decode(Bytes::from(raw)).unwrap() {
            Packet::Data(data) => assert!(data.ciphertext.is_empty()),
            other => panic!("expected DATA, got {:?}", other),
        }
    }

    #[test]
    fn test_too_short_per_type() {
        for (tag, min) in [(0x01u8, 57usize), (0x02, 57), (0x04, 45)] {
            let raw = vec![tag; min - 1];
            let err = Packet::decode(Bytes::from(raw)).unwrap_err();
            match err {
                WireError::TooShort { len, min: m, .. } => {
                    assert_eq!(len, min - 1);
                    assert_eq!(m, min);
                }
                other => panic!("expected TooShort, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_buffer() {
        assert_eq!(Packet::decode(Bytes::new()), Err(WireError::Empty));
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(
            Packet::decode(Bytes::from_static(&[0x03, 1, 2, 3])),
            Err(WireError::UnknownPacketType(0x03))
        );
        assert_eq!(
            PacketType::try_from(0xff),
            Err(WireError::UnknownPacketType(0xff))
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(PacketType::LinkRequest.to_string(), "LINK_REQUEST");
        assert_eq!(PacketType::LinkProof.to_string(), "LINK_PROOF");
        assert_eq!(PacketType::Data.to_string(), "DATA");
    }
}
