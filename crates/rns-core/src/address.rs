//! RNS addresses.
//!
//! An **address** is the 20-byte digest of a node's public key, written as
//! 40 lowercase hex characters. Addresses are not registered anywhere: two
//! nodes holding the same public key share an address.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{WireError, ADDRESS_LEN};

/// Routable node identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Wrap raw digest bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse an address from its hex representation.
    pub fn parse(s: &str) -> Result<Self, WireError> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| WireError::InvalidAddress(format!("{s:?}: {e}")))?;

        let bytes: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            WireError::InvalidAddress(format!(
                "expected {ADDRESS_LEN} bytes, got {}",
                v.len()
            ))
        })?;

        Ok(Self(bytes))
    }

    /// Get the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First six hex characters, for log lines and terse UIs.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..3])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Address {
        let mut bytes = [0u8; ADDRESS_LEN];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8 * 13;
        }
        Address::from_bytes(bytes)
    }

    #[test]
    fn test_hex_is_lowercase_and_40_chars() {
        let hex = sample().to_hex();
        assert_eq!(hex.len(), 40);
        assert_eq!(hex, hex.to_lowercase());
    }

    #[test]
    fn test_parse_display_roundtrip() {
        let addr = sample();
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_parse_accepts_uppercase() {
        let addr = sample();
        let parsed = Address::parse(&addr.to_hex().to_uppercase()).unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = Address::parse("abcd").unwrap_err();
        assert!(matches!(err, WireError::InvalidAddress(_)));

        let too_long = "00".repeat(ADDRESS_LEN + 1);
        assert!(Address::parse(&too_long).is_err());
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let bad = "zz".repeat(ADDRESS_LEN);
        assert!(matches!(
            Address::parse(&bad),
            Err(WireError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_short_prefix() {
        let addr = sample();
        assert_eq!(addr.short(), &addr.to_hex()[..6]);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let addr = sample();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
