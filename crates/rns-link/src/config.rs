//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default upper bound on a single application payload (64 KiB).
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 64 * 1024;

/// Tunables for an [`Engine`](crate::Engine).
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Require the key sealed inside a LINK_PROOF to equal the key the proof
    /// carries in the clear.
    pub verify_proof_identity: bool,

    /// Accept a LINK_PROOF from a handle with no outstanding `connect`.
    pub accept_unsolicited_proofs: bool,

    /// Largest payload `send_message` will seal.
    pub max_payload_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verify_proof_identity: true,
            accept_unsolicited_proofs: true,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"accept_unsolicited_proofs": false}"#).unwrap();

        assert!(!config.accept_unsolicited_proofs);
        assert!(config.verify_proof_identity);
        assert_eq!(config.max_payload_len, DEFAULT_MAX_PAYLOAD_LEN);
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
