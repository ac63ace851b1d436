//! Configuration hashing for change detection.
//!
//! Deterministic SHA-256 digests of the validated configuration and of
//! individual graph nodes, used to stamp artifacts and to diff graphs.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Result, WebuiError};

use super::spec::{Configuration, DeploymentContext};

/// Hasher for computing configuration and node hashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigHasher;

impl ConfigHasher {
    /// Creates a new configuration hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a hash of a configuration within its deployment context.
    ///
    /// Every field is framed with a tag byte so that an absent value and an
    /// empty one never collide.
    #[must_use]
    pub fn hash_config(&self, config: &Configuration, context: &DeploymentContext) -> String {
        let mut hasher = Sha256::new();

        hasher.update(context.stack_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(context.account.as_bytes());
        hasher.update([0u8]);
        hasher.update(context.region.as_bytes());
        hasher.update([0u8]);

        update_optional(&mut hasher, config.certificate_arn.as_deref());
        hasher.update(config.storage_backend.as_str().as_bytes());
        hasher.update([0u8]);
        update_optional(&mut hasher, config.hostname.as_deref());

        match &config.sso {
            Some(sso) => {
                hasher.update([1u8]);
                hasher.update(sso.provider_url.as_bytes());
                hasher.update([0u8]);
                hasher.update(sso.client_id.as_bytes());
                hasher.update([0u8]);
            }
            None => hasher.update([0u8]),
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a hash of any serializable value through its JSON form.
    ///
    /// Graph nodes use ordered maps, so the JSON form is stable.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has no JSON form (for example a map
    /// with non-string keys).
    pub fn hash_value<T: Serialize>(&self, value: &T) -> Result<String> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| WebuiError::internal(format!("Failed to hash value: {e}")))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }

    /// Compares two hashes to determine if they are equal.
    #[must_use]
    pub fn hashes_match(hash1: &str, hash2: &str) -> bool {
        if hash1.len() != hash2.len() {
            return false;
        }

        hash1
            .bytes()
            .zip(hash2.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Feeds an optional string with presence framing.
fn update_optional(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update([1u8]);
            hasher.update(v.as_bytes());
            hasher.update([0u8]);
        }
        None => hasher.update([0u8]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::{SsoConfig, StorageBackend};

    fn context() -> DeploymentContext {
        DeploymentContext::new("webui", "123456789012", "us-east-1")
    }

    #[test]
    fn test_config_hash_deterministic() {
        let hasher = ConfigHasher::new();
        let config = Configuration::default();

        assert_eq!(
            hasher.hash_config(&config, &context()),
            hasher.hash_config(&config, &context())
        );
    }

    #[test]
    fn test_different_configs_different_hash() {
        let hasher = ConfigHasher::new();
        let efs = Configuration::default();
        let s3 = Configuration {
            storage_backend: StorageBackend::ObjectStore,
            ..Configuration::default()
        };

        assert_ne!(
            hasher.hash_config(&efs, &context()),
            hasher.hash_config(&s3, &context())
        );
    }

    #[test]
    fn test_absent_and_empty_hostname_differ() {
        let hasher = ConfigHasher::new();
        let absent = Configuration::default();
        let empty = Configuration {
            hostname: Some(String::new()),
            ..Configuration::default()
        };

        assert_ne!(
            hasher.hash_config(&absent, &context()),
            hasher.hash_config(&empty, &context())
        );
    }

    #[test]
    fn test_sso_changes_hash() {
        let hasher = ConfigHasher::new();
        let plain = Configuration::default();
        let sso = Configuration {
            sso: Some(SsoConfig {
                provider_url: String::from("https://idp.example.com"),
                client_id: String::from("abc"),
            }),
            ..Configuration::default()
        };

        assert_ne!(
            hasher.hash_config(&plain, &context()),
            hasher.hash_config(&sso, &context())
        );
    }

    #[test]
    fn test_short_hash() {
        let hasher = ConfigHasher::new();
        let short = hasher.short_hash("abcdef1234567890abcdef1234567890");

        assert_eq!(short, "abcdef12");
    }

    #[test]
    fn test_hashes_match() {
        assert!(ConfigHasher::hashes_match("abc123", "abc123"));
        assert!(!ConfigHasher::hashes_match("abc123", "abc124"));
        assert!(!ConfigHasher::hashes_match("abc123", "abc12"));
    }

    #[test]
    fn test_hash_value_rejects_unserializable_values() {
        let hasher = ConfigHasher::new();
        let bad: std::collections::BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        assert!(hasher.hash_value(&bad).is_err());

        let a = hasher.hash_value(&vec!["a"]).unwrap();
        let b = hasher.hash_value(&vec!["b"]).unwrap();
        assert_ne!(a, b);
    }
}
