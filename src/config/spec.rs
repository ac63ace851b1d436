//! Configuration document and typed configuration for the topology synthesizer.
//!
//! Two layers live here. [`ConfigDocument`] maps one-to-one onto the on-disk
//! document and keeps every field optional so the validator can report exactly
//! which field is wrong. [`Configuration`] is the validated, fully-defaulted
//! value the synthesizer consumes.

use serde::{Deserialize, Serialize};

/// Default stack name used when none is supplied.
pub const DEFAULT_STACK_NAME: &str = "webui";

/// The on-disk configuration document, exactly as written by the collector.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigDocument {
    /// Certificate reference (an ACM ARN).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acm_cert_arn: Option<String>,
    /// Storage backend name (`efs` or `s3`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    /// Custom hostname for the edge distribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Single-sign-on block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso: Option<SsoDocument>,
}

/// The `sso` block of the configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SsoDocument {
    /// OIDC issuer URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_url: Option<String>,
    /// OIDC client identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Storage backend options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum StorageBackend {
    /// Shared POSIX filesystem with per-service access points.
    #[default]
    #[serde(rename = "efs")]
    SharedFilesystem,
    /// Object bucket addressed through environment variables.
    #[serde(rename = "s3")]
    ObjectStore,
}

/// Validated single-sign-on parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SsoConfig {
    /// OIDC issuer URL.
    pub provider_url: String,
    /// OIDC client identifier.
    pub client_id: String,
}

/// A validated deployment request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Configuration {
    /// Certificate reference; its presence gates the TLS listeners.
    pub certificate_arn: Option<String>,
    /// Active storage backend.
    pub storage_backend: StorageBackend,
    /// Custom hostname bound to the edge distribution.
    pub hostname: Option<String>,
    /// Single-sign-on parameters.
    pub sso: Option<SsoConfig>,
}

/// Account and region context for one synthesis.
///
/// Passed explicitly into the synthesizer instead of being read from the
/// process environment at synthesis time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DeploymentContext {
    /// Stack name, used as the prefix of every physical name.
    pub stack_name: String,
    /// Target account identifier.
    pub account: String,
    /// Target region.
    pub region: String,
}

impl StorageBackend {
    /// Values accepted for `storage_type` in the document.
    pub const ACCEPTED: &'static [&'static str] = &["efs", "s3"];

    /// Returns the document value for this backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SharedFilesystem => "efs",
            Self::ObjectStore => "s3",
        }
    }

    /// Parses a document value. Matching is exact.
    #[must_use]
    pub fn from_document_value(value: &str) -> Option<Self> {
        match value {
            "efs" => Some(Self::SharedFilesystem),
            "s3" => Some(Self::ObjectStore),
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Configuration {
    /// Returns true if a certificate reference is configured.
    #[must_use]
    pub const fn has_certificate(&self) -> bool {
        self.certificate_arn.is_some()
    }

    /// Returns true if single-sign-on is configured.
    #[must_use]
    pub const fn sso_enabled(&self) -> bool {
        self.sso.is_some()
    }

    /// Converts back into the document form written by the collector.
    ///
    /// The storage backend is always written out explicitly.
    #[must_use]
    pub fn to_document(&self) -> ConfigDocument {
        ConfigDocument {
            acm_cert_arn: self.certificate_arn.clone(),
            storage_type: Some(self.storage_backend.as_str().to_string()),
            hostname: self.hostname.clone(),
            sso: self.sso.as_ref().map(|sso| SsoDocument {
                provider_url: Some(sso.provider_url.clone()),
                client_id: Some(sso.client_id.clone()),
            }),
        }
    }
}

impl DeploymentContext {
    /// Creates a new deployment context.
    #[must_use]
    pub fn new(
        stack_name: impl Into<String>,
        account: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            stack_name: stack_name.into(),
            account: account.into(),
            region: region.into(),
        }
    }

    /// Returns a physical resource name scoped to this stack.
    #[must_use]
    pub fn physical_name(&self, suffix: &str) -> String {
        format!("{}-{suffix}", self.stack_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_document_values() {
        assert_eq!(
            StorageBackend::from_document_value("efs"),
            Some(StorageBackend::SharedFilesystem)
        );
        assert_eq!(
            StorageBackend::from_document_value("s3"),
            Some(StorageBackend::ObjectStore)
        );
        assert_eq!(StorageBackend::from_document_value("S3"), None);
        assert_eq!(StorageBackend::from_document_value("blob"), None);
    }

    #[test]
    fn test_default_backend_is_shared_filesystem() {
        assert_eq!(StorageBackend::default(), StorageBackend::SharedFilesystem);
        assert_eq!(Configuration::default().storage_backend.as_str(), "efs");
    }

    #[test]
    fn test_to_document_writes_storage_type() {
        let config = Configuration {
            storage_backend: StorageBackend::ObjectStore,
            ..Configuration::default()
        };
        let doc = config.to_document();
        assert_eq!(doc.storage_type.as_deref(), Some("s3"));
        assert!(doc.acm_cert_arn.is_none());
        assert!(doc.sso.is_none());
    }

    #[test]
    fn test_physical_name() {
        let ctx = DeploymentContext::new("chat", "123456789012", "us-east-1");
        assert_eq!(ctx.physical_name("cluster"), "chat-cluster");
    }
}
