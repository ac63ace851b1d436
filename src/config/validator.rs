//! Configuration validation.
//!
//! Turns a raw [`ConfigDocument`] into a [`Configuration`]. Two entry points
//! share the same per-field rules:
//!
//! - [`ConfigValidator::validate`] is the loader path: fail-fast, returns the
//!   first [`ConfigError`], and only warns about suspicious but usable values.
//! - [`ConfigValidator::check_document`] is the collector path: it gathers every
//!   failure field by field and treats shape problems (non-ARN certificate,
//!   bad hostname, non-https issuer) as errors.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{CollectError, ConfigError, FieldFailure, Result};

use super::spec::{ConfigDocument, Configuration, SsoConfig, SsoDocument, StorageBackend};

/// Pattern for ACM certificate ARNs.
static CERTIFICATE_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws[a-z-]*:acm:[a-z0-9-]+:\d{12}:certificate/[A-Za-z0-9-]+$")
        .expect("certificate ARN pattern is valid")
});

/// Pattern for fully-qualified DNS names.
static DNS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$")
        .expect("DNS name pattern is valid")
});

/// Pattern for https URLs.
static HTTPS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://[^\s/?#]+(/[^\s]*)?$").expect("https URL pattern is valid")
});

/// Maximum length of a DNS name.
const MAX_DNS_NAME_LEN: usize = 253;

/// Validator for configuration documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigValidator {
    /// Whether a certificate reference is mandatory.
    require_certificate: bool,
}

/// Aggregated validation outcome used by the collector.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Field-level errors.
    pub errors: Vec<FieldFailure>,
    /// Non-fatal observations.
    pub warnings: Vec<String>,
}

impl ConfigValidator {
    /// Creates a validator where the certificate is optional.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            require_certificate: false,
        }
    }

    /// Creates a validator that requires a certificate reference.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            require_certificate: true,
        }
    }

    /// Sets whether a certificate reference is mandatory.
    #[must_use]
    pub const fn with_required_certificate(mut self, required: bool) -> Self {
        self.require_certificate = required;
        self
    }

    /// Validates a document and returns the defaulted configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(&self, doc: &ConfigDocument) -> Result<Configuration> {
        let certificate_arn = self.resolve_certificate(doc.acm_cert_arn.as_deref())?;
        if let Some(arn) = &certificate_arn
            && !is_certificate_arn(arn)
        {
            warn!("acm_cert_arn '{arn}' does not look like an ACM certificate ARN");
        }

        let storage_backend = resolve_storage(doc.storage_type.as_deref())?;

        let hostname = normalize(doc.hostname.as_deref());
        if let Some(host) = &hostname
            && !is_hostname(host)
        {
            warn!("hostname '{host}' is not a valid DNS name");
        }

        let sso = resolve_sso(doc.sso.as_ref())?;

        debug!(
            "Configuration valid: storage={storage_backend}, certificate={}, hostname={}, sso={}",
            certificate_arn.is_some(),
            hostname.is_some(),
            sso.is_some()
        );

        Ok(Configuration {
            certificate_arn,
            storage_backend,
            hostname,
            sso,
        })
    }

    /// Checks every field and reports all failures at once.
    #[must_use]
    pub fn check_document(&self, doc: &ConfigDocument) -> ValidationReport {
        let mut report = ValidationReport::default();

        match self.resolve_certificate(doc.acm_cert_arn.as_deref()) {
            Ok(Some(arn)) if !is_certificate_arn(&arn) => report.errors.push(FieldFailure::new(
                "acm_cert_arn",
                format!(
                    "'{arn}' must match arn:aws:acm:<region>:<account-id>:certificate/<certificate-id>"
                ),
            )),
            Ok(_) => {}
            Err(e) => report.push_config_error(&e),
        }

        if let Err(e) = resolve_storage(doc.storage_type.as_deref()) {
            report.push_config_error(&e);
        }

        if let Some(host) = normalize(doc.hostname.as_deref())
            && !is_hostname(&host)
        {
            report.errors.push(FieldFailure::new(
                "hostname",
                format!("'{host}' is not a valid DNS name"),
            ));
        }

        match resolve_sso(doc.sso.as_ref()) {
            Ok(Some(sso)) if !is_https_url(&sso.provider_url) => {
                report.errors.push(FieldFailure::new(
                    "sso.provider_url",
                    format!("'{}' must be an https:// URL", sso.provider_url),
                ));
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                if doc.sso.is_some() {
                    report
                        .warnings
                        .push(String::from("sso block is empty and will be ignored"));
                }
            }
            Err(e) => report.push_config_error(&e),
        }

        if doc.hostname.is_some() && doc.acm_cert_arn.is_none() {
            report.warnings.push(String::from(
                "hostname is set without acm_cert_arn; the edge distribution will not serve it over TLS",
            ));
        }

        report
    }

    /// Resolves the certificate field, enforcing presence in strict mode.
    fn resolve_certificate(
        &self,
        value: Option<&str>,
    ) -> std::result::Result<Option<String>, ConfigError> {
        let arn = normalize(value);
        if arn.is_none() && self.require_certificate {
            return Err(ConfigError::missing("acm_cert_arn"));
        }
        Ok(arn)
    }
}

impl ValidationReport {
    /// Returns true if no errors were found.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turns the report into a result, keeping the warnings on success.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::InvalidFields`] with every failing field.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.is_valid() {
            Ok(self.warnings)
        } else {
            Err(CollectError::InvalidFields {
                failures: self.errors,
            }
            .into())
        }
    }

    /// Records a loader error as a field failure.
    fn push_config_error(&mut self, err: &ConfigError) {
        let field = match err {
            ConfigError::MissingField { field } | ConfigError::InvalidEnum { field, .. } => {
                field.clone()
            }
            ConfigError::IncompleteSso { missing, .. } => format!("sso.{missing}"),
            ConfigError::NotFound { .. } | ConfigError::Malformed { .. } => String::from("document"),
        };
        self.errors.push(FieldFailure::new(field, err.to_string()));
    }
}

/// Resolves `storage_type`, applying the only silent default.
fn resolve_storage(value: Option<&str>) -> std::result::Result<StorageBackend, ConfigError> {
    let Some(raw) = value else {
        return Ok(StorageBackend::default());
    };

    StorageBackend::from_document_value(raw).ok_or_else(|| ConfigError::InvalidEnum {
        field: String::from("storage_type"),
        value: raw.to_string(),
        expected: StorageBackend::ACCEPTED.join(", "),
    })
}

/// Resolves the `sso` block; both fields or neither.
fn resolve_sso(sso: Option<&SsoDocument>) -> std::result::Result<Option<SsoConfig>, ConfigError> {
    let Some(sso) = sso else {
        return Ok(None);
    };

    match (
        normalize(sso.provider_url.as_deref()),
        normalize(sso.client_id.as_deref()),
    ) {
        (Some(provider_url), Some(client_id)) => Ok(Some(SsoConfig {
            provider_url,
            client_id,
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::IncompleteSso {
            present: String::from("provider_url"),
            missing: String::from("client_id"),
        }),
        (None, Some(_)) => Err(ConfigError::IncompleteSso {
            present: String::from("client_id"),
            missing: String::from("provider_url"),
        }),
    }
}

/// Trims a value and treats empty strings as absent.
fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Returns true if the value is shaped like an ACM certificate ARN.
#[must_use]
pub fn is_certificate_arn(value: &str) -> bool {
    CERTIFICATE_ARN.is_match(value)
}

/// Returns true if the value is a fully-qualified DNS name.
#[must_use]
pub fn is_hostname(value: &str) -> bool {
    value.len() <= MAX_DNS_NAME_LEN && DNS_NAME.is_match(value)
}

/// Returns true if the value is an https URL.
#[must_use]
pub fn is_https_url(value: &str) -> bool {
    HTTPS_URL.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WebuiError;

    const ARN: &str =
        "arn:aws:acm:us-east-1:123456789012:certificate/0f3c1a2b-1234-4cde-9abc-0123456789ab";

    fn sso_doc(provider_url: Option<&str>, client_id: Option<&str>) -> Option<SsoDocument> {
        Some(SsoDocument {
            provider_url: provider_url.map(String::from),
            client_id: client_id.map(String::from),
        })
    }

    #[test]
    fn test_empty_document_defaults() {
        let config = ConfigValidator::new()
            .validate(&ConfigDocument::default())
            .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::SharedFilesystem);
        assert!(config.certificate_arn.is_none());
        assert!(config.hostname.is_none());
        assert!(config.sso.is_none());
    }

    #[test]
    fn test_invalid_storage_type() {
        let doc = ConfigDocument {
            storage_type: Some(String::from("blob")),
            ..ConfigDocument::default()
        };
        let err = ConfigValidator::new().validate(&doc).unwrap_err();
        assert!(matches!(
            err,
            WebuiError::Config(ConfigError::InvalidEnum { ref value, .. }) if value == "blob"
        ));
    }

    #[test]
    fn test_incomplete_sso_missing_client_id() {
        let doc = ConfigDocument {
            sso: sso_doc(Some("https://idp.example.com"), None),
            ..ConfigDocument::default()
        };
        let err = ConfigValidator::new().validate(&doc).unwrap_err();
        assert!(matches!(
            err,
            WebuiError::Config(ConfigError::IncompleteSso { ref missing, .. }) if missing == "client_id"
        ));
    }

    #[test]
    fn test_incomplete_sso_blank_provider_url() {
        let doc = ConfigDocument {
            sso: sso_doc(Some("   "), Some("abc")),
            ..ConfigDocument::default()
        };
        let err = ConfigValidator::new().validate(&doc).unwrap_err();
        assert!(matches!(
            err,
            WebuiError::Config(ConfigError::IncompleteSso { ref missing, .. }) if missing == "provider_url"
        ));
    }

    #[test]
    fn test_strict_requires_certificate() {
        let err = ConfigValidator::strict()
            .validate(&ConfigDocument::default())
            .unwrap_err();
        assert!(matches!(
            err,
            WebuiError::Config(ConfigError::MissingField { ref field }) if field == "acm_cert_arn"
        ));
    }

    #[test]
    fn test_full_document() {
        let doc = ConfigDocument {
            acm_cert_arn: Some(ARN.to_string()),
            storage_type: Some(String::from("s3")),
            hostname: Some(String::from("chat.example.com")),
            sso: sso_doc(Some("https://idp.example.com"), Some("abc")),
        };
        let config = ConfigValidator::strict().validate(&doc).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::ObjectStore);
        assert_eq!(config.certificate_arn.as_deref(), Some(ARN));
        assert_eq!(config.sso.unwrap().client_id, "abc");
    }

    #[test]
    fn test_check_document_reports_every_field() {
        let doc = ConfigDocument {
            acm_cert_arn: Some(String::from("not-an-arn")),
            storage_type: Some(String::from("blob")),
            hostname: Some(String::from("bad host")),
            sso: sso_doc(Some("https://idp.example.com"), None),
        };
        let report = ConfigValidator::strict().check_document(&doc);
        let fields: Vec<&str> = report.errors.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["acm_cert_arn", "storage_type", "hostname", "sso.client_id"]
        );
        assert!(!report.is_valid());
    }

    #[test]
    fn test_report_with_failures_is_an_error() {
        let doc = ConfigDocument {
            acm_cert_arn: Some(String::from("not-an-arn")),
            sso: sso_doc(Some("http://idp.example.com"), Some("abc")),
            ..ConfigDocument::default()
        };
        let validator = ConfigValidator::new();
        assert!(validator.validate(&doc).is_ok());

        let err = validator.check_document(&doc).into_result().unwrap_err();
        let fields: Vec<&str> = err.field_failures().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["acm_cert_arn", "sso.provider_url"]);
    }

    #[test]
    fn test_clean_report_keeps_warnings() {
        let doc = ConfigDocument {
            hostname: Some(String::from("chat.example.com")),
            ..ConfigDocument::default()
        };
        let warnings = ConfigValidator::new()
            .check_document(&doc)
            .into_result()
            .unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_storage_type_matching_is_exact() {
        for value in [" s3 ", "S3", "efs\n"] {
            let doc = ConfigDocument {
                storage_type: Some(value.to_string()),
                ..ConfigDocument::default()
            };
            let err = ConfigValidator::new().validate(&doc).unwrap_err();
            assert!(matches!(
                err,
                WebuiError::Config(ConfigError::InvalidEnum { .. })
            ));
        }
    }

    #[test]
    fn test_check_document_rejects_plain_http_issuer() {
        let doc = ConfigDocument {
            acm_cert_arn: Some(ARN.to_string()),
            sso: sso_doc(Some("http://idp.example.com"), Some("abc")),
            ..ConfigDocument::default()
        };
        let report = ConfigValidator::strict().check_document(&doc);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].field, "sso.provider_url");
    }

    #[test]
    fn test_shape_rules() {
        assert!(is_certificate_arn(ARN));
        assert!(!is_certificate_arn("arn:aws:acm:us-east-1:123:certificate/x"));
        assert!(is_hostname("chat.example.com"));
        assert!(!is_hostname("localhost"));
        assert!(!is_hostname("-bad.example.com"));
        assert!(is_https_url("https://idp.example.com/realms/main"));
        assert!(!is_https_url("http://idp.example.com"));
    }
}
