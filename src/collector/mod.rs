//! Configuration collector.
//!
//! Produces a configuration document either from command-line values or
//! from interactive prompts. Every field is checked before anything is
//! written, and failures are reported field by field rather than one at a
//! time. The collector always runs in strict mode: a certificate reference
//! is required.

mod prompt;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{ConfigDocument, ConfigValidator, Configuration, SsoDocument};
use crate::error::{CollectError, Result};

pub use prompt::{
    check_certificate, check_client_id, check_hostname, check_provider_url, interactive,
};

/// Default output path of the collector.
pub const DEFAULT_OUTPUT: &str = "webui.config.yaml";

/// Serialization format of a written document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML document.
    Yaml,
    /// JSON document.
    Json,
}

impl DocumentFormat {
    /// Picks the format from the output path: JSON for `.json`, YAML
    /// otherwise.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Raw field values gathered from flags or prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedFields {
    /// Certificate reference.
    pub acm_cert_arn: Option<String>,
    /// Custom hostname.
    pub hostname: Option<String>,
    /// Storage backend value.
    pub storage_type: Option<String>,
    /// SSO issuer URL.
    pub sso_provider_url: Option<String>,
    /// SSO client identifier.
    pub sso_client_id: Option<String>,
}

impl CollectedFields {
    /// Converts the fields into a document.
    ///
    /// The `sso` block is only emitted when at least one SSO field is set.
    #[must_use]
    pub fn into_document(self) -> ConfigDocument {
        let sso = if self.sso_provider_url.is_some() || self.sso_client_id.is_some() {
            Some(SsoDocument {
                provider_url: self.sso_provider_url,
                client_id: self.sso_client_id,
            })
        } else {
            None
        };

        ConfigDocument {
            acm_cert_arn: self.acm_cert_arn,
            storage_type: self.storage_type,
            hostname: self.hostname,
            sso,
        }
    }
}

/// Collects, checks and writes configuration documents.
#[derive(Debug, Clone)]
pub struct Collector {
    /// Validator applied to collected documents.
    validator: ConfigValidator,
    /// Destination path.
    output: PathBuf,
}

impl Collector {
    /// Creates a collector writing to `output`.
    #[must_use]
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            validator: ConfigValidator::strict(),
            output: output.into(),
        }
    }

    /// Returns the destination path.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Checks collected fields and turns them into a validated document.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::InvalidFields`] with every failing field.
    pub fn check(&self, fields: CollectedFields) -> Result<(ConfigDocument, Configuration)> {
        let document = fields.into_document();
        let report = self.validator.check_document(&document);

        for warning in report.into_result()? {
            warn!("{warning}");
        }

        let configuration = self.validator.validate(&document)?;
        Ok((configuration.to_document(), configuration))
    }

    /// Writes a document to the output path.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::WriteFailed`] if serialization or the write
    /// fails.
    pub fn write(&self, document: &ConfigDocument) -> Result<PathBuf> {
        let write_failed = |message: String| CollectError::WriteFailed {
            path: self.output.clone(),
            message,
        };

        let content = match DocumentFormat::for_path(&self.output) {
            DocumentFormat::Json => serde_json::to_string_pretty(document)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| write_failed(e.to_string()))?,
            DocumentFormat::Yaml => {
                serde_yaml::to_string(document).map_err(|e| write_failed(e.to_string()))?
            }
        };

        if let Some(parent) = self.output.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
        }
        std::fs::write(&self.output, content).map_err(|e| write_failed(e.to_string()))?;

        info!("Configuration written to {}", self.output.display());
        Ok(self.output.clone())
    }

    /// Checks the fields and writes the resulting document.
    ///
    /// Nothing is written if any field fails.
    ///
    /// # Errors
    ///
    /// See [`Collector::check`] and [`Collector::write`].
    pub fn collect(&self, fields: CollectedFields) -> Result<Configuration> {
        let (document, configuration) = self.check(fields)?;
        self.write(&document)?;
        Ok(configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigParser, StorageBackend};
    use crate::error::WebuiError;
    use tempfile::TempDir;

    const ARN: &str =
        "arn:aws:acm:eu-west-1:123456789012:certificate/abcd1234-ab12-cd34-ef56-abcdef123456";

    fn fields() -> CollectedFields {
        CollectedFields {
            acm_cert_arn: Some(ARN.to_string()),
            hostname: Some(String::from("chat.example.com")),
            storage_type: Some(String::from("s3")),
            sso_provider_url: Some(String::from("https://login.example.com")),
            sso_client_id: Some(String::from("webui")),
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::for_path(Path::new("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::for_path(Path::new("a.JSON")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::for_path(Path::new("a.yaml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::for_path(Path::new("a")), DocumentFormat::Yaml);
    }

    #[test]
    fn test_written_yaml_loads_back_equal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("webui.config.yaml");
        let collector = Collector::new(&path);

        let configuration = collector.collect(fields()).unwrap();
        let loaded = ConfigParser::new()
            .load(Some(path.as_path()), &ConfigValidator::strict())
            .unwrap();
        assert_eq!(loaded, configuration);
        assert_eq!(loaded.storage_backend, StorageBackend::ObjectStore);
    }

    #[test]
    fn test_written_json_loads_back_equal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out").join("webui.config.json");
        let collector = Collector::new(&path);

        let configuration = collector.collect(fields()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["storage_type"], "s3");

        let loaded = ConfigParser::new()
            .load(Some(path.as_path()), &ConfigValidator::new())
            .unwrap();
        assert_eq!(loaded, configuration);
    }

    #[test]
    fn test_storage_type_written_explicitly() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("webui.config.yaml");
        let collector = Collector::new(&path);

        let minimal = CollectedFields {
            acm_cert_arn: Some(ARN.to_string()),
            ..CollectedFields::default()
        };
        collector.collect(minimal).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("storage_type: efs"));
        assert!(!content.contains("sso"));
    }

    #[test]
    fn test_failures_reported_field_by_field() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("webui.config.yaml");
        let collector = Collector::new(&path);

        let bad = CollectedFields {
            acm_cert_arn: Some(String::from("not-an-arn")),
            hostname: Some(String::from("not a host")),
            storage_type: Some(String::from("gcs")),
            sso_provider_url: Some(String::from("http://insecure.example.com")),
            sso_client_id: Some(String::from("client")),
        };
        let err = collector.collect(bad).unwrap_err();
        let fields: Vec<&str> = err.field_failures().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["acm_cert_arn", "storage_type", "hostname", "sso.provider_url"]
        );
        assert!(!path.exists());
    }

    #[test]
    fn test_certificate_required() {
        let temp = TempDir::new().unwrap();
        let collector = Collector::new(temp.path().join("webui.config.yaml"));

        let err = collector.check(CollectedFields::default()).unwrap_err();
        assert!(matches!(err, WebuiError::Collect(CollectError::InvalidFields { .. })));
        assert_eq!(err.field_failures()[0].field, "acm_cert_arn");
    }

    #[test]
    fn test_incomplete_sso_rejected() {
        let temp = TempDir::new().unwrap();
        let collector = Collector::new(temp.path().join("webui.config.yaml"));

        let half = CollectedFields {
            acm_cert_arn: Some(ARN.to_string()),
            sso_client_id: Some(String::from("webui")),
            ..CollectedFields::default()
        };
        let err = collector.check(half).unwrap_err();
        assert_eq!(err.field_failures()[0].field, "sso.provider_url");
    }
}
