//! Configuration parser for loading configuration documents.
//!
//! This module resolves the document location, reads and parses it, and
//! resolves the deployment context (stack, account, region) that is threaded
//! explicitly into synthesis.

use crate::error::{ConfigError, Result, WebuiError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::spec::{ConfigDocument, Configuration, DeploymentContext, DEFAULT_STACK_NAME};
use super::validator::ConfigValidator;

/// Default configuration file names to search for, in order.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "webui.config.yaml",
    "webui.config.yml",
    "webui.config.json",
];

/// Environment variables consulted for the account, in order.
const ACCOUNT_VARS: &[&str] = &["CDK_DEFAULT_ACCOUNT", "AWS_ACCOUNT_ID"];

/// Environment variables consulted for the region, in order.
const REGION_VARS: &[&str] = &["CDK_DEFAULT_REGION", "AWS_REGION", "AWS_DEFAULT_REGION"];

/// Configuration parser for loading deployment configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths and `.env`.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads and validates a configuration.
    ///
    /// With no explicit path the default file names are searched from the
    /// base path (or the working directory) upwards.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn load(&self, path: Option<&Path>, validator: &ConfigValidator) -> Result<Configuration> {
        let path = match path {
            Some(p) => self.resolve(p),
            None => find_config_file(self.base_path.as_deref().unwrap_or_else(|| Path::new(".")))?,
        };

        let document = self.load_file(&path)?;
        validator.validate(&document)
    }

    /// Loads a configuration document from a file without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ConfigDocument> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.is_file() {
            return Err(WebuiError::Config(ConfigError::NotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            WebuiError::Config(ConfigError::malformed(
                format!("Failed to read file: {e}"),
                Some(path.display().to_string()),
            ))
        })?;

        self.parse_document(&content, Some(path))
    }

    /// Parses a configuration document from YAML or JSON text.
    ///
    /// Unknown keys are reported as warnings and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a structured document.
    pub fn parse_document(&self, content: &str, source: Option<&Path>) -> Result<ConfigDocument> {
        debug!("Parsing configuration document");

        if content.trim().is_empty() {
            debug!("Configuration document is empty, using defaults");
            return Ok(ConfigDocument::default());
        }

        let mut unknown_keys = Vec::new();
        let deserializer = serde_yaml::Deserializer::from_str(content);
        let document: ConfigDocument = serde_ignored::deserialize(deserializer, |path| {
            unknown_keys.push(path.to_string());
        })
        .map_err(|e| {
            WebuiError::Config(ConfigError::malformed(
                format!("Document parse error: {e}"),
                source.map(|p| p.display().to_string()),
            ))
        })?;

        for key in &unknown_keys {
            warn!("Ignoring unknown configuration key: {key}");
        }

        Ok(document)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                WebuiError::Config(ConfigError::malformed(
                    format!("Failed to load .env file: {e}"),
                    Some(env_path.display().to_string()),
                ))
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Resolves the deployment context.
    ///
    /// Explicit values win; otherwise the usual account and region
    /// environment variables are consulted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if the account or region cannot
    /// be resolved.
    pub fn resolve_context(
        stack_name: Option<&str>,
        account: Option<&str>,
        region: Option<&str>,
    ) -> Result<DeploymentContext> {
        let stack_name = stack_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STACK_NAME);

        let account = explicit_or_env(account, ACCOUNT_VARS)
            .ok_or_else(|| WebuiError::Config(ConfigError::missing("account")))?;
        let region = explicit_or_env(region, REGION_VARS)
            .ok_or_else(|| WebuiError::Config(ConfigError::missing("region")))?;

        debug!("Deployment context: stack={stack_name}, account={account}, region={region}");
        Ok(DeploymentContext::new(stack_name, account, region))
    }

    /// Resolves a possibly relative path against the base path.
    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Returns the explicit value, or the first non-empty environment variable.
fn explicit_or_env(explicit: Option<&str>, vars: &[&str]) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .or_else(|| {
            vars.iter()
                .filter_map(|var| std::env::var(var).ok())
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        })
}

/// Finds the configuration file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.is_file() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(WebuiError::Config(ConfigError::NotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::StorageBackend;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_document() {
        let parser = ConfigParser::new();
        let doc = parser.parse_document("storage_type: s3\n", None).unwrap();

        assert_eq!(doc.storage_type.as_deref(), Some("s3"));
        assert!(doc.sso.is_none());
    }

    #[test]
    fn test_parse_json_document() {
        let json = r#"{
  "acm_cert_arn": "arn:aws:acm:us-east-1:123456789012:certificate/abc-123",
  "storage_type": "efs",
  "hostname": "chat.example.com",
  "sso": { "provider_url": "https://idp.example.com", "client_id": "abc" }
}"#;
        let parser = ConfigParser::new();
        let doc = parser.parse_document(json, None).unwrap();

        assert_eq!(doc.hostname.as_deref(), Some("chat.example.com"));
        assert_eq!(
            doc.sso.and_then(|s| s.client_id).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let yaml = r"
storage_type: efs
region_override: eu-west-1
";
        let doc = ConfigParser::new().parse_document(yaml, None).unwrap();
        assert_eq!(doc.storage_type.as_deref(), Some("efs"));
    }

    #[test]
    fn test_malformed_document() {
        let err = ConfigParser::new()
            .parse_document("storage_type: [efs", None)
            .unwrap_err();
        assert!(matches!(err, WebuiError::Config(ConfigError::Malformed { .. })));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let err = ConfigParser::new()
            .parse_document("- just\n- a\n- list\n", None)
            .unwrap_err();
        assert!(matches!(err, WebuiError::Config(ConfigError::Malformed { .. })));
    }

    #[test]
    fn test_empty_document_is_default() {
        let doc = ConfigParser::new().parse_document("  \n", None).unwrap();
        assert_eq!(doc, ConfigDocument::default());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let parser = ConfigParser::new();
        let err = parser.load_file(temp.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, WebuiError::Config(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_load_from_default_location() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("webui.config.yaml"), "storage_type: s3\n").unwrap();

        let nested = temp.path().join("deploy");
        std::fs::create_dir_all(&nested).unwrap();

        let config = ConfigParser::new()
            .with_base_path(&nested)
            .load(None, &ConfigValidator::new())
            .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::ObjectStore);
    }

    #[test]
    fn test_find_config_file_not_found() {
        let temp = TempDir::new().unwrap();
        let err = find_config_file(temp.path()).unwrap_err();
        assert!(matches!(err, WebuiError::Config(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_resolve_context_explicit_values() {
        let ctx = ConfigParser::resolve_context(Some("chat"), Some("123456789012"), Some("eu-west-1"))
            .unwrap();
        assert_eq!(ctx.stack_name, "chat");
        assert_eq!(ctx.account, "123456789012");
        assert_eq!(ctx.region, "eu-west-1");
    }

    #[test]
    fn test_resolve_context_default_stack_name() {
        let ctx = ConfigParser::resolve_context(None, Some("123456789012"), Some("us-east-1"))
            .unwrap();
        assert_eq!(ctx.stack_name, DEFAULT_STACK_NAME);
    }
}
