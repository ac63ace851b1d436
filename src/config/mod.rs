//! Configuration module for the topology synthesizer.
//!
//! This module handles all configuration-related functionality:
//! - Parsing `webui.config.yaml` (or JSON) into a raw document
//! - Validating the document into a typed [`Configuration`]
//! - Resolving the explicit deployment context
//! - Computing hashes for change detection

mod spec;
mod parser;
mod validator;
mod hash;

pub use spec::{
    ConfigDocument, Configuration, DeploymentContext, SsoConfig, SsoDocument, StorageBackend,
    DEFAULT_STACK_NAME,
};
pub use parser::{ConfigParser, DEFAULT_CONFIG_FILES, find_config_file};
pub use validator::{ConfigValidator, ValidationReport, is_certificate_arn, is_hostname, is_https_url};
pub use hash::ConfigHasher;
