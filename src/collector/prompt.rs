//! Interactive prompts.
//!
//! Each prompt applies the same rule the document check applies, so an
//! answer that would fail later is rejected while the operator is still at
//! the prompt.

use dialoguer::{Confirm, Input, Select};

use crate::config::{is_certificate_arn, is_hostname, is_https_url, StorageBackend};
use crate::error::{CollectError, Result};

use super::CollectedFields;

/// Storage choices shown to the operator, in [`StorageBackend::ACCEPTED`] order.
const STORAGE_CHOICES: &[&str] = &[
    "efs - shared filesystem mounted into both containers",
    "s3  - object bucket configured through environment variables",
];

/// Checks a certificate answer.
///
/// # Errors
///
/// Returns the message shown to the operator.
pub fn check_certificate(value: &str) -> std::result::Result<(), String> {
    if is_certificate_arn(value.trim()) {
        Ok(())
    } else {
        Err(String::from(
            "expected arn:aws:acm:<region>:<account-id>:certificate/<certificate-id>",
        ))
    }
}

/// Checks an optional hostname answer. Empty means no custom hostname.
///
/// # Errors
///
/// Returns the message shown to the operator.
pub fn check_hostname(value: &str) -> std::result::Result<(), String> {
    let value = value.trim();
    if value.is_empty() || is_hostname(value) {
        Ok(())
    } else {
        Err(format!("'{value}' is not a valid DNS name"))
    }
}

/// Checks an SSO issuer URL answer.
///
/// # Errors
///
/// Returns the message shown to the operator.
pub fn check_provider_url(value: &str) -> std::result::Result<(), String> {
    if is_https_url(value.trim()) {
        Ok(())
    } else {
        Err(String::from("the issuer URL must start with https://"))
    }
}

/// Checks an SSO client identifier answer.
///
/// # Errors
///
/// Returns the message shown to the operator.
pub fn check_client_id(value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        Err(String::from("the client identifier cannot be empty"))
    } else {
        Ok(())
    }
}

/// Runs the interactive prompts and returns the collected fields.
///
/// # Errors
///
/// Returns [`CollectError::PromptFailed`] if the terminal interaction fails
/// or is aborted.
pub fn interactive() -> Result<CollectedFields> {
    let acm_cert_arn: String = Input::new()
        .with_prompt("ACM certificate ARN")
        .validate_with(|v: &String| check_certificate(v))
        .interact_text()
        .map_err(prompt_failed)?;

    let hostname: String = Input::new()
        .with_prompt("Custom hostname (empty for none)")
        .allow_empty(true)
        .validate_with(|v: &String| check_hostname(v))
        .interact_text()
        .map_err(prompt_failed)?;

    let storage = Select::new()
        .with_prompt("Storage backend")
        .items(STORAGE_CHOICES)
        .default(0)
        .interact()
        .map_err(prompt_failed)?;
    let storage_type = StorageBackend::ACCEPTED
        .get(storage)
        .map(|s| (*s).to_string());

    let enable_sso = Confirm::new()
        .with_prompt("Enable single sign-on?")
        .default(false)
        .interact()
        .map_err(prompt_failed)?;

    let (sso_provider_url, sso_client_id) = if enable_sso {
        let provider_url: String = Input::new()
            .with_prompt("SSO issuer URL")
            .validate_with(|v: &String| check_provider_url(v))
            .interact_text()
            .map_err(prompt_failed)?;
        let client_id: String = Input::new()
            .with_prompt("SSO client ID")
            .validate_with(|v: &String| check_client_id(v))
            .interact_text()
            .map_err(prompt_failed)?;
        (Some(provider_url), Some(client_id))
    } else {
        (None, None)
    };

    Ok(CollectedFields {
        acm_cert_arn: Some(acm_cert_arn.trim().to_string()),
        hostname: non_empty(&hostname),
        storage_type,
        sso_provider_url: sso_provider_url.as_deref().and_then(non_empty),
        sso_client_id: sso_client_id.as_deref().and_then(non_empty),
    })
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn prompt_failed(err: dialoguer::Error) -> crate::error::WebuiError {
    CollectError::PromptFailed {
        message: err.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_check() {
        assert!(check_certificate(
            "arn:aws:acm:us-east-1:123456789012:certificate/12345678-1234-1234-1234-123456789012"
        )
        .is_ok());
        assert!(check_certificate("arn:aws:iam::123456789012:role/x").is_err());
        assert!(check_certificate("").is_err());
    }

    #[test]
    fn test_hostname_check_allows_empty() {
        assert!(check_hostname("").is_ok());
        assert!(check_hostname("chat.example.com").is_ok());
        assert!(check_hostname("bad host").is_err());
    }

    #[test]
    fn test_provider_url_check() {
        assert!(check_provider_url("https://login.example.com/realms/main").is_ok());
        assert!(check_provider_url("http://login.example.com").is_err());
    }

    #[test]
    fn test_client_id_check() {
        assert!(check_client_id("webui").is_ok());
        assert!(check_client_id("   ").is_err());
    }

    #[test]
    fn test_storage_choices_cover_accepted_values() {
        assert_eq!(STORAGE_CHOICES.len(), StorageBackend::ACCEPTED.len());
        for (choice, value) in STORAGE_CHOICES.iter().zip(StorageBackend::ACCEPTED) {
            assert!(choice.starts_with(value));
        }
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" a.example.com "), Some(String::from("a.example.com")));
    }
}
