//! S3-based artifact store.
//!
//! Lets a realization backend running elsewhere pick the graph up. The
//! artifact for a stack lives at `<prefix>/<stack>.json` in the bucket.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{ArtifactError, Result, WebuiError};

use super::store::{decode, encode, ArtifactStore};
use super::types::SynthArtifact;

/// S3-based artifact store.
#[derive(Debug)]
pub struct S3ArtifactStore {
    /// S3 client.
    client: Client,
    /// Bucket name.
    bucket: String,
    /// Object key of this stack's artifact.
    key: String,
}

impl S3ArtifactStore {
    /// Creates a store using credentials from the environment.
    pub async fn new(bucket: &str, prefix: Option<&str>, region: Option<&str>, stack: &str) -> Self {
        let config = if let Some(region) = region {
            aws_config::from_env()
                .region(aws_config::Region::new(region.to_string()))
                .load()
                .await
        } else {
            aws_config::load_from_env().await
        };

        Self::with_client(Client::new(&config), bucket, prefix, stack)
    }

    /// Creates a store with an existing client.
    #[must_use]
    pub fn with_client(client: Client, bucket: &str, prefix: Option<&str>, stack: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            key: object_key(prefix, stack),
        }
    }
}

/// Builds the object key for a stack under an optional prefix.
fn object_key(prefix: Option<&str>, stack: &str) -> String {
    let prefix = prefix.map(|p| p.trim_matches('/')).unwrap_or_default();
    if prefix.is_empty() {
        format!("{stack}.json")
    } else {
        format!("{prefix}/{stack}.json")
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn load(&self) -> Result<Option<SynthArtifact>> {
        debug!("Loading artifact from s3://{}/{}", self.bucket, self.key);

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_no_such_key() {
                    debug!("No artifact in S3");
                    return Ok(None);
                }
                return Err(ArtifactError::s3(format!("S3 get error: {service_err}")).into());
            }
        };

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| ArtifactError::s3(format!("Failed to read S3 object: {e}")))?;
        let content = String::from_utf8(bytes.to_vec()).map_err(|e| {
            WebuiError::Artifact(ArtifactError::Corrupted {
                message: format!("Invalid UTF-8 in S3 object: {e}"),
            })
        })?;

        let artifact = decode(&content)?;
        info!(
            "Loaded artifact {} for stack {}",
            artifact.short_run_id(),
            artifact.context.stack_name
        );
        Ok(Some(artifact))
    }

    async fn save(&self, artifact: &SynthArtifact) -> Result<()> {
        info!("Saving artifact to s3://{}/{}", self.bucket, self.key);
        let content = encode(artifact)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(content.into_bytes().into())
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| ArtifactError::s3(format!("S3 put error: {e}")))?;

        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        info!("Deleting artifact s3://{}/{}", self.bucket, self.key);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await
            .map_err(|e| ArtifactError::s3(format!("S3 delete error: {e}")))?;
        Ok(())
    }

    async fn exists(&self) -> Result<bool> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(ArtifactError::s3(format!("S3 head error: {service_err}")).into())
                }
            }
        }
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    fn backend_type(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_without_prefix() {
        assert_eq!(object_key(None, "webui"), "webui.json");
        assert_eq!(object_key(Some("/"), "webui"), "webui.json");
    }

    #[test]
    fn test_object_key_trims_prefix_slashes() {
        assert_eq!(object_key(Some("/artifacts/prod/"), "webui"), "artifacts/prod/webui.json");
    }
}
