//! Artifact store trait definition.

use async_trait::async_trait;

use super::types::SynthArtifact;
use crate::error::Result;

/// Trait for artifact storage backends.
///
/// A store is scoped to one stack: it holds at most one artifact, the most
/// recent synthesis.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Loads the stored artifact.
    ///
    /// Returns `None` if nothing has been synthesized yet.
    async fn load(&self) -> Result<Option<SynthArtifact>>;

    /// Saves an artifact, replacing any previous one.
    async fn save(&self, artifact: &SynthArtifact) -> Result<()>;

    /// Deletes the stored artifact.
    async fn delete(&self) -> Result<()>;

    /// Checks if an artifact exists.
    async fn exists(&self) -> Result<bool>;

    /// Returns where the artifact lives, for display.
    fn location(&self) -> String;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}

#[async_trait]
impl ArtifactStore for Box<dyn ArtifactStore> {
    async fn load(&self) -> Result<Option<SynthArtifact>> {
        (**self).load().await
    }

    async fn save(&self, artifact: &SynthArtifact) -> Result<()> {
        (**self).save(artifact).await
    }

    async fn delete(&self) -> Result<()> {
        (**self).delete().await
    }

    async fn exists(&self) -> Result<bool> {
        (**self).exists().await
    }

    fn location(&self) -> String {
        (**self).location()
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}

/// Parses stored JSON into an artifact and checks its version.
pub(super) fn decode(content: &str) -> Result<SynthArtifact> {
    let artifact: SynthArtifact = serde_json::from_str(content).map_err(|e| {
        crate::error::ArtifactError::Corrupted {
            message: format!("Failed to parse artifact: {e}"),
        }
    })?;
    artifact.check_version()?;
    Ok(artifact)
}

/// Serializes an artifact to pretty JSON.
pub(super) fn encode(artifact: &SynthArtifact) -> Result<String> {
    serde_json::to_string_pretty(artifact).map_err(|e| {
        crate::error::ArtifactError::serialization(format!("Failed to serialize artifact: {e}"))
            .into()
    })
}
