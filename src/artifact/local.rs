//! Local file-based artifact store.
//!
//! Artifacts are written as `<stack>.json` under `.webui-topology/` in the
//! working directory, atomically through a temporary file.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{ArtifactError, Result, WebuiError};

use super::store::{decode, encode, ArtifactStore};
use super::types::SynthArtifact;

/// Default artifact directory name.
pub const ARTIFACT_DIR: &str = ".webui-topology";

/// Local file-based artifact store.
#[derive(Debug)]
pub struct LocalArtifactStore {
    /// Directory holding artifacts.
    base_dir: PathBuf,
    /// Path of this stack's artifact.
    artifact_path: PathBuf,
}

impl LocalArtifactStore {
    /// Creates a store for `stack` under the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn new(stack: &str) -> Result<Self> {
        let base_dir = std::env::current_dir()
            .map_err(|e| WebuiError::internal(format!("Cannot determine current directory: {e}")))?
            .join(ARTIFACT_DIR);

        Ok(Self::with_base_dir(base_dir, stack))
    }

    /// Creates a store for `stack` under a custom directory.
    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>, stack: &str) -> Self {
        let base_dir = base_dir.into();
        let artifact_path = base_dir.join(format!("{stack}.json"));
        Self {
            base_dir,
            artifact_path,
        }
    }

    async fn ensure_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            debug!("Creating artifact directory: {}", self.base_dir.display());
            fs::create_dir_all(&self.base_dir).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn load(&self) -> Result<Option<SynthArtifact>> {
        if !self.artifact_path.exists() {
            debug!("No artifact at {}", self.artifact_path.display());
            return Ok(None);
        }

        info!("Loading artifact from: {}", self.artifact_path.display());
        let content = fs::read_to_string(&self.artifact_path).await.map_err(|e| {
            WebuiError::Artifact(ArtifactError::Corrupted {
                message: format!("Failed to read artifact file: {e}"),
            })
        })?;

        decode(&content).map(Some)
    }

    async fn save(&self, artifact: &SynthArtifact) -> Result<()> {
        self.ensure_dir().await?;
        info!("Saving artifact to: {}", self.artifact_path.display());

        let content = encode(artifact)?;
        let temp_path = self.artifact_path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.artifact_path).await?;

        debug!("Artifact {} saved", artifact.short_run_id());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        if self.artifact_path.exists() {
            info!("Deleting artifact: {}", self.artifact_path.display());
            fs::remove_file(&self.artifact_path).await?;
        }
        Ok(())
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.artifact_path.exists())
    }

    fn location(&self) -> String {
        self.artifact_path.display().to_string()
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, DeploymentContext};
    use crate::lookup::FixedAddressRange;
    use crate::synth::synthesize;
    use tempfile::TempDir;

    fn create_test_store() -> (LocalArtifactStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = LocalArtifactStore::with_base_dir(temp_dir.path(), "webui");
        (store, temp_dir)
    }

    fn artifact() -> SynthArtifact {
        let config = Configuration::default();
        let ctx = DeploymentContext::new("webui", "123456789012", "us-east-1");
        let graph = synthesize(&config, &ctx, &FixedAddressRange::new("pl-1")).unwrap();
        SynthArtifact::new(config, ctx, graph)
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _temp) = create_test_store();
        let saved = artifact();
        store.save(&saved).await.expect("Failed to save artifact");

        let loaded = store
            .load()
            .await
            .expect("Failed to load artifact")
            .expect("Artifact should exist");

        assert_eq!(loaded.run_id, saved.run_id);
        assert_eq!(loaded.graph, saved.graph);
        assert_eq!(loaded.config_hash, saved.config_hash);
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _temp) = create_test_store();
        assert!(store.load().await.expect("Load should not fail").is_none());
    }

    #[tokio::test]
    async fn test_exists_and_delete() {
        let (store, _temp) = create_test_store();
        assert!(!store.exists().await.unwrap());

        store.save(&artifact()).await.unwrap();
        assert!(store.exists().await.unwrap());

        store.delete().await.unwrap();
        assert!(!store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupted_artifact_reported() {
        let (store, temp) = create_test_store();
        std::fs::write(temp.path().join("webui.json"), "not json").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(
            err,
            WebuiError::Artifact(ArtifactError::Corrupted { .. })
        ));
    }

    #[tokio::test]
    async fn test_stacks_do_not_collide() {
        let temp = TempDir::new().unwrap();
        let a = LocalArtifactStore::with_base_dir(temp.path(), "team-a");
        let b = LocalArtifactStore::with_base_dir(temp.path(), "team-b");

        a.save(&artifact()).await.unwrap();
        assert!(a.exists().await.unwrap());
        assert!(!b.exists().await.unwrap());
    }
}
