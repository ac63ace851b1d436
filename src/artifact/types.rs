//! The persisted synthesis artifact.
//!
//! An artifact is what the realization backend consumes: the frozen graph
//! plus enough provenance to tell runs apart and to detect configuration
//! drift between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ConfigHasher, Configuration, DeploymentContext};
use crate::error::{ArtifactError, Result};
use crate::graph::ResourceGraph;

/// Current version of the artifact format.
pub const ARTIFACT_VERSION: &str = "1.0";

/// A stored synthesis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthArtifact {
    /// Artifact format version.
    pub version: String,
    /// Unique identifier of the synthesis run.
    pub run_id: Uuid,
    /// Host that performed the synthesis.
    pub host: String,
    /// When the graph was synthesized.
    pub synthesized_at: DateTime<Utc>,
    /// Hash of the configuration and context the graph derives from.
    pub config_hash: String,
    /// Deployment context of the run.
    pub context: DeploymentContext,
    /// Configuration of the run.
    pub configuration: Configuration,
    /// The frozen resource graph.
    pub graph: ResourceGraph,
}

impl SynthArtifact {
    /// Wraps a freshly synthesized graph.
    #[must_use]
    pub fn new(
        configuration: Configuration,
        context: DeploymentContext,
        graph: ResourceGraph,
    ) -> Self {
        let config_hash = ConfigHasher::new().hash_config(&configuration, &context);
        Self {
            version: ARTIFACT_VERSION.to_string(),
            run_id: Uuid::new_v4(),
            host: synthesizing_host(),
            synthesized_at: Utc::now(),
            config_hash,
            context,
            configuration,
            graph,
        }
    }

    /// Checks that the artifact was written in the current format.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::VersionMismatch`] for any other version.
    pub fn check_version(&self) -> Result<()> {
        if self.version == ARTIFACT_VERSION {
            Ok(())
        } else {
            Err(ArtifactError::VersionMismatch {
                expected: ARTIFACT_VERSION.to_string(),
                found: self.version.clone(),
            }
            .into())
        }
    }

    /// Returns true if the artifact derives from the given inputs.
    #[must_use]
    pub fn matches(&self, configuration: &Configuration, context: &DeploymentContext) -> bool {
        let hash = ConfigHasher::new().hash_config(configuration, context);
        ConfigHasher::hashes_match(&self.config_hash, &hash)
    }

    /// Returns a short form of the run identifier.
    #[must_use]
    pub fn short_run_id(&self) -> String {
        self.run_id.simple().to_string()[..8].to_string()
    }
}

/// Returns the local host name, or `unknown`.
fn synthesizing_host() -> String {
    hostname::get().map_or_else(
        |_| String::from("unknown"),
        |h| h.to_string_lossy().to_string(),
    )
}
