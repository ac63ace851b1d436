//! Synthesis artifact handoff.
//!
//! The frozen graph is persisted with its provenance so the realization
//! backend, and later `diff` runs, can pick it up.

mod store;
mod local;
mod s3;
mod types;

pub use local::{LocalArtifactStore, ARTIFACT_DIR};
pub use s3::S3ArtifactStore;
pub use store::ArtifactStore;
pub use types::{SynthArtifact, ARTIFACT_VERSION};
