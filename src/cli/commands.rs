//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::collector::{CollectedFields, DEFAULT_OUTPUT};
use crate::config::DEFAULT_STACK_NAME;

/// webui-topology - synthesizes the resource graph of an Open WebUI +
/// Pipelines deployment.
#[derive(Parser, Debug)]
#[command(name = "webui-topology")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration document.
    #[arg(short, long, global = true, env = "WEBUI_TOPOLOGY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Stack name; prefixes every physical resource name.
    #[arg(long, global = true, env = "WEBUI_TOPOLOGY_STACK", default_value = DEFAULT_STACK_NAME)]
    pub stack_name: String,

    /// Target account identifier.
    #[arg(long, global = true, env = "CDK_DEFAULT_ACCOUNT")]
    pub account: Option<String>,

    /// Target region.
    #[arg(long, global = true, env = "CDK_DEFAULT_REGION")]
    pub region: Option<String>,

    /// Require a certificate reference when loading the configuration.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Artifact storage options.
    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Where synthesis artifacts are kept.
#[derive(Args, Debug, Clone, Default)]
pub struct ArtifactArgs {
    /// Store artifacts in this S3 bucket instead of locally.
    #[arg(long, global = true, env = "WEBUI_TOPOLOGY_ARTIFACT_BUCKET")]
    pub artifact_bucket: Option<String>,

    /// Key prefix inside the artifact bucket.
    #[arg(long, global = true, requires = "artifact_bucket")]
    pub artifact_prefix: Option<String>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect a configuration document from flags or prompts.
    Configure(ConfigureArgs),

    /// Validate the configuration document.
    Validate,

    /// Synthesize the resource graph and store it as an artifact.
    Synth {
        /// Print the graph without storing an artifact.
        #[arg(long)]
        no_store: bool,

        /// Override the edge origin-facing address range identifier.
        #[arg(long, env = "WEBUI_TOPOLOGY_EDGE_PREFIX_LIST")]
        edge_prefix_list: Option<String>,
    },

    /// Compare a fresh synthesis with the stored artifact.
    Diff {
        /// Override the edge origin-facing address range identifier.
        #[arg(long, env = "WEBUI_TOPOLOGY_EDGE_PREFIX_LIST")]
        edge_prefix_list: Option<String>,
    },

    /// Show the stored artifact.
    Show,

    /// Delete the stored artifact.
    DestroyArtifact {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments of the `configure` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConfigureArgs {
    /// Prompt for every field instead of reading flags.
    #[arg(short, long)]
    pub interactive: bool,

    /// ACM certificate ARN.
    #[arg(long, required_unless_present = "interactive")]
    pub acm_cert_arn: Option<String>,

    /// Custom hostname bound to the edge distribution.
    #[arg(long)]
    pub hostname: Option<String>,

    /// Storage backend (efs, s3).
    #[arg(long)]
    pub storage_type: Option<String>,

    /// SSO issuer URL.
    #[arg(long)]
    pub sso_provider_url: Option<String>,

    /// SSO client identifier.
    #[arg(long)]
    pub sso_client_id: Option<String>,

    /// Where to write the document; `.json` selects JSON.
    #[arg(short = 'o', long = "out", default_value = DEFAULT_OUTPUT)]
    pub out: PathBuf,
}

impl ConfigureArgs {
    /// Returns the flag values as collected fields.
    #[must_use]
    pub fn fields(&self) -> CollectedFields {
        CollectedFields {
            acm_cert_arn: self.acm_cert_arn.clone(),
            hostname: self.hostname.clone(),
            storage_type: self.storage_type.clone(),
            sso_provider_url: self.sso_provider_url.clone(),
            sso_client_id: self.sso_client_id.clone(),
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
