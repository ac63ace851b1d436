//! webui-topology CLI entrypoint.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use webui_topology::artifact::{ArtifactStore, LocalArtifactStore, S3ArtifactStore, SynthArtifact};
use webui_topology::cli::{Cli, Commands, ConfigureArgs, OutputFormat, OutputFormatter};
use webui_topology::collector::{self, Collector};
use webui_topology::config::{
    find_config_file, ConfigParser, ConfigValidator, Configuration, DeploymentContext,
};
use webui_topology::error::{CollectError, Result, WebuiError};
use webui_topology::graph::{GraphDiffEngine, ResourceGraph};
use webui_topology::lookup::{AddressRangeLookup, FixedAddressRange, StaticAddressRanges};
use webui_topology::synth::synthesize;

use clap::Parser;
use dialoguer::Confirm;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` wins over the verbosity flag when set.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match &cli.command {
        Commands::Configure(args) => cmd_configure(args, &formatter),
        Commands::Validate => cmd_validate(&cli, &formatter),
        Commands::Synth {
            no_store,
            edge_prefix_list,
        } => cmd_synth(&cli, *no_store, edge_prefix_list.as_deref(), &formatter).await,
        Commands::Diff { edge_prefix_list } => {
            cmd_diff(&cli, edge_prefix_list.as_deref(), &formatter).await
        }
        Commands::Show => cmd_show(&cli, &formatter).await,
        Commands::DestroyArtifact { yes } => cmd_destroy_artifact(&cli, *yes, &formatter).await,
    }
}

/// Collect a configuration document.
fn cmd_configure(args: &ConfigureArgs, formatter: &OutputFormatter) -> Result<()> {
    let fields = if args.interactive {
        collector::interactive()?
    } else {
        args.fields()
    };

    let collector = Collector::new(&args.out);
    match collector.collect(fields) {
        Ok(configuration) => {
            eprintln!(
                "{}",
                formatter.format_message(
                    "success",
                    &format!("Configuration written to {}", collector.output().display())
                )
            );
            println!("{}", formatter.format_configuration(&configuration));
            Ok(())
        }
        Err(e @ WebuiError::Collect(CollectError::InvalidFields { .. })) => {
            eprint!("{}", formatter.format_field_failures(e.field_failures()));
            Err(e)
        }
        Err(e) => Err(e),
    }
}

/// Validate the configuration document.
fn cmd_validate(cli: &Cli, formatter: &OutputFormatter) -> Result<()> {
    let config_file = resolve_config_path(cli.config.as_ref())?;
    info!("Validating configuration: {}", config_file.display());

    let parser = parser_for(&config_file);
    parser.load_dotenv()?;

    let document = parser.load_file(&config_file)?;
    let validator = validator(cli.strict);
    let report = validator.check_document(&document);

    for warning in &report.warnings {
        eprintln!("{}", formatter.format_message("warning", warning));
    }
    if !report.is_valid() {
        eprint!("{}", formatter.format_field_failures(&report.errors));
    }
    report.into_result()?;

    let configuration = validator.validate(&document)?;
    eprintln!("{}", formatter.format_message("success", "Configuration is valid"));
    println!("{}", formatter.format_configuration(&configuration));
    Ok(())
}

/// Synthesize the graph and store it.
async fn cmd_synth(
    cli: &Cli,
    no_store: bool,
    edge_prefix_list: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (configuration, context) = load_inputs(cli)?;
    let graph = synthesize_graph(&configuration, &context, edge_prefix_list)?;

    println!("{}", formatter.format_graph(&graph, &context));
    if no_store {
        return Ok(());
    }

    let store = open_store(cli, &context.stack_name).await?;
    let previous = store.load().await?;
    if formatter.format() == OutputFormat::Text {
        let diff = GraphDiffEngine::new().compute(previous.as_ref().map(|a| &a.graph), &graph)?;
        eprintln!("{}", formatter.format_diff(&diff));
    }

    let artifact = SynthArtifact::new(configuration, context, graph);
    store.save(&artifact).await?;
    eprintln!(
        "{}",
        formatter.format_message(
            "success",
            &format!(
                "Artifact {} saved to {}",
                artifact.short_run_id(),
                store.location()
            )
        )
    );
    Ok(())
}

/// Compare a fresh synthesis with the stored artifact.
async fn cmd_diff(
    cli: &Cli,
    edge_prefix_list: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (configuration, context) = load_inputs(cli)?;
    let graph = synthesize_graph(&configuration, &context, edge_prefix_list)?;

    let store = open_store(cli, &context.stack_name).await?;
    let previous = store.load().await?;
    match &previous {
        Some(artifact) if artifact.matches(&configuration, &context) => {
            debug!("Stored artifact {} has the same inputs", artifact.short_run_id());
        }
        Some(artifact) => {
            info!("Stored artifact {} was synthesized from different inputs", artifact.short_run_id());
        }
        None => warn!("No stored artifact at {}; every node is new", store.location()),
    }

    let diff = GraphDiffEngine::new().compute(previous.as_ref().map(|a| &a.graph), &graph)?;
    println!("{}", formatter.format_diff(&diff));
    Ok(())
}

/// Show the stored artifact.
async fn cmd_show(cli: &Cli, formatter: &OutputFormatter) -> Result<()> {
    let store = open_store(cli, &cli.stack_name).await?;
    match store.load().await? {
        Some(artifact) => println!("{}", formatter.format_artifact(&artifact, &store.location())),
        None => eprintln!(
            "{}",
            formatter.format_message(
                "warning",
                &format!("No artifact for stack '{}' at {}", cli.stack_name, store.location())
            )
        ),
    }
    Ok(())
}

/// Delete the stored artifact.
async fn cmd_destroy_artifact(cli: &Cli, yes: bool, formatter: &OutputFormatter) -> Result<()> {
    let store = open_store(cli, &cli.stack_name).await?;
    if !store.exists().await? {
        eprintln!("{}", formatter.format_message("warning", "Nothing to delete"));
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete the artifact at {}?", store.location()))
            .default(false)
            .interact()
            .map_err(|e| CollectError::PromptFailed {
                message: e.to_string(),
            })?;
        if !confirmed {
            eprintln!("Deletion cancelled.");
            return Ok(());
        }
    }

    store.delete().await?;
    eprintln!(
        "{}",
        formatter.format_message("success", &format!("Deleted {}", store.location()))
    );
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}

/// Creates a parser rooted at the configuration file's directory.
fn parser_for(config_file: &Path) -> ConfigParser {
    ConfigParser::new().with_base_path(config_file.parent().unwrap_or_else(|| Path::new(".")))
}

const fn validator(strict: bool) -> ConfigValidator {
    if strict {
        ConfigValidator::strict()
    } else {
        ConfigValidator::new()
    }
}

/// Loads the configuration and resolves the deployment context.
fn load_inputs(cli: &Cli) -> Result<(Configuration, DeploymentContext)> {
    let config_file = resolve_config_path(cli.config.as_ref())?;
    debug!("Loading configuration from: {}", config_file.display());

    let parser = parser_for(&config_file);
    parser.load_dotenv()?;
    let configuration = parser.load(Some(config_file.as_path()), &validator(cli.strict))?;

    let context = ConfigParser::resolve_context(
        Some(cli.stack_name.as_str()),
        cli.account.as_deref(),
        cli.region.as_deref(),
    )?;
    Ok((configuration, context))
}

/// Runs synthesis with the lookup chosen by the flags.
fn synthesize_graph(
    configuration: &Configuration,
    context: &DeploymentContext,
    edge_prefix_list: Option<&str>,
) -> Result<ResourceGraph> {
    let lookup: Box<dyn AddressRangeLookup> = match edge_prefix_list {
        Some(id) => Box::new(FixedAddressRange::new(id)),
        None => Box::new(StaticAddressRanges::for_region(&context.region)),
    };
    synthesize(configuration, context, lookup.as_ref())
}

/// Opens the artifact store selected by the flags.
async fn open_store(cli: &Cli, stack: &str) -> Result<Box<dyn ArtifactStore>> {
    let store: Box<dyn ArtifactStore> = match cli.artifacts.artifact_bucket.as_deref() {
        Some(bucket) => Box::new(
            S3ArtifactStore::new(
                bucket,
                cli.artifacts.artifact_prefix.as_deref(),
                cli.region.as_deref(),
                stack,
            )
            .await,
        ),
        None => Box::new(LocalArtifactStore::new(stack)?),
    };
    debug!("Using {} artifact store at {}", store.backend_type(), store.location());
    Ok(store)
}
