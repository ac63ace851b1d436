//! Output formatting for CLI commands.
//!
//! Every formatter returns a string; printing is left to the binary.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::artifact::SynthArtifact;
use crate::config::{ConfigHasher, Configuration, DeploymentContext};
use crate::error::FieldFailure;
use crate::graph::{DiffType, GraphDiff, Node, ResourceGraph};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Node row for table display.
#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// Output row for table display.
#[derive(Tabled)]
struct OutputRow {
    #[tabled(rename = "Output")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Diff row for table display.
#[derive(Tabled)]
struct DiffRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Kind")]
    kind: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns the configured format.
    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    /// Formats a resolved configuration.
    #[must_use]
    pub fn format_configuration(&self, config: &Configuration) -> String {
        match self.format {
            OutputFormat::Json => to_json(config),
            OutputFormat::Text => {
                let none = || "(none)".dimmed().to_string();
                let mut output = format!("\n{}\n", "Configuration".bold());
                let _ = writeln!(
                    output,
                    "   Certificate: {}",
                    config.certificate_arn.as_deref().map_or_else(none, |c| c.cyan().to_string())
                );
                let _ = writeln!(output, "   Storage:     {}", config.storage_backend.to_string().cyan());
                let _ = writeln!(
                    output,
                    "   Hostname:    {}",
                    config.hostname.as_deref().map_or_else(none, |h| h.cyan().to_string())
                );
                let _ = writeln!(
                    output,
                    "   SSO:         {}",
                    config.sso.as_ref().map_or_else(none, |s| format!(
                        "{} ({})",
                        s.provider_url.cyan(),
                        s.client_id
                    ))
                );
                output
            }
        }
    }

    /// Formats a synthesized graph with its context.
    #[must_use]
    pub fn format_graph(&self, graph: &ResourceGraph, context: &DeploymentContext) -> String {
        match self.format {
            OutputFormat::Json => to_json(graph),
            OutputFormat::Text => {
                let mut output = format!(
                    "\n{} {} ({} / {})\n\n",
                    "Stack".bold(),
                    context.stack_name.cyan(),
                    context.account,
                    context.region
                );

                let rows: Vec<NodeRow> = graph
                    .nodes()
                    .map(|(id, node)| NodeRow {
                        id: id.to_string(),
                        kind: node.kind().to_string(),
                        detail: node_detail(node),
                    })
                    .collect();
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');

                let _ = writeln!(
                    output,
                    "\n{} nodes, {} edges",
                    graph.node_count(),
                    graph.edges().len()
                );
                output.push_str(&Self::outputs_table(graph));
                output
            }
        }
    }

    /// Formats a stored artifact.
    #[must_use]
    pub fn format_artifact(&self, artifact: &SynthArtifact, location: &str) -> String {
        match self.format {
            OutputFormat::Json => to_json(artifact),
            OutputFormat::Text => {
                let mut output = format!("\n{} {}\n", "Artifact".bold(), location);
                let _ = writeln!(output, "   Run:          {}", artifact.short_run_id());
                let _ = writeln!(output, "   Synthesized:  {} on {}", artifact.synthesized_at.to_rfc3339(), artifact.host);
                let _ = writeln!(output, "   Config hash:  {}", ConfigHasher::new().short_hash(&artifact.config_hash));
                let _ = writeln!(output, "   Version:      {}", artifact.version);
                output.push_str(&self.format_graph(&artifact.graph, &artifact.context));
                output
            }
        }
    }

    /// Formats a graph diff.
    #[must_use]
    pub fn format_diff(&self, diff: &GraphDiff) -> String {
        match self.format {
            OutputFormat::Json => to_json(&DiffJson::from(diff)),
            OutputFormat::Text => {
                if !diff.has_changes() && diff.changed_outputs.is_empty() {
                    return format!(
                        "{} No changes - the stored artifact is up to date.\n",
                        "✓".green()
                    );
                }

                let mut output = String::from("\n");
                let rows: Vec<DiffRow> = diff
                    .actionable()
                    .into_iter()
                    .map(|d| DiffRow {
                        action: format_diff_type(d.diff_type),
                        id: d.id.to_string(),
                        kind: d.kind.to_string(),
                    })
                    .collect();
                if !rows.is_empty() {
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }

                let _ = writeln!(
                    output,
                    "\nDiff: {} changes ({} to create, {} to update, {} to delete), {} unchanged",
                    diff.total_changes(),
                    diff.creates.to_string().green(),
                    diff.updates.to_string().yellow(),
                    diff.deletes.to_string().red(),
                    diff.unchanged
                );
                if !diff.changed_outputs.is_empty() {
                    let _ = writeln!(output, "Changed outputs: {}", diff.changed_outputs.join(", "));
                }
                output
            }
        }
    }

    /// Formats collector field failures, one per line.
    #[must_use]
    pub fn format_field_failures(&self, failures: &[FieldFailure]) -> String {
        match self.format {
            OutputFormat::Json => {
                let list: Vec<_> = failures
                    .iter()
                    .map(|f| serde_json::json!({ "field": f.field, "message": f.message }))
                    .collect();
                to_json(&serde_json::json!({ "status": "invalid", "failures": list }))
            }
            OutputFormat::Text => {
                let mut output = String::new();
                for failure in failures {
                    let _ = writeln!(output, "  {} {}: {}", "✗".red(), failure.field.bold(), failure.message);
                }
                output
            }
        }
    }

    /// Formats a status message.
    #[must_use]
    pub fn format_message(&self, status: &str, message: &str) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({ "status": status, "message": message })),
            OutputFormat::Text => match status {
                "success" => format!("{} {message}", "✓".green()),
                "warning" => format!("{} {message}", "⚠".yellow()),
                _ => format!("{} {message}", "✗".red()),
            },
        }
    }

    fn outputs_table(graph: &ResourceGraph) -> String {
        if graph.outputs().is_empty() {
            return String::new();
        }
        let rows: Vec<OutputRow> = graph
            .outputs()
            .iter()
            .map(|o| OutputRow {
                name: o.name.clone(),
                value: o.value.clone(),
            })
            .collect();
        format!("\n{}\n", Table::new(rows))
    }
}

/// One-line description of a node.
fn node_detail(node: &Node) -> String {
    match node {
        Node::Network(n) => format!("{} ({} AZs)", n.cidr, n.availability_zones),
        Node::ComputeCluster(c) => c.name.clone(),
        Node::Workload(w) => w
            .containers
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        Node::StorageBinding(crate::graph::StorageBinding::Filesystem(fs)) => {
            format!("filesystem, {} access points", fs.access_points.len())
        }
        Node::StorageBinding(crate::graph::StorageBinding::ObjectStore(os)) => {
            format!("bucket {}", os.bucket_name)
        }
        Node::SecretRecord(s) => s.name.clone(),
        Node::SecurityPolicy(p) => format!(
            "{} rules, {} header gates",
            p.rules.len(),
            p.header_gates.len()
        ),
        Node::LoadBalancer(lb) => lb.name.clone(),
        Node::Listener(l) => format!(
            "{:?}:{} -> {}:{}",
            l.protocol, l.port, l.target.container, l.target.port
        ),
        Node::EdgeDistribution(d) => {
            if d.aliases.is_empty() {
                d.domain_name.token()
            } else {
                d.aliases.join(", ")
            }
        }
    }
}

fn format_diff_type(diff_type: DiffType) -> String {
    match diff_type {
        DiffType::Create => "+ create".green().to_string(),
        DiffType::Update => "~ update".yellow().to_string(),
        DiffType::Delete => "- delete".red().to_string(),
        DiffType::NoChange => "  no change".dimmed().to_string(),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// JSON shape of a diff.
#[derive(Serialize)]
struct DiffJson {
    creates: usize,
    updates: usize,
    deletes: usize,
    unchanged: usize,
    changed_outputs: Vec<String>,
    nodes: Vec<NodeDiffJson>,
}

/// JSON shape of one node diff.
#[derive(Serialize)]
struct NodeDiffJson {
    id: String,
    kind: String,
    action: String,
}

impl From<&GraphDiff> for DiffJson {
    fn from(diff: &GraphDiff) -> Self {
        Self {
            creates: diff.creates,
            updates: diff.updates,
            deletes: diff.deletes,
            unchanged: diff.unchanged,
            changed_outputs: diff.changed_outputs.clone(),
            nodes: diff
                .actionable()
                .into_iter()
                .map(|d| NodeDiffJson {
                    id: d.id.to_string(),
                    kind: d.kind.to_string(),
                    action: d.diff_type.to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphDiffEngine;
    use crate::lookup::FixedAddressRange;
    use crate::synth::synthesize;

    fn graph() -> (ResourceGraph, DeploymentContext) {
        let ctx = DeploymentContext::new("webui", "123456789012", "us-east-1");
        let graph =
            synthesize(&Configuration::default(), &ctx, &FixedAddressRange::new("pl-1")).unwrap();
        (graph, ctx)
    }

    #[test]
    fn test_json_graph_is_parseable() {
        let (graph, ctx) = graph();
        let json = OutputFormatter::new(OutputFormat::Json).format_graph(&graph, &ctx);
        let back: ResourceGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn test_text_graph_lists_outputs() {
        let (graph, ctx) = graph();
        let text = OutputFormatter::new(OutputFormat::Text).format_graph(&graph, &ctx);
        assert!(text.contains("EdgeHostname"));
        assert!(text.contains("security-policy"));
    }

    #[test]
    fn test_diff_json_counts() {
        let (graph, _) = graph();
        let diff = GraphDiffEngine::new().compute(None, &graph).unwrap();
        let json = OutputFormatter::new(OutputFormat::Json).format_diff(&diff);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["creates"], graph.node_count());
        assert_eq!(value["deletes"], 0);
    }

    #[test]
    fn test_field_failures_text_lists_each_field() {
        let failures = vec![
            FieldFailure::new("acm_cert_arn", "bad"),
            FieldFailure::new("hostname", "bad"),
        ];
        let text = OutputFormatter::new(OutputFormat::Text).format_field_failures(&failures);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("hostname"));
    }
}
