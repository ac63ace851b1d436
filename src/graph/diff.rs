//! Diff engine for comparing a stored graph with a freshly synthesized one.
//!
//! Each node is reduced to a content hash; identifiers present only in the
//! new graph are creates, only in the old graph deletes, and in both with a
//! different hash updates. Outputs are compared by value.

use std::collections::BTreeSet;
use tracing::debug;

use crate::config::ConfigHasher;
use crate::error::Result;

use super::{NodeId, NodeKind, ResourceGraph};

/// Engine for computing diffs between two graphs.
#[derive(Debug, Default)]
pub struct GraphDiffEngine {
    /// Hasher used for node content.
    hasher: ConfigHasher,
}

/// Difference for a single node.
#[derive(Debug, Clone)]
pub struct NodeDiff {
    /// Node identifier.
    pub id: NodeId,
    /// Node kind (taken from the new graph when present).
    pub kind: NodeKind,
    /// Type of difference.
    pub diff_type: DiffType,
    /// Previous hash (if applicable).
    pub old_hash: Option<String>,
    /// New hash (if applicable).
    pub new_hash: Option<String>,
}

/// Type of difference detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    /// Node needs to be created.
    Create,
    /// Node content changed.
    Update,
    /// Node needs to be deleted.
    Delete,
    /// Node is unchanged.
    NoChange,
}

/// Complete diff result.
#[derive(Debug)]
pub struct GraphDiff {
    /// All node diffs, in identifier order.
    pub nodes: Vec<NodeDiff>,
    /// Names of outputs that were added, removed or changed.
    pub changed_outputs: Vec<String>,
    /// Number of nodes to create.
    pub creates: usize,
    /// Number of nodes to update.
    pub updates: usize,
    /// Number of nodes to delete.
    pub deletes: usize,
    /// Number of unchanged nodes.
    pub unchanged: usize,
}

impl GraphDiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hasher: ConfigHasher::new(),
        }
    }

    /// Computes the diff from `previous` (if any) to `next`.
    ///
    /// # Errors
    ///
    /// Returns an error if a node cannot be hashed.
    pub fn compute(
        &self,
        previous: Option<&ResourceGraph>,
        next: &ResourceGraph,
    ) -> Result<GraphDiff> {
        let mut ids: BTreeSet<&NodeId> = next.nodes().map(|(id, _)| id).collect();
        if let Some(prev) = previous {
            ids.extend(prev.nodes().map(|(id, _)| id));
        }

        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            let old = previous.and_then(|p| p.node(id));
            let new = next.node(id);

            let old_hash = old.map(|n| self.hasher.hash_value(n)).transpose()?;
            let new_hash = new.map(|n| self.hasher.hash_value(n)).transpose()?;

            let diff_type = match (&old_hash, &new_hash) {
                (None, Some(_)) => DiffType::Create,
                (Some(_), None) => DiffType::Delete,
                (Some(a), Some(b)) if ConfigHasher::hashes_match(a, b) => DiffType::NoChange,
                _ => DiffType::Update,
            };

            let Some(kind) = new.or(old).map(super::Node::kind) else {
                continue;
            };

            debug!("Node {id} ({kind}): {diff_type}");
            nodes.push(NodeDiff {
                id: id.clone(),
                kind,
                diff_type,
                old_hash,
                new_hash,
            });
        }

        let changed_outputs = Self::changed_outputs(previous, next);

        let count = |t: DiffType| nodes.iter().filter(|d| d.diff_type == t).count();
        let creates = count(DiffType::Create);
        let updates = count(DiffType::Update);
        let deletes = count(DiffType::Delete);
        let unchanged = count(DiffType::NoChange);

        Ok(GraphDiff {
            nodes,
            changed_outputs,
            creates,
            updates,
            deletes,
            unchanged,
        })
    }

    /// Lists output names whose value differs between the graphs.
    fn changed_outputs(previous: Option<&ResourceGraph>, next: &ResourceGraph) -> Vec<String> {
        let mut names: BTreeSet<&str> = next.outputs().iter().map(|o| o.name.as_str()).collect();
        if let Some(prev) = previous {
            names.extend(prev.outputs().iter().map(|o| o.name.as_str()));
        }

        names
            .into_iter()
            .filter(|name| {
                let old = previous.and_then(|p| p.output(name)).map(|o| &o.value);
                let new = next.output(name).map(|o| &o.value);
                old != new
            })
            .map(String::from)
            .collect()
    }
}

impl GraphDiff {
    /// Returns true if there are any changes.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.creates > 0 || self.updates > 0 || self.deletes > 0
    }

    /// Returns the total number of changes.
    #[must_use]
    pub const fn total_changes(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    /// Filters to only diffs that require action.
    #[must_use]
    pub fn actionable(&self) -> Vec<&NodeDiff> {
        self.nodes
            .iter()
            .filter(|d| d.diff_type != DiffType::NoChange)
            .collect()
    }
}

impl std::fmt::Display for DiffType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::NoChange => "no change",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for NodeDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.id, self.kind, self.diff_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ComputeCluster, GraphBuilder, Network, Node, Output};

    fn graph(cluster_name: &str, with_cluster: bool, output: &str) -> ResourceGraph {
        let mut builder = GraphBuilder::new();
        builder.add_node(
            "network",
            Node::Network(Network {
                name: String::from("net"),
                cidr: String::from("10.0.0.0/16"),
                availability_zones: 2,
                subnets: vec![],
            }),
        );
        if with_cluster {
            builder.add_node(
                "cluster",
                Node::ComputeCluster(ComputeCluster {
                    name: cluster_name.to_string(),
                    network: NodeId::new("network"),
                }),
            );
        }
        builder.add_output(Output::new("Edge", "edge host", output));
        builder.freeze()
    }

    #[test]
    fn test_first_synthesis_is_all_creates() {
        let next = graph("c", true, "x");
        let diff = GraphDiffEngine::new().compute(None, &next).unwrap();

        assert_eq!(diff.creates, 2);
        assert_eq!(diff.total_changes(), 2);
        assert_eq!(diff.changed_outputs, vec![String::from("Edge")]);
    }

    #[test]
    fn test_identical_graphs_have_no_changes() {
        let prev = graph("c", true, "x");
        let next = graph("c", true, "x");
        let diff = GraphDiffEngine::new().compute(Some(&prev), &next).unwrap();

        assert!(!diff.has_changes());
        assert_eq!(diff.unchanged, 2);
        assert!(diff.changed_outputs.is_empty());
    }

    #[test]
    fn test_update_and_delete_detected() {
        let prev = graph("c", true, "x");
        let renamed = graph("c2", true, "y");
        let diff = GraphDiffEngine::new().compute(Some(&prev), &renamed).unwrap();
        assert_eq!(diff.updates, 1);
        assert_eq!(diff.actionable()[0].id, NodeId::new("cluster"));

        let removed = graph("c", false, "x");
        let diff = GraphDiffEngine::new().compute(Some(&prev), &removed).unwrap();
        assert_eq!(diff.deletes, 1);
        assert_eq!(diff.actionable()[0].kind, NodeKind::ComputeCluster);
    }
}
