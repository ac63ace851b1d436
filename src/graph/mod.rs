//! Resource graph produced by synthesis.
//!
//! A [`GraphBuilder`] is mutable while the synthesizer works and is frozen
//! into an immutable [`ResourceGraph`] once every stage has run. Nodes are
//! keyed by [`NodeId`] in ordered maps so the serialized form is stable.

mod node;
mod diff;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use diff::{DiffType, GraphDiff, GraphDiffEngine, NodeDiff};
pub use node::{
    AccessPoint, AllowRule, AttrRef, ComputeCluster, Container, Edge, EdgeDistribution, Encryption,
    FilesystemBinding, FixedResponse, HeaderGate, Listener, ListenerAction, ListenerProtocol,
    LoadBalancer, Mount, Network, Node, NodeId, NodeKind, ObjectAction, ObjectGrant,
    ObjectStoreBinding, Output, Principal, Relation, SecretRecord, SecretRef, SecretValue,
    SecurityPolicy, StorageBinding, Subnet, SubnetTier, Target, ViewerProtocolPolicy, Volume,
    Workload,
};

/// Mutable graph under construction. Stages may only add to it.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    /// Nodes by identifier.
    nodes: BTreeMap<NodeId, Node>,
    /// Edges in insertion order.
    edges: Vec<Edge>,
    /// Outputs in insertion order.
    outputs: Vec<Output>,
}

/// Frozen, immutable resource graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGraph {
    /// Nodes by identifier.
    nodes: BTreeMap<NodeId, Node>,
    /// Edges, sorted.
    edges: Vec<Edge>,
    /// Outputs in emission order.
    outputs: Vec<Output>,
}

/// Identifier-free summary of a graph used to compare shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphShape {
    /// Node kinds, sorted.
    pub kinds: Vec<NodeKind>,
    /// Edges as (source kind, relation, destination kind), sorted.
    pub edges: Vec<(NodeKind, Relation, NodeKind)>,
    /// Output names, sorted.
    pub outputs: Vec<String>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its identifier.
    ///
    /// Identifiers are fixed per node role, so adding the same one twice is a
    /// construction bug; the first node is kept.
    pub fn add_node(&mut self, id: impl Into<NodeId>, node: Node) -> NodeId {
        let id = id.into();
        debug_assert!(
            !self.nodes.contains_key(&id),
            "node {id} added twice to the graph"
        );
        debug!("Adding {} node '{id}'", node.kind());
        self.nodes.entry(id.clone()).or_insert(node);
        id
    }

    /// Adds a directed edge.
    pub fn add_edge(&mut self, from: &NodeId, to: &NodeId, relation: Relation) {
        self.edges.push(Edge {
            from: from.clone(),
            to: to.clone(),
            relation,
        });
    }

    /// Adds an output.
    pub fn add_output(&mut self, output: Output) {
        self.outputs.push(output);
    }

    /// Returns true if a node with this identifier exists.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Freezes the builder into an immutable graph.
    #[must_use]
    pub fn freeze(mut self) -> ResourceGraph {
        debug_assert!(
            self.edges
                .iter()
                .all(|e| self.nodes.contains_key(&e.from) && self.nodes.contains_key(&e.to)),
            "graph has dangling edges"
        );
        self.edges.sort();
        self.edges.dedup();

        ResourceGraph {
            nodes: self.nodes,
            edges: self.edges,
            outputs: self.outputs,
        }
    }
}

impl ResourceGraph {
    /// Returns a node by identifier.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Iterates over all nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Returns all edges.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns all outputs.
    #[must_use]
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Returns an output by name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of nodes of a kind.
    #[must_use]
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|n| n.kind() == kind).count()
    }

    /// Returns the workloads in the graph.
    #[must_use]
    pub fn workloads(&self) -> Vec<&Workload> {
        self.nodes
            .values()
            .filter_map(|n| match n {
                Node::Workload(w) => Some(w),
                _ => None,
            })
            .collect()
    }

    /// Returns the filesystem bindings in the graph.
    #[must_use]
    pub fn filesystem_bindings(&self) -> Vec<&FilesystemBinding> {
        self.nodes
            .values()
            .filter_map(|n| match n {
                Node::StorageBinding(StorageBinding::Filesystem(fs)) => Some(fs),
                _ => None,
            })
            .collect()
    }

    /// Returns the object-store bindings in the graph.
    #[must_use]
    pub fn object_store_bindings(&self) -> Vec<&ObjectStoreBinding> {
        self.nodes
            .values()
            .filter_map(|n| match n {
                Node::StorageBinding(StorageBinding::ObjectStore(os)) => Some(os),
                _ => None,
            })
            .collect()
    }

    /// Returns the secrets in the graph with their identifiers.
    #[must_use]
    pub fn secrets(&self) -> Vec<(&NodeId, &SecretRecord)> {
        self.nodes
            .iter()
            .filter_map(|(id, n)| match n {
                Node::SecretRecord(s) => Some((id, s)),
                _ => None,
            })
            .collect()
    }

    /// Returns the listeners in the graph with their identifiers.
    #[must_use]
    pub fn listeners(&self) -> Vec<(&NodeId, &Listener)> {
        self.nodes
            .iter()
            .filter_map(|(id, n)| match n {
                Node::Listener(l) => Some((id, l)),
                _ => None,
            })
            .collect()
    }

    /// Returns the security policy, if present.
    #[must_use]
    pub fn security_policy(&self) -> Option<&SecurityPolicy> {
        self.nodes.values().find_map(|n| match n {
            Node::SecurityPolicy(p) => Some(p),
            _ => None,
        })
    }

    /// Returns the edge distribution, if present.
    #[must_use]
    pub fn edge_distribution(&self) -> Option<&EdgeDistribution> {
        self.nodes.values().find_map(|n| match n {
            Node::EdgeDistribution(d) => Some(d),
            _ => None,
        })
    }

    /// Returns the edges leaving a node.
    #[must_use]
    pub fn edges_from(&self, id: &NodeId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| &e.from == id).collect()
    }

    /// Computes the identifier-free shape of the graph.
    #[must_use]
    pub fn shape(&self) -> GraphShape {
        let kind_of = |id: &NodeId| self.nodes.get(id).map(Node::kind);

        let mut kinds: Vec<NodeKind> = self.nodes.values().map(Node::kind).collect();
        kinds.sort();

        let mut edges: Vec<(NodeKind, Relation, NodeKind)> = self
            .edges
            .iter()
            .filter_map(|e| Some((kind_of(&e.from)?, e.relation, kind_of(&e.to)?)))
            .collect();
        edges.sort();

        let mut outputs: Vec<String> = self.outputs.iter().map(|o| o.name.clone()).collect();
        outputs.sort();

        GraphShape {
            kinds,
            edges,
            outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> Node {
        Node::Network(Network {
            name: String::from("net"),
            cidr: String::from("10.0.0.0/16"),
            availability_zones: 2,
            subnets: vec![],
        })
    }

    fn cluster() -> Node {
        Node::ComputeCluster(ComputeCluster {
            name: String::from("cluster"),
            network: NodeId::new("network"),
        })
    }

    #[test]
    fn test_freeze_sorts_and_dedups_edges() {
        let mut builder = GraphBuilder::new();
        let net = builder.add_node("network", network());
        let cl = builder.add_node("cluster", cluster());
        builder.add_edge(&net, &cl, Relation::Contains);
        builder.add_edge(&net, &cl, Relation::Contains);

        let graph = builder.freeze();
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.count_kind(NodeKind::Network), 1);
    }

    #[test]
    fn test_shape_ignores_identifiers() {
        let mut a = GraphBuilder::new();
        let n = a.add_node("network", network());
        let c = a.add_node("cluster", cluster());
        a.add_edge(&n, &c, Relation::Contains);

        let mut b = GraphBuilder::new();
        let n = b.add_node("net-b", network());
        let c = b.add_node("cluster-b", cluster());
        b.add_edge(&n, &c, Relation::Contains);

        assert_eq!(a.freeze().shape(), b.freeze().shape());
    }

    #[test]
    fn test_graph_round_trips_through_json() {
        let mut builder = GraphBuilder::new();
        builder.add_node("network", network());
        builder.add_output(Output::new("Cidr", "network range", "10.0.0.0/16"));
        let graph = builder.freeze();

        let json = serde_json::to_string(&graph).unwrap();
        let back: ResourceGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
        assert_eq!(back.output("Cidr").unwrap().value, "10.0.0.0/16");
    }
}
