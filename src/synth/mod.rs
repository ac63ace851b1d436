//! Topology synthesizer.
//!
//! Derives the complete resource graph for one deployment from a validated
//! [`Configuration`], an explicit [`DeploymentContext`] and an address-range
//! lookup. Synthesis is deterministic: identifiers are fixed per node role
//! and physical names derive from the stack name, so equal inputs produce
//! equal graphs.
//!
//! Stages run in order and only ever add to the graph:
//!
//! 1. network and cluster skeleton
//! 2. storage binding (filesystem or object store)
//! 3. secrets
//! 4. workload, first pass (primary and worker containers)
//! 5. security policy, load balancer and compute-facing listener
//! 6. edge distribution and worker listener, then the workload's second
//!    pass (the SSO proxy needs the public host)
//! 7. outputs
//!
//! A failed lookup aborts the whole synthesis; no partial graph escapes.

mod decision;
mod storage;
mod secrets;
mod compute;
mod security;
mod edge;

use tracing::info;

use crate::config::{Configuration, DeploymentContext};
use crate::error::Result;
use crate::graph::{
    ComputeCluster, GraphBuilder, Network, Node, NodeId, Output, Relation, ResourceGraph, Subnet,
    SubnetTier,
};
use crate::lookup::AddressRangeLookup;

pub use decision::{Decisions, HostnameVariant, SsoVariant, StorageVariant, TlsVariant};

/// Fixed node identifiers, one per node role.
pub mod ids {
    /// Network node.
    pub const NETWORK: &str = "network";
    /// Compute cluster node.
    pub const CLUSTER: &str = "cluster";
    /// Workload node.
    pub const WORKLOAD: &str = "workload";
    /// Filesystem binding node.
    pub const FILE_SYSTEM: &str = "file-system";
    /// Object-store binding node.
    pub const OBJECT_STORE: &str = "object-store";
    /// Shared API key secret.
    pub const API_KEY_SECRET: &str = "pipelines-api-key";
    /// Composite SSO secret.
    pub const SSO_SECRET: &str = "sso-secret";
    /// Security policy node.
    pub const SECURITY_POLICY: &str = "security-policy";
    /// Load balancer node.
    pub const LOAD_BALANCER: &str = "load-balancer";
    /// Compute-facing listener, origin of the edge distribution.
    pub const WEB_LISTENER: &str = "web-listener";
    /// TLS listener dedicated to the worker sidecar.
    pub const WORKER_LISTENER: &str = "worker-listener";
    /// Edge distribution node.
    pub const EDGE_DISTRIBUTION: &str = "edge-distribution";
}

/// Output names.
pub mod outputs {
    /// Provider-assigned edge hostname.
    pub const EDGE_HOSTNAME: &str = "EdgeHostname";
    /// Custom hostname bound to the edge.
    pub const CUSTOM_HOSTNAME: &str = "CustomHostname";
    /// Identifier of the active storage binding.
    pub const STORAGE_IDENTIFIER: &str = "StorageIdentifier";
    /// Identifier of the composite SSO secret.
    pub const SSO_SECRET_ARN: &str = "SsoSecretArn";
    /// Direct TLS endpoint of the worker sidecar.
    pub const WORKER_ENDPOINT: &str = "WorkerEndpoint";
}

/// Header name injected by the edge and required by the origin listener.
pub const ORIGIN_HEADER_NAME: &str = "X-Origin-Verify";

/// Header value injected by the edge and required by the origin listener.
///
/// Static and never rotated.
pub const ORIGIN_HEADER_VALUE: &str = "webui-edge-origin-7c1d";

/// Network address range.
const NETWORK_CIDR: &str = "10.0.0.0/16";

/// Availability zones spanned by the network.
const AVAILABILITY_ZONES: u8 = 2;

/// Symbolic name of the edge address range looked up in stage 5.
const EDGE_RANGE_NAME: &str = crate::lookup::EDGE_ORIGIN_FACING;

/// Shared state threaded through the stages.
struct Stage<'a> {
    /// Graph under construction.
    graph: GraphBuilder,
    /// Account, region and stack.
    context: &'a DeploymentContext,
    /// Resolved variants.
    decisions: Decisions,
}

/// The topology synthesizer.
pub struct Synthesizer<'a> {
    /// Address-range lookup used by the security stage.
    lookup: &'a dyn AddressRangeLookup,
}

impl std::fmt::Debug for Synthesizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer").finish_non_exhaustive()
    }
}

impl<'a> Synthesizer<'a> {
    /// Creates a synthesizer using the given lookup.
    #[must_use]
    pub const fn new(lookup: &'a dyn AddressRangeLookup) -> Self {
        Self { lookup }
    }

    /// Synthesizes the resource graph for a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SynthesisError::ExternalLookupFailed`] if the
    /// edge address range cannot be resolved.
    pub fn synthesize(
        &self,
        config: &Configuration,
        context: &DeploymentContext,
    ) -> Result<ResourceGraph> {
        let decisions = Decisions::resolve(config);
        info!(
            "Synthesizing {} (storage={:?}, sso={}, certificate={}, hostname={})",
            context.stack_name,
            decisions.storage,
            decisions.sso_enabled(),
            decisions.certificate().is_some(),
            decisions.custom_hostname().unwrap_or("edge-assigned"),
        );

        let mut stage = Stage {
            graph: GraphBuilder::new(),
            context,
            decisions,
        };

        let (network, cluster) = skeleton(&mut stage);
        let storage = storage::build(&mut stage, &network);
        let secrets = secrets::build(&mut stage);
        let draft = compute::draft(&stage, &storage, &secrets);
        let security = security::build(&mut stage, self.lookup, &network, &storage)?;
        let edge = edge::build(&mut stage, &security);

        let workload = compute::finalize(draft, &stage, &secrets, &edge.public_host);
        let workload_id = stage.graph.add_node(ids::WORKLOAD, Node::Workload(workload));
        stage.graph.add_edge(&cluster, &workload_id, Relation::Contains);

        emit_outputs(&mut stage, &storage, &secrets, &edge, &security);

        let graph = stage.graph.freeze();
        info!(
            "Synthesis complete: {} nodes, {} edges, {} outputs",
            graph.node_count(),
            graph.edges().len(),
            graph.outputs().len()
        );
        Ok(graph)
    }
}

/// Synthesizes a graph with the given lookup.
///
/// # Errors
///
/// See [`Synthesizer::synthesize`].
pub fn synthesize(
    config: &Configuration,
    context: &DeploymentContext,
    lookup: &dyn AddressRangeLookup,
) -> Result<ResourceGraph> {
    Synthesizer::new(lookup).synthesize(config, context)
}

/// Stage 1: network and cluster.
fn skeleton(stage: &mut Stage<'_>) -> (NodeId, NodeId) {
    let ctx = stage.context;

    let mut subnets = Vec::new();
    for (offset, tier) in [SubnetTier::Public, SubnetTier::Private].into_iter().enumerate() {
        for zone in 0..AVAILABILITY_ZONES {
            let index = offset * usize::from(AVAILABILITY_ZONES) + usize::from(zone);
            let tier_name = match tier {
                SubnetTier::Public => "public",
                SubnetTier::Private => "private",
            };
            subnets.push(Subnet {
                name: ctx.physical_name(&format!("{tier_name}-{zone}")),
                tier,
                zone_index: zone,
                cidr: format!("10.0.{index}.0/24"),
            });
        }
    }

    let network = stage.graph.add_node(
        ids::NETWORK,
        Node::Network(Network {
            name: ctx.physical_name("vpc"),
            cidr: NETWORK_CIDR.to_string(),
            availability_zones: AVAILABILITY_ZONES,
            subnets,
        }),
    );

    let cluster = stage.graph.add_node(
        ids::CLUSTER,
        Node::ComputeCluster(ComputeCluster {
            name: ctx.physical_name("cluster"),
            network: network.clone(),
        }),
    );
    stage.graph.add_edge(&network, &cluster, Relation::Contains);

    (network, cluster)
}

/// Stage 7: operator-facing outputs.
fn emit_outputs(
    stage: &mut Stage<'_>,
    storage: &storage::StorageWiring,
    secrets: &secrets::SecretWiring,
    edge: &edge::EdgeWiring,
    security: &security::SecurityWiring,
) {
    stage.graph.add_output(Output::new(
        outputs::EDGE_HOSTNAME,
        "Domain name assigned to the edge distribution",
        edge.distribution.attr("DomainName").token(),
    ));

    if let Some(host) = stage.decisions.custom_hostname() {
        let host = host.to_string();
        stage.graph.add_output(Output::new(
            outputs::CUSTOM_HOSTNAME,
            "Custom hostname bound to the edge distribution",
            host,
        ));
    }

    stage.graph.add_output(Output::new(
        outputs::STORAGE_IDENTIFIER,
        storage.description,
        storage.identifier.clone(),
    ));

    if let Some(sso) = &secrets.sso {
        stage.graph.add_output(Output::new(
            outputs::SSO_SECRET_ARN,
            "Secret holding the SSO client settings; set client_secret before first use",
            sso.attr("SecretArn").token(),
        ));
    }

    if edge.worker_listener.is_some() {
        stage.graph.add_output(Output::new(
            outputs::WORKER_ENDPOINT,
            "Direct TLS endpoint of the pipelines worker",
            format!(
                "https://{}:{}",
                security.load_balancer.attr("DNSName").token(),
                compute::WORKER_PORT
            ),
        ));
    }
}
