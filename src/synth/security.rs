//! Stage 5: security policy, load balancer and the compute-facing listener.
//!
//! Traffic reaches the workload only through the load balancer, and the
//! load balancer's public listener only from the edge service's published
//! address range. On top of that network rule, a header gate on the
//! listener forwards requests carrying the edge's origin header and answers
//! everything else with a fixed 403.

use tracing::debug;

use crate::error::{Result, SynthesisError, WebuiError};
use crate::graph::{
    AllowRule, FixedResponse, HeaderGate, Listener, ListenerAction, ListenerProtocol,
    LoadBalancer, Node, NodeId, Principal, Relation, SecurityPolicy, Target,
};
use crate::lookup::AddressRangeLookup;

use super::compute::{
    exposed_ports, PRIMARY_CONTAINER, PRIMARY_PORT, PROXY_CONTAINER, PROXY_PORT, WORKER_PORT,
};
use super::storage::StorageWiring;
use super::{ids, Stage, EDGE_RANGE_NAME, ORIGIN_HEADER_NAME, ORIGIN_HEADER_VALUE};

/// Port of the compute-facing listener.
pub const WEB_LISTENER_PORT: u16 = 80;

/// Nodes later stages reference.
#[derive(Debug, Clone)]
pub struct SecurityWiring {
    /// Load balancer.
    pub load_balancer: NodeId,
    /// Compute-facing listener, origin of the edge.
    pub web_listener: NodeId,
}

/// Fixed response for requests without the origin header.
#[must_use]
pub fn forbidden() -> FixedResponse {
    FixedResponse {
        status: 403,
        content_type: String::from("text/plain"),
        body: String::from("Forbidden"),
    }
}

/// Resolves the edge address range and emits the security sub-graph.
///
/// # Errors
///
/// Returns [`SynthesisError::ExternalLookupFailed`] if the lookup fails or
/// yields no result.
pub fn build(
    stage: &mut Stage<'_>,
    lookup: &dyn AddressRangeLookup,
    network: &NodeId,
    storage: &StorageWiring,
) -> Result<SecurityWiring> {
    let edge_range = resolve_edge_range(lookup)?;
    debug!("Edge origin-facing range resolved to {edge_range}");

    let ctx = stage.context;
    let sso = stage.decisions.sso_enabled();
    let workload = NodeId::new(ids::WORKLOAD);
    let load_balancer = NodeId::new(ids::LOAD_BALANCER);
    let web_listener = NodeId::new(ids::WEB_LISTENER);

    let mut rules = vec![AllowRule {
        from: Principal::AddressRange { id: edge_range },
        to: load_balancer.clone(),
        port: WEB_LISTENER_PORT,
        description: String::from("HTTP from the edge service"),
    }];
    if stage.decisions.certificate().is_some() {
        rules.push(AllowRule {
            from: Principal::AnyIpv4,
            to: load_balancer.clone(),
            port: WORKER_PORT,
            description: String::from("HTTPS to the pipelines worker"),
        });
    }
    rules.extend(exposed_ports(sso).into_iter().map(|port| AllowRule {
        from: Principal::Boundary {
            node: load_balancer.clone(),
        },
        to: workload.clone(),
        port,
        description: format!("Load balancer to container port {port}"),
    }));
    rules.extend(storage.allow_rules.iter().cloned());

    let gate = HeaderGate {
        listener: web_listener.clone(),
        header_name: ORIGIN_HEADER_NAME.to_string(),
        header_value: ORIGIN_HEADER_VALUE.to_string(),
        forward_to: workload.clone(),
        deny: forbidden(),
    };

    let policy = stage.graph.add_node(
        ids::SECURITY_POLICY,
        Node::SecurityPolicy(SecurityPolicy {
            name: ctx.physical_name("security"),
            rules,
            header_gates: vec![gate],
        }),
    );

    stage.graph.add_node(
        ids::LOAD_BALANCER,
        Node::LoadBalancer(LoadBalancer {
            name: ctx.physical_name("alb"),
            network: network.clone(),
            internet_facing: true,
        }),
    );
    stage.graph.add_edge(network, &load_balancer, Relation::Contains);

    let target = if sso {
        Target {
            workload: workload.clone(),
            container: PROXY_CONTAINER.to_string(),
            port: PROXY_PORT,
            health_check_path: String::from("/ping"),
        }
    } else {
        Target {
            workload: workload.clone(),
            container: PRIMARY_CONTAINER.to_string(),
            port: PRIMARY_PORT,
            health_check_path: String::from("/health"),
        }
    };

    stage.graph.add_node(
        ids::WEB_LISTENER,
        Node::Listener(Listener {
            load_balancer: load_balancer.clone(),
            port: WEB_LISTENER_PORT,
            protocol: ListenerProtocol::Http,
            certificate_arn: None,
            target,
            default_action: ListenerAction::Respond(forbidden()),
        }),
    );
    stage.graph.add_edge(&load_balancer, &web_listener, Relation::Contains);
    stage.graph.add_edge(&web_listener, &workload, Relation::Targets);

    stage.graph.add_edge(&policy, &load_balancer, Relation::Guards);
    stage.graph.add_edge(&policy, &web_listener, Relation::Guards);
    stage.graph.add_edge(&policy, &workload, Relation::Guards);
    if !storage.allow_rules.is_empty() {
        stage.graph.add_edge(&policy, &storage.binding, Relation::Guards);
    }

    Ok(SecurityWiring {
        load_balancer,
        web_listener,
    })
}

/// Looks up the edge range and takes the first result.
fn resolve_edge_range(lookup: &dyn AddressRangeLookup) -> Result<String> {
    let ranges = lookup.lookup(EDGE_RANGE_NAME).map_err(|e| match e {
        WebuiError::Synthesis(_) => e,
        other => SynthesisError::lookup_failed(EDGE_RANGE_NAME, other.to_string()).into(),
    })?;
    ranges.into_iter().next().ok_or_else(|| {
        SynthesisError::lookup_failed(EDGE_RANGE_NAME, "lookup returned no address range").into()
    })
}
