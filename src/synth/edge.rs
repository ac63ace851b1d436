//! Stage 6: edge distribution and the worker's TLS listener.

use std::collections::BTreeMap;

use crate::graph::{
    EdgeDistribution, Listener, ListenerAction, ListenerProtocol, Node, NodeId, Relation, Target,
    ViewerProtocolPolicy,
};

use super::compute::{WORKER_CONTAINER, WORKER_PORT};
use super::security::SecurityWiring;
use super::{ids, Stage, ORIGIN_HEADER_NAME, ORIGIN_HEADER_VALUE};

/// Nodes and values later stages reference.
#[derive(Debug, Clone)]
pub struct EdgeWiring {
    /// Edge distribution.
    pub distribution: NodeId,
    /// Host viewers reach the deployment on.
    pub public_host: String,
    /// Worker TLS listener, when a certificate is configured.
    pub worker_listener: Option<NodeId>,
}

/// Emits the distribution and, with a certificate, the worker listener.
pub fn build(stage: &mut Stage<'_>, security: &SecurityWiring) -> EdgeWiring {
    let distribution = NodeId::new(ids::EDGE_DISTRIBUTION);
    let certificate = stage.decisions.certificate().map(String::from);
    let edge_certificate = stage.decisions.edge_certificate().map(String::from);
    let aliases = stage
        .decisions
        .custom_hostname()
        .map(|host| vec![host.to_string()])
        .unwrap_or_default();

    stage.graph.add_node(
        ids::EDGE_DISTRIBUTION,
        Node::EdgeDistribution(EdgeDistribution {
            origin: security.web_listener.clone(),
            origin_protocol: ListenerProtocol::Http,
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            certificate_arn: edge_certificate,
            aliases,
            origin_headers: BTreeMap::from([(
                ORIGIN_HEADER_NAME.to_string(),
                ORIGIN_HEADER_VALUE.to_string(),
            )]),
            domain_name: distribution.attr("DomainName"),
        }),
    );
    stage
        .graph
        .add_edge(&security.web_listener, &distribution, Relation::OriginOf);

    let worker_listener = certificate.map(|arn| {
        let workload = NodeId::new(ids::WORKLOAD);
        let id = stage.graph.add_node(
            ids::WORKER_LISTENER,
            Node::Listener(Listener {
                load_balancer: security.load_balancer.clone(),
                port: WORKER_PORT,
                protocol: ListenerProtocol::Https,
                certificate_arn: Some(arn),
                target: Target {
                    workload: workload.clone(),
                    container: WORKER_CONTAINER.to_string(),
                    port: WORKER_PORT,
                    health_check_path: String::from("/"),
                },
                default_action: ListenerAction::Forward,
            }),
        );
        stage
            .graph
            .add_edge(&security.load_balancer, &id, Relation::Contains);
        stage.graph.add_edge(&id, &workload, Relation::Targets);
        id
    });

    let public_host = stage.decisions.public_host(&distribution);

    EdgeWiring {
        distribution,
        public_host,
        worker_listener,
    }
}
