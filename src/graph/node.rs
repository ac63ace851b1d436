//! Typed nodes of the resource graph.
//!
//! Nodes never embed one another; every cross-reference is a [`NodeId`].
//! Values only known once the graph is realized (a distribution's domain
//! name, a bucket's ARN) are written as [`AttrRef`] tokens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stable identifier of a node within one graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a late-bound reference to one of this node's attributes.
    #[must_use]
    pub fn attr(&self, attribute: &str) -> AttrRef {
        AttrRef {
            node: self.clone(),
            attribute: attribute.to_string(),
        }
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to an attribute resolved by the realization backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrRef {
    /// Node owning the attribute.
    pub node: NodeId,
    /// Attribute name.
    pub attribute: String,
}

impl AttrRef {
    /// Renders the reference as an embeddable `${node.Attribute}` token.
    #[must_use]
    pub fn token(&self) -> String {
        format!("${{{}.{}}}", self.node, self.attribute)
    }
}

impl std::fmt::Display for AttrRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token())
    }
}

/// A node of the resource graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Node {
    /// Network boundary.
    Network(Network),
    /// Container cluster.
    ComputeCluster(ComputeCluster),
    /// Co-scheduled container task.
    Workload(Workload),
    /// Storage binding (exactly one variant per graph).
    StorageBinding(StorageBinding),
    /// Provider-managed secret.
    SecretRecord(SecretRecord),
    /// Allow-rules and header gates.
    SecurityPolicy(SecurityPolicy),
    /// Public load balancer.
    LoadBalancer(LoadBalancer),
    /// Load balancer listener.
    Listener(Listener),
    /// Edge distribution.
    EdgeDistribution(EdgeDistribution),
}

/// Discriminant of [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// See [`Network`].
    Network,
    /// See [`ComputeCluster`].
    ComputeCluster,
    /// See [`Workload`].
    Workload,
    /// See [`StorageBinding`].
    StorageBinding,
    /// See [`SecretRecord`].
    SecretRecord,
    /// See [`SecurityPolicy`].
    SecurityPolicy,
    /// See [`LoadBalancer`].
    LoadBalancer,
    /// See [`Listener`].
    Listener,
    /// See [`EdgeDistribution`].
    EdgeDistribution,
}

impl Node {
    /// Returns the kind of this node.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Network(_) => NodeKind::Network,
            Self::ComputeCluster(_) => NodeKind::ComputeCluster,
            Self::Workload(_) => NodeKind::Workload,
            Self::StorageBinding(_) => NodeKind::StorageBinding,
            Self::SecretRecord(_) => NodeKind::SecretRecord,
            Self::SecurityPolicy(_) => NodeKind::SecurityPolicy,
            Self::LoadBalancer(_) => NodeKind::LoadBalancer,
            Self::Listener(_) => NodeKind::Listener,
            Self::EdgeDistribution(_) => NodeKind::EdgeDistribution,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::ComputeCluster => "compute-cluster",
            Self::Workload => "workload",
            Self::StorageBinding => "storage-binding",
            Self::SecretRecord => "secret",
            Self::SecurityPolicy => "security-policy",
            Self::LoadBalancer => "load-balancer",
            Self::Listener => "listener",
            Self::EdgeDistribution => "edge-distribution",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// Network and compute
// ============================================================================

/// Network boundary spanning several availability zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Physical name.
    pub name: String,
    /// Address range of the whole network.
    pub cidr: String,
    /// Number of availability zones used.
    pub availability_zones: u8,
    /// Subnets, one per tier per zone.
    pub subnets: Vec<Subnet>,
}

/// A subnet of the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    /// Physical name.
    pub name: String,
    /// Routing tier.
    pub tier: SubnetTier,
    /// Zero-based availability zone index.
    pub zone_index: u8,
    /// Subnet address range.
    pub cidr: String,
}

/// Subnet routing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetTier {
    /// Routed to an internet gateway.
    Public,
    /// Egress through NAT only.
    Private,
}

/// Container cluster bound to a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeCluster {
    /// Physical name.
    pub name: String,
    /// Network the cluster places tasks in.
    pub network: NodeId,
}

/// A co-scheduled set of containers sharing network identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    /// Task family name.
    pub family: String,
    /// Owning cluster.
    pub cluster: NodeId,
    /// CPU units.
    pub cpu: u32,
    /// Memory in MiB.
    pub memory_mib: u32,
    /// Name of the identity the task runs as.
    pub task_role: String,
    /// Container slots, primary first.
    pub containers: Vec<Container>,
    /// Volumes declared by the task.
    pub volumes: Vec<Volume>,
}

/// A single container slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Container name, unique within the workload.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Exposed port, if any.
    pub port: Option<u16>,
    /// Whether the task stops when this container stops.
    pub essential: bool,
    /// Plain environment variables.
    pub environment: BTreeMap<String, String>,
    /// Environment variables sourced from secrets.
    pub secrets: BTreeMap<String, SecretRef>,
    /// Volume mounts.
    pub mounts: Vec<Mount>,
}

/// Reference from a container into a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    /// Secret node.
    pub secret: NodeId,
    /// JSON key inside a composite secret, if any.
    pub field: Option<String>,
}

/// Volume declared on a workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Volume name referenced by mounts.
    pub name: String,
    /// Storage binding backing the volume.
    pub storage: NodeId,
    /// Access point carved out of the binding.
    pub access_point: String,
}

/// A volume mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// Volume name.
    pub volume: String,
    /// Path inside the container.
    pub container_path: String,
    /// Whether the mount is read-only.
    pub read_only: bool,
}

// ============================================================================
// Storage
// ============================================================================

/// Storage binding; exactly one variant is active per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant")]
pub enum StorageBinding {
    /// Shared filesystem with access points.
    Filesystem(FilesystemBinding),
    /// Object bucket with identity-scoped grants.
    ObjectStore(ObjectStoreBinding),
}

/// Shared POSIX-like volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemBinding {
    /// Physical name.
    pub name: String,
    /// Encryption at rest.
    pub encrypted: bool,
    /// Network the mount targets live in.
    pub network: NodeId,
    /// Address range allowed to reach the mount targets.
    pub authorized_cidr: String,
    /// Port mount targets listen on.
    pub port: u16,
    /// Per-service access points.
    pub access_points: Vec<AccessPoint>,
}

/// Ownership-restricted entry into the shared filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPoint {
    /// Access point name.
    pub name: String,
    /// Root directory path.
    pub path: String,
    /// Owning user id.
    pub owner_uid: u32,
    /// Owning group id.
    pub owner_gid: u32,
    /// Octal permission string.
    pub permissions: String,
    /// Container the access point is carved out for.
    pub container: String,
}

/// Namespaced object bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStoreBinding {
    /// Bucket name.
    pub bucket_name: String,
    /// Whether every form of public access is blocked.
    pub block_public_access: bool,
    /// Encryption at rest.
    pub encryption: Encryption,
    /// Grants, one per action.
    pub grants: Vec<ObjectGrant>,
}

/// Encryption at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encryption {
    /// Keys managed by the provider.
    ProviderManaged,
}

/// A single object-store permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectGrant {
    /// Principal receiving the grant.
    pub principal: NodeId,
    /// Allowed action.
    pub action: ObjectAction,
    /// Resources covered (bucket and contents).
    pub resources: Vec<String>,
}

/// Object-store actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectAction {
    /// Read objects.
    Get,
    /// Write objects.
    Put,
    /// List the bucket.
    List,
    /// Delete objects.
    Delete,
}

impl ObjectAction {
    /// Every action, in grant order.
    pub const ALL: [Self; 4] = [Self::Get, Self::Put, Self::List, Self::Delete];

    /// Returns the provider action name.
    #[must_use]
    pub const fn provider_action(self) -> &'static str {
        match self {
            Self::Get => "s3:GetObject",
            Self::Put => "s3:PutObject",
            Self::List => "s3:ListBucket",
            Self::Delete => "s3:DeleteObject",
        }
    }
}

// ============================================================================
// Secrets
// ============================================================================

/// Provider-managed credential container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Physical secret name.
    pub name: String,
    /// Description.
    pub description: String,
    /// How the secret value comes to exist.
    pub value: SecretValue,
    /// Principals allowed to read the secret.
    pub readers: Vec<NodeId>,
}

/// Secret value recipe. Generated material is never stored in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecretValue {
    /// A single generated string.
    Generated {
        /// Length of the generated value.
        length: u16,
        /// Whether punctuation is excluded.
        exclude_punctuation: bool,
    },
    /// A JSON document seeded with known fields plus one generated field.
    Composite {
        /// Seeded non-generated fields.
        seed: BTreeMap<String, String>,
        /// Key of the generated field.
        generated_key: String,
        /// Length of the generated field.
        generated_length: u16,
    },
}

// ============================================================================
// Security and load balancing
// ============================================================================

/// Directional allow-rules plus header gates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    /// Physical name.
    pub name: String,
    /// Allow-rules; anything not allowed is denied.
    pub rules: Vec<AllowRule>,
    /// Application-layer header gates.
    pub header_gates: Vec<HeaderGate>,
}

/// One directional allow-rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowRule {
    /// Traffic source.
    pub from: Principal,
    /// Boundary receiving the traffic.
    pub to: NodeId,
    /// Destination port.
    pub port: u16,
    /// Human-readable reason.
    pub description: String,
}

/// Source of allowed traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Principal {
    /// A provider-managed address range (prefix list).
    AddressRange {
        /// Address range identifier.
        id: String,
    },
    /// A literal CIDR block.
    Cidr {
        /// CIDR block.
        cidr: String,
    },
    /// Any IPv4 address.
    AnyIpv4,
    /// Another node's security boundary.
    Boundary {
        /// Node whose boundary is the source.
        node: NodeId,
    },
}

/// Header-keyed allow-rule attached to a listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderGate {
    /// Listener the gate is attached to.
    pub listener: NodeId,
    /// Required header name.
    pub header_name: String,
    /// Required header value.
    pub header_value: String,
    /// Workload requests are forwarded to when the header matches.
    pub forward_to: NodeId,
    /// Response for requests without the header.
    pub deny: FixedResponse,
}

/// Fixed HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedResponse {
    /// Status code.
    pub status: u16,
    /// Content type.
    pub content_type: String,
    /// Body.
    pub body: String,
}

/// Public load balancer in front of the workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    /// Physical name.
    pub name: String,
    /// Network the balancer lives in.
    pub network: NodeId,
    /// Whether the balancer has public addresses.
    pub internet_facing: bool,
}

/// A load balancer listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    /// Owning load balancer.
    pub load_balancer: NodeId,
    /// Listening port.
    pub port: u16,
    /// Listener protocol.
    pub protocol: ListenerProtocol,
    /// Certificate terminating TLS, for HTTPS listeners.
    pub certificate_arn: Option<String>,
    /// Forwarding target.
    pub target: Target,
    /// Action for requests matching no rule.
    pub default_action: ListenerAction,
}

/// Listener protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListenerProtocol {
    /// Plain HTTP.
    Http,
    /// TLS-terminated HTTP.
    Https,
}

/// Container a listener forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Workload node.
    pub workload: NodeId,
    /// Container name.
    pub container: String,
    /// Container port.
    pub port: u16,
    /// Health check path.
    pub health_check_path: String,
}

/// What a listener does with unmatched requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListenerAction {
    /// Forward to the target.
    Forward,
    /// Answer with a fixed response.
    Respond(FixedResponse),
}

// ============================================================================
// Edge
// ============================================================================

/// Globally distributed front door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDistribution {
    /// Origin listener.
    pub origin: NodeId,
    /// Protocol used towards the origin.
    pub origin_protocol: ListenerProtocol,
    /// Viewer protocol policy.
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    /// Certificate for custom hostnames.
    pub certificate_arn: Option<String>,
    /// Custom hostnames.
    pub aliases: Vec<String>,
    /// Headers injected into every origin request.
    pub origin_headers: BTreeMap<String, String>,
    /// Domain name assigned by the provider.
    pub domain_name: AttrRef,
}

/// Viewer protocol policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerProtocolPolicy {
    /// Plain HTTP is redirected to HTTPS.
    RedirectToHttps,
}

// ============================================================================
// Edges and outputs
// ============================================================================

/// A directed, typed relation between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    /// Source node.
    pub from: NodeId,
    /// Destination node.
    pub to: NodeId,
    /// Relation type.
    pub relation: Relation,
}

/// Relation carried by an [`Edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Source places or owns the destination.
    Contains,
    /// Source mounts storage from the destination.
    Mounts,
    /// Source reads from the destination.
    Reads,
    /// Source is granted object access on the destination.
    Writes,
    /// Source forwards traffic to the destination.
    Targets,
    /// Source is the origin of the destination distribution.
    OriginOf,
    /// Source policy guards the destination.
    Guards,
}

/// A named post-synthesis value surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Output name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Value, possibly containing attribute tokens.
    pub value: String,
}

impl Output {
    /// Creates a new output.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value: value.into(),
        }
    }
}
