//! Stage 2: storage binding.

use std::collections::BTreeMap;

use crate::graph::{
    AccessPoint, AllowRule, Encryption, FilesystemBinding, Mount, Node, NodeId, ObjectAction,
    ObjectGrant, ObjectStoreBinding, Principal, Relation, StorageBinding, Volume,
};

use super::compute::{PRIMARY_CONTAINER, WORKER_CONTAINER};
use super::{ids, Stage, StorageVariant, NETWORK_CIDR};

/// Port the filesystem mount targets listen on.
pub const NFS_PORT: u16 = 2049;

/// UID and GID owning both access points.
const DATA_OWNER: u32 = 1000;

/// Permissions of both access point roots.
const DATA_PERMISSIONS: &str = "750";

/// Data path inside the primary container.
pub const PRIMARY_DATA_PATH: &str = "/app/backend/data";

/// Data path inside the worker container.
pub const WORKER_DATA_PATH: &str = "/app/pipelines";

/// Storage settings a single container receives.
#[derive(Debug, Clone, Default)]
pub struct ContainerStorage {
    /// Environment variables to add.
    pub environment: BTreeMap<String, String>,
    /// Volume mounts to add.
    pub mounts: Vec<Mount>,
}

/// What the storage stage hands to later stages.
#[derive(Debug, Clone)]
pub struct StorageWiring {
    /// Storage binding node.
    pub binding: NodeId,
    /// Value of the storage identifier output.
    pub identifier: String,
    /// Description of the storage identifier output.
    pub description: &'static str,
    /// Settings for the primary container.
    pub primary: ContainerStorage,
    /// Settings for the worker container.
    pub worker: ContainerStorage,
    /// Volumes the workload declares.
    pub volumes: Vec<Volume>,
    /// Allow-rules the security policy must carry.
    pub allow_rules: Vec<AllowRule>,
}

/// Emits exactly one storage binding and its workload wiring.
pub fn build(stage: &mut Stage<'_>, network: &NodeId) -> StorageWiring {
    match stage.decisions.storage {
        StorageVariant::SharedFilesystem => shared_filesystem(stage, network),
        StorageVariant::ObjectStore => object_store(stage),
    }
}

fn shared_filesystem(stage: &mut Stage<'_>, network: &NodeId) -> StorageWiring {
    let workload = NodeId::new(ids::WORKLOAD);
    let access_point = |name: &str, container: &str| AccessPoint {
        name: name.to_string(),
        path: format!("/{name}"),
        owner_uid: DATA_OWNER,
        owner_gid: DATA_OWNER,
        permissions: DATA_PERMISSIONS.to_string(),
        container: container.to_string(),
    };

    let binding = stage.graph.add_node(
        ids::FILE_SYSTEM,
        Node::StorageBinding(StorageBinding::Filesystem(FilesystemBinding {
            name: stage.context.physical_name("data"),
            encrypted: true,
            network: network.clone(),
            authorized_cidr: NETWORK_CIDR.to_string(),
            port: NFS_PORT,
            access_points: vec![
                access_point("openwebui", PRIMARY_CONTAINER),
                access_point("pipelines", WORKER_CONTAINER),
            ],
        })),
    );
    stage.graph.add_edge(network, &binding, Relation::Contains);
    stage.graph.add_edge(&workload, &binding, Relation::Mounts);

    let volume = |name: &str, access_point: &str| Volume {
        name: name.to_string(),
        storage: binding.clone(),
        access_point: access_point.to_string(),
    };
    let mount = |volume: &str, path: &str| ContainerStorage {
        environment: BTreeMap::new(),
        mounts: vec![Mount {
            volume: volume.to_string(),
            container_path: path.to_string(),
            read_only: false,
        }],
    };

    StorageWiring {
        identifier: binding.attr("FileSystemId").token(),
        description: "Identifier of the shared filesystem",
        primary: mount("openwebui-data", PRIMARY_DATA_PATH),
        worker: mount("pipelines-data", WORKER_DATA_PATH),
        volumes: vec![
            volume("openwebui-data", "openwebui"),
            volume("pipelines-data", "pipelines"),
        ],
        allow_rules: vec![AllowRule {
            from: Principal::Cidr {
                cidr: NETWORK_CIDR.to_string(),
            },
            to: binding.clone(),
            port: NFS_PORT,
            description: String::from("NFS from inside the network"),
        }],
        binding,
    }
}

fn object_store(stage: &mut Stage<'_>) -> StorageWiring {
    let ctx = stage.context;
    let workload = NodeId::new(ids::WORKLOAD);
    let bucket_name = bucket_name(&ctx.stack_name, &ctx.account, &ctx.region);
    let bucket_arn = NodeId::new(ids::OBJECT_STORE).attr("Arn").token();

    let grants = ObjectAction::ALL
        .into_iter()
        .map(|action| ObjectGrant {
            principal: workload.clone(),
            action,
            resources: vec![bucket_arn.clone(), format!("{bucket_arn}/*")],
        })
        .collect();

    let binding = stage.graph.add_node(
        ids::OBJECT_STORE,
        Node::StorageBinding(StorageBinding::ObjectStore(ObjectStoreBinding {
            bucket_name: bucket_name.clone(),
            block_public_access: true,
            encryption: Encryption::ProviderManaged,
            grants,
        })),
    );
    stage.graph.add_edge(&workload, &binding, Relation::Writes);

    let env = ContainerStorage {
        environment: BTreeMap::from([
            (String::from("STORAGE_PROVIDER"), String::from("s3")),
            (String::from("S3_BUCKET_NAME"), bucket_name.clone()),
            (String::from("S3_REGION_NAME"), ctx.region.clone()),
        ]),
        mounts: Vec::new(),
    };

    StorageWiring {
        binding,
        identifier: bucket_name,
        description: "Name of the object-store bucket",
        primary: env.clone(),
        worker: env,
        volumes: Vec::new(),
        allow_rules: Vec::new(),
    }
}

/// Derives a globally unique, lowercase bucket name.
fn bucket_name(stack: &str, account: &str, region: &str) -> String {
    format!("{stack}-data-{account}-{region}").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_name_is_lowercase() {
        assert_eq!(
            bucket_name("WebUI", "123456789012", "eu-west-1"),
            "webui-data-123456789012-eu-west-1"
        );
    }
}
