//! Stage 4 and the second pass of stage 6: the workload.
//!
//! The primary and worker containers are drafted before the security and
//! edge stages run. The SSO proxy needs the public host for its redirect
//! URI, so it is only added once the edge distribution exists; the workload
//! node is inserted into the graph after that.

use std::collections::BTreeMap;

use crate::graph::{Container, NodeId, SecretRef, Volume, Workload};

use super::secrets::{fields, SecretWiring};
use super::storage::{ContainerStorage, StorageWiring};
use super::{ids, SsoVariant, Stage};

/// Primary container name.
pub const PRIMARY_CONTAINER: &str = "open-webui";
/// Primary container image.
pub const PRIMARY_IMAGE: &str = "ghcr.io/open-webui/open-webui:main";
/// Primary container port.
pub const PRIMARY_PORT: u16 = 8080;

/// Worker container name.
pub const WORKER_CONTAINER: &str = "pipelines";
/// Worker container image.
pub const WORKER_IMAGE: &str = "ghcr.io/open-webui/pipelines:main";
/// Worker container port.
pub const WORKER_PORT: u16 = 9099;

/// Proxy container name.
pub const PROXY_CONTAINER: &str = "oauth2-proxy";
/// Proxy container image.
pub const PROXY_IMAGE: &str = "quay.io/oauth2-proxy/oauth2-proxy:v7.6.0";
/// Proxy container port.
pub const PROXY_PORT: u16 = 4180;

const TASK_CPU: u32 = 1024;
const TASK_MEMORY_MIB: u32 = 4096;

/// Workload under construction: everything except the proxy.
#[derive(Debug, Clone)]
pub struct WorkloadDraft {
    /// Primary and worker containers.
    containers: Vec<Container>,
    /// Volumes from the storage stage.
    volumes: Vec<Volume>,
}

/// Returns the container ports the load balancer may reach.
#[must_use]
pub fn exposed_ports(sso_enabled: bool) -> Vec<u16> {
    let mut ports = vec![PRIMARY_PORT, WORKER_PORT];
    if sso_enabled {
        ports.push(PROXY_PORT);
    }
    ports
}

/// First pass: drafts the primary and worker containers.
pub fn draft(stage: &Stage<'_>, storage: &StorageWiring, secrets: &SecretWiring) -> WorkloadDraft {
    let api_key = |secret: &NodeId| SecretRef {
        secret: secret.clone(),
        field: None,
    };

    let mut primary_env = BTreeMap::from([
        (
            String::from("OPENAI_API_BASE_URL"),
            format!("http://localhost:{WORKER_PORT}"),
        ),
        (
            String::from("WEBUI_AUTH"),
            String::from(if stage.decisions.sso_enabled() { "False" } else { "True" }),
        ),
    ]);
    if stage.decisions.sso_enabled() {
        primary_env.insert(
            String::from("WEBUI_AUTH_TRUSTED_EMAIL_HEADER"),
            String::from("X-Forwarded-Email"),
        );
    }

    let primary = container(
        PRIMARY_CONTAINER,
        PRIMARY_IMAGE,
        PRIMARY_PORT,
        primary_env,
        BTreeMap::from([(String::from("OPENAI_API_KEY"), api_key(&secrets.api_key))]),
        &storage.primary,
    );

    let worker = container(
        WORKER_CONTAINER,
        WORKER_IMAGE,
        WORKER_PORT,
        BTreeMap::new(),
        BTreeMap::from([(String::from("PIPELINES_API_KEY"), api_key(&secrets.api_key))]),
        &storage.worker,
    );

    WorkloadDraft {
        containers: vec![primary, worker],
        volumes: storage.volumes.clone(),
    }
}

/// Second pass: adds the proxy when SSO is enabled and completes the
/// workload.
pub fn finalize(
    draft: WorkloadDraft,
    stage: &Stage<'_>,
    secrets: &SecretWiring,
    public_host: &str,
) -> Workload {
    let WorkloadDraft {
        mut containers,
        volumes,
    } = draft;

    if let (SsoVariant::Enabled(_), Some(sso)) = (&stage.decisions.sso, &secrets.sso) {
        containers.push(proxy(sso, public_host));
    }

    Workload {
        family: stage.context.physical_name("webui"),
        cluster: NodeId::new(ids::CLUSTER),
        cpu: TASK_CPU,
        memory_mib: TASK_MEMORY_MIB,
        task_role: stage.context.physical_name("task-role"),
        containers,
        volumes,
    }
}

/// Builds the authentication proxy fronting the primary container.
fn proxy(sso: &NodeId, public_host: &str) -> Container {
    let field = |name: &str| SecretRef {
        secret: sso.clone(),
        field: Some(name.to_string()),
    };

    let environment = [
        ("OAUTH2_PROXY_PROVIDER", String::from("oidc")),
        ("OAUTH2_PROXY_HTTP_ADDRESS", format!("0.0.0.0:{PROXY_PORT}")),
        ("OAUTH2_PROXY_UPSTREAMS", format!("http://127.0.0.1:{PRIMARY_PORT}")),
        ("OAUTH2_PROXY_REDIRECT_URL", redirect_uri(public_host)),
        ("OAUTH2_PROXY_EMAIL_DOMAINS", String::from("*")),
        ("OAUTH2_PROXY_COOKIE_SECURE", String::from("true")),
        ("OAUTH2_PROXY_REVERSE_PROXY", String::from("true")),
        ("OAUTH2_PROXY_SET_XAUTHREQUEST", String::from("true")),
        ("OAUTH2_PROXY_PASS_USER_HEADERS", String::from("true")),
        ("OAUTH2_PROXY_SKIP_PROVIDER_BUTTON", String::from("true")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let secrets = [
        ("OAUTH2_PROXY_OIDC_ISSUER_URL", fields::PROVIDER_URL),
        ("OAUTH2_PROXY_CLIENT_ID", fields::CLIENT_ID),
        ("OAUTH2_PROXY_CLIENT_SECRET", fields::CLIENT_SECRET),
        ("OAUTH2_PROXY_COOKIE_SECRET", fields::COOKIE_SECRET),
    ]
    .into_iter()
    .map(|(k, f)| (k.to_string(), field(f)))
    .collect();

    Container {
        name: PROXY_CONTAINER.to_string(),
        image: PROXY_IMAGE.to_string(),
        port: Some(PROXY_PORT),
        essential: true,
        environment,
        secrets,
        mounts: Vec::new(),
    }
}

/// Returns the proxy's OAuth callback URI for a public host.
#[must_use]
pub fn redirect_uri(public_host: &str) -> String {
    format!("https://{public_host}/oauth2/callback")
}

fn container(
    name: &str,
    image: &str,
    port: u16,
    mut environment: BTreeMap<String, String>,
    secrets: BTreeMap<String, SecretRef>,
    storage: &ContainerStorage,
) -> Container {
    environment.extend(storage.environment.clone());
    Container {
        name: name.to_string(),
        image: image.to_string(),
        port: Some(port),
        essential: true,
        environment,
        secrets,
        mounts: storage.mounts.clone(),
    }
}
