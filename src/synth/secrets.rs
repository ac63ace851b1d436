//! Stage 3: secrets.
//!
//! Secrets carry generation recipes only. The SSO client secret is seeded
//! with a placeholder the operator replaces after deployment.

use std::collections::BTreeMap;

use crate::graph::{Node, NodeId, Relation, SecretRecord, SecretValue};

use super::{ids, SsoVariant, Stage};

/// Length of the generated API key.
const API_KEY_LENGTH: u16 = 32;

/// Length of the generated proxy cookie secret.
const COOKIE_SECRET_LENGTH: u16 = 32;

/// Placeholder seeded into the SSO secret's client secret field.
pub const CLIENT_SECRET_PLACEHOLDER: &str = "REPLACE_WITH_CLIENT_SECRET";

/// Composite secret field names.
pub mod fields {
    /// Identity provider issuer URL.
    pub const PROVIDER_URL: &str = "provider_url";
    /// OAuth client identifier.
    pub const CLIENT_ID: &str = "client_id";
    /// OAuth client secret.
    pub const CLIENT_SECRET: &str = "client_secret";
    /// Generated cookie secret.
    pub const COOKIE_SECRET: &str = "cookie_secret";
}

/// Secret nodes later stages reference.
#[derive(Debug, Clone)]
pub struct SecretWiring {
    /// Shared API key.
    pub api_key: NodeId,
    /// Composite SSO secret, when SSO is enabled.
    pub sso: Option<NodeId>,
}

/// Emits the API key and, with SSO, the composite secret.
pub fn build(stage: &mut Stage<'_>) -> SecretWiring {
    let workload = NodeId::new(ids::WORKLOAD);

    let api_key = stage.graph.add_node(
        ids::API_KEY_SECRET,
        Node::SecretRecord(SecretRecord {
            name: stage.context.physical_name("pipelines-api-key"),
            description: String::from("API key shared by Open WebUI and Pipelines"),
            value: SecretValue::Generated {
                length: API_KEY_LENGTH,
                exclude_punctuation: true,
            },
            readers: vec![workload.clone()],
        }),
    );
    stage.graph.add_edge(&workload, &api_key, Relation::Reads);

    let sso = match &stage.decisions.sso {
        SsoVariant::Disabled => None,
        SsoVariant::Enabled(sso) => {
            let seed = BTreeMap::from([
                (fields::PROVIDER_URL.to_string(), sso.provider_url.clone()),
                (fields::CLIENT_ID.to_string(), sso.client_id.clone()),
                (
                    fields::CLIENT_SECRET.to_string(),
                    CLIENT_SECRET_PLACEHOLDER.to_string(),
                ),
            ]);
            let record = SecretRecord {
                name: stage.context.physical_name("sso"),
                description: String::from("SSO client settings for the authentication proxy"),
                value: SecretValue::Composite {
                    seed,
                    generated_key: fields::COOKIE_SECRET.to_string(),
                    generated_length: COOKIE_SECRET_LENGTH,
                },
                readers: vec![workload.clone()],
            };
            let id = stage.graph.add_node(ids::SSO_SECRET, Node::SecretRecord(record));
            stage.graph.add_edge(&workload, &id, Relation::Reads);
            Some(id)
        }
    };

    SecretWiring { api_key, sso }
}
