//! Variant resolution.
//!
//! Every optional input is resolved once into a [`Decisions`] record before
//! any node is emitted; stages branch on the record, never on raw options.

use crate::config::{Configuration, SsoConfig, StorageBackend};
use crate::graph::NodeId;

/// Resolved variants for one synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decisions {
    /// Storage sub-graph to emit.
    pub storage: StorageVariant,
    /// Single-sign-on sub-graph to emit.
    pub sso: SsoVariant,
    /// TLS listener variant.
    pub tls: TlsVariant,
    /// Hostname the edge distribution answers on.
    pub hostname: HostnameVariant,
}

/// Storage variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageVariant {
    /// Shared filesystem with access points and mounts.
    SharedFilesystem,
    /// Object bucket wired through environment variables.
    ObjectStore,
}

/// Single-sign-on variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsoVariant {
    /// No proxy, no SSO secret.
    Disabled,
    /// Proxy sidecar and composite secret.
    Enabled(SsoConfig),
}

/// TLS variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsVariant {
    /// No certificate: edge only, no worker listener.
    Plain,
    /// Certificate on the worker listener, and on the edge when a custom
    /// hostname is also configured.
    Certificate(String),
}

/// Edge hostname variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostnameVariant {
    /// Only the provider-assigned domain name.
    EdgeAssigned,
    /// A custom hostname bound as an alias.
    Custom(String),
}

impl Decisions {
    /// Resolves every variant from a validated configuration.
    #[must_use]
    pub fn resolve(config: &Configuration) -> Self {
        let storage = match config.storage_backend {
            StorageBackend::SharedFilesystem => StorageVariant::SharedFilesystem,
            StorageBackend::ObjectStore => StorageVariant::ObjectStore,
        };
        let sso = config
            .sso
            .clone()
            .map_or(SsoVariant::Disabled, SsoVariant::Enabled);
        let tls = config
            .certificate_arn
            .clone()
            .map_or(TlsVariant::Plain, TlsVariant::Certificate);
        let hostname = config
            .hostname
            .clone()
            .map_or(HostnameVariant::EdgeAssigned, HostnameVariant::Custom);

        Self {
            storage,
            sso,
            tls,
            hostname,
        }
    }

    /// Returns true if the SSO proxy is part of the workload.
    #[must_use]
    pub const fn sso_enabled(&self) -> bool {
        matches!(self.sso, SsoVariant::Enabled(_))
    }

    /// Returns the certificate, if any.
    #[must_use]
    pub fn certificate(&self) -> Option<&str> {
        match &self.tls {
            TlsVariant::Plain => None,
            TlsVariant::Certificate(arn) => Some(arn),
        }
    }

    /// Returns the certificate the edge distribution binds.
    ///
    /// The edge only serves a certificate for a custom hostname, so this is
    /// `None` unless both are configured.
    #[must_use]
    pub fn edge_certificate(&self) -> Option<&str> {
        self.custom_hostname().and(self.certificate())
    }

    /// Returns the custom hostname, if any.
    #[must_use]
    pub fn custom_hostname(&self) -> Option<&str> {
        match &self.hostname {
            HostnameVariant::EdgeAssigned => None,
            HostnameVariant::Custom(host) => Some(host),
        }
    }

    /// Returns the host viewers reach: the custom hostname if set,
    /// otherwise the distribution's assigned domain name.
    #[must_use]
    pub fn public_host(&self, distribution: &NodeId) -> String {
        self.custom_hostname().map_or_else(
            || distribution.attr("DomainName").token(),
            String::from,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let decisions = Decisions::resolve(&Configuration::default());
        assert_eq!(decisions.storage, StorageVariant::SharedFilesystem);
        assert_eq!(decisions.sso, SsoVariant::Disabled);
        assert_eq!(decisions.tls, TlsVariant::Plain);
        assert_eq!(decisions.hostname, HostnameVariant::EdgeAssigned);
    }

    #[test]
    fn test_edge_certificate_needs_hostname() {
        let arn = String::from("arn:aws:acm:us-east-1:123456789012:certificate/abc");
        let cert_only = Decisions::resolve(&Configuration {
            certificate_arn: Some(arn.clone()),
            ..Configuration::default()
        });
        assert_eq!(cert_only.certificate(), Some(arn.as_str()));
        assert_eq!(cert_only.edge_certificate(), None);

        let both = Decisions::resolve(&Configuration {
            certificate_arn: Some(arn.clone()),
            hostname: Some(String::from("chat.example.com")),
            ..Configuration::default()
        });
        assert_eq!(both.edge_certificate(), Some(arn.as_str()));

        let host_only = Decisions::resolve(&Configuration {
            hostname: Some(String::from("chat.example.com")),
            ..Configuration::default()
        });
        assert_eq!(host_only.edge_certificate(), None);
    }

    #[test]
    fn test_public_host_prefers_custom_hostname() {
        let edge = NodeId::new("edge-distribution");
        let custom = Decisions::resolve(&Configuration {
            hostname: Some(String::from("chat.example.com")),
            ..Configuration::default()
        });
        assert_eq!(custom.public_host(&edge), "chat.example.com");

        let assigned = Decisions::resolve(&Configuration::default());
        assert_eq!(assigned.public_host(&edge), "${edge-distribution.DomainName}");
    }
}
