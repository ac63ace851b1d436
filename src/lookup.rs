//! Address-range discovery.
//!
//! The synthesizer needs the provider's edge-service address range to
//! restrict who may reach the public listener. It asks through the
//! [`AddressRangeLookup`] trait and uses the first result.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Result, SynthesisError, WebuiError};

/// Symbolic name of the edge service's origin-facing address range.
pub const EDGE_ORIGIN_FACING: &str = "com.amazonaws.global.cloudfront.origin-facing";

/// Published origin-facing prefix lists, by region.
const EDGE_PREFIX_LISTS: &[(&str, &str)] = &[
    ("ap-northeast-1", "pl-58a04531"),
    ("ap-northeast-2", "pl-22a6434b"),
    ("ap-south-1", "pl-9aa247f3"),
    ("ap-southeast-1", "pl-31a34658"),
    ("ap-southeast-2", "pl-b8a742d1"),
    ("ca-central-1", "pl-38a64351"),
    ("eu-central-1", "pl-a3a144ca"),
    ("eu-north-1", "pl-fab65393"),
    ("eu-west-1", "pl-4fa04526"),
    ("eu-west-2", "pl-93a247fa"),
    ("eu-west-3", "pl-75b1541c"),
    ("sa-east-1", "pl-5da64334"),
    ("us-east-1", "pl-3b927c52"),
    ("us-east-2", "pl-b6a144df"),
    ("us-west-1", "pl-4ea04527"),
    ("us-west-2", "pl-82a045eb"),
];

/// External, idempotent lookup of address ranges by symbolic name.
#[cfg_attr(test, mockall::automock)]
pub trait AddressRangeLookup: Send + Sync {
    /// Returns the address-range identifiers registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup cannot be performed.
    fn lookup(&self, name: &str) -> Result<Vec<String>>;
}

/// Lookup backed by the provider's published prefix-list table.
#[derive(Debug, Clone)]
pub struct StaticAddressRanges {
    /// Region the lookup answers for.
    region: String,
    /// Known ranges by symbolic name.
    table: BTreeMap<String, String>,
}

/// Lookup that answers every name with one fixed identifier.
#[derive(Debug, Clone)]
pub struct FixedAddressRange {
    /// The identifier returned.
    id: String,
}

impl StaticAddressRanges {
    /// Creates a lookup for the given region.
    #[must_use]
    pub fn for_region(region: impl Into<String>) -> Self {
        let region = region.into();
        let table = EDGE_PREFIX_LISTS
            .iter()
            .filter(|(r, _)| *r == region)
            .map(|(_, id)| (EDGE_ORIGIN_FACING.to_string(), (*id).to_string()))
            .collect();

        Self { region, table }
    }
}

impl AddressRangeLookup for StaticAddressRanges {
    fn lookup(&self, name: &str) -> Result<Vec<String>> {
        debug!("Looking up address range '{name}' in {}", self.region);
        self.table.get(name).map_or_else(
            || {
                Err(WebuiError::Synthesis(SynthesisError::lookup_failed(
                    name,
                    format!("no published address range in region {}", self.region),
                )))
            },
            |id| Ok(vec![id.clone()]),
        )
    }
}

impl FixedAddressRange {
    /// Creates a lookup returning `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl AddressRangeLookup for FixedAddressRange {
    fn lookup(&self, name: &str) -> Result<Vec<String>> {
        debug!("Address range '{name}' pinned to {}", self.id);
        Ok(vec![self.id.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_lookup_known_region() {
        let lookup = StaticAddressRanges::for_region("us-east-1");
        let ranges = lookup.lookup(EDGE_ORIGIN_FACING).unwrap();
        assert_eq!(ranges, vec![String::from("pl-3b927c52")]);
    }

    #[test]
    fn test_static_lookup_unknown_region_fails() {
        let lookup = StaticAddressRanges::for_region("mars-north-1");
        let err = lookup.lookup(EDGE_ORIGIN_FACING).unwrap_err();
        assert!(matches!(
            err,
            WebuiError::Synthesis(SynthesisError::ExternalLookupFailed { .. })
        ));
    }

    #[test]
    fn test_static_lookup_unknown_name_fails() {
        let lookup = StaticAddressRanges::for_region("us-east-1");
        assert!(lookup.lookup("com.example.unknown").is_err());
    }

    #[test]
    fn test_fixed_lookup() {
        let lookup = FixedAddressRange::new("pl-12345678");
        assert_eq!(lookup.lookup("anything").unwrap(), vec![String::from("pl-12345678")]);
    }
}
