// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![warn(dead_code)]                   // Unused code is flagged
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![warn(unused_imports)]              // Unused imports are flagged
#![warn(unused_variables)]            // Unused variables are flagged
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # webui-topology
//!
//! A deterministic synthesizer for the resource graph of an edge-fronted
//! Open WebUI + Pipelines deployment.
//!
//! ## Overview
//!
//! A small configuration document (certificate, optional hostname, storage
//! backend, optional SSO) is turned into a typed graph of infrastructure
//! resources: a network, a container cluster running one co-scheduled
//! workload, storage, secrets, a load balancer with its listeners, a
//! security policy and an edge distribution. The graph is pure data; a
//! provisioning backend renders it.
//!
//! The same inputs always yield the same graph. Values only the provider
//! knows after deployment are carried as [`graph::AttrRef`] tokens.
//!
//! ## Modules
//!
//! - [`config`]: Document parsing, validation and the deployment context
//! - [`collector`]: Interactive and flag-driven configuration collection
//! - [`synth`]: The staged synthesis pipeline
//! - [`graph`]: Resource graph types and graph diffing
//! - [`lookup`]: External address-range lookup
//! - [`artifact`]: Storage of synthesized graphs (local, S3)
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! acm_cert_arn: arn:aws:acm:us-east-1:123456789012:certificate/abcd-1234
//! storage_type: s3
//! hostname: chat.example.com
//! sso:
//!   provider_url: https://login.example.com/realms/main
//!   client_id: webui
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod artifact;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod graph;
pub mod lookup;
pub mod synth;

// ============================================================================
// Re-exports
// ============================================================================

pub use artifact::{ArtifactStore, LocalArtifactStore, S3ArtifactStore, SynthArtifact};
pub use cli::{Cli, Commands, OutputFormatter};
pub use collector::{CollectedFields, Collector};
pub use config::{ConfigHasher, ConfigParser, ConfigValidator, Configuration, DeploymentContext};
pub use error::{Result, WebuiError};
pub use graph::{GraphDiff, GraphDiffEngine, ResourceGraph};
pub use lookup::{AddressRangeLookup, FixedAddressRange, StaticAddressRanges};
pub use synth::{synthesize, Synthesizer};
