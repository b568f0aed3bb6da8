//! A deployment reconciliation engine for contract deployment scripts.
//!
//! Scripts drive three entry points on a [`Deployer`]:
//! - [`Deployer::resolve_kind`] maps a logical resource to the kind deployed
//!   on the active network
//! - [`Deployer::materialize_if_needed`] creates a resource only if the
//!   ledger has no record of it
//! - [`Deployer::apply_if_needed`] sends a configuration call only if the
//!   remote state is not already the desired one
//!
//! Each step is idempotent, so a script that dies part way through can be
//! re-run and will only perform the work that is still missing.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod client;
pub mod constants;
pub mod context;
mod deployer;
pub mod errors;
pub mod ledger;
mod materializer;
pub mod reconciler;
pub mod reporter;
pub mod resolver;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod types;

pub use deployer::Deployer;
