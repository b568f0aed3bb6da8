//! Definitions of errors that can occur while reconciling a deployment

use std::path::PathBuf;

use alloy_primitives::Address;
use thiserror::Error;

/// Errors surfaced by a [`LedgerClient`](crate::client::LedgerClient) or an
/// [`UpgradeManager`](crate::client::UpgradeManager)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The network did not answer in time
    #[error("network call timed out: {0}")]
    Timeout(String),
    /// The network refused the transaction before executing it,
    /// e.g. insufficient funds or a bad nonce
    #[error("transaction rejected: {0}")]
    Rejected(String),
    /// The transaction was executed and reverted
    #[error("transaction reverted: {0}")]
    Reverted(String),
    /// The response could not be decoded
    #[error("error decoding response: {0}")]
    Decoding(String),
    /// Any other transport level failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors reading or writing the deployment ledger
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error reading a ledger partition
    #[error("error reading deployments at {}: {source}", .path.display())]
    Read {
        /// The partition file
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },
    /// Error writing a ledger partition
    #[error("error writing deployments at {}: {source}", .path.display())]
    Write {
        /// The partition file
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },
    /// A ledger partition exists but is not a valid deployments document
    #[error("malformed deployments at {}: {source}", .path.display())]
    Malformed {
        /// The partition file
        path: PathBuf,
        /// The underlying parse error
        source: serde_json::Error,
    },
}

/// Errors in the static deployment configuration, all raised before any
/// network call is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The network name is not one the resolver knows about
    #[error("unknown network `{0}`")]
    UnknownNetwork(String),
    /// The market is not deployed on the given network
    #[error("market `{market}` is not supported on {network}")]
    UnknownMarket {
        /// The requested network
        network: String,
        /// The requested market
        market: String,
    },
    /// The logical resource name has no kind mapping
    #[error("unknown resource kind `{0}`")]
    UnknownKind(String),
    /// The kind's artifact is missing or cannot be parsed
    #[error("error loading artifact for `{kind}`: {reason}")]
    Artifact {
        /// The kind whose artifact failed to load
        kind: String,
        /// What went wrong
        reason: String,
    },
}

/// Errors that abort a deployment script
///
/// Every variant names the resource or configuration step it came from so
/// an operator can match the failure to the step that produced it.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The network rejected the creation of a resource
    #[error("error creating `{resource}`: {source}")]
    CreationFailed {
        /// The resource being created
        resource: String,
        /// The network error
        source: ClientError,
    },
    /// The network rejected a read or a write made while reconciling
    #[error("error applying `{label}`: {source}")]
    CallFailed {
        /// The reconciliation step
        label: String,
        /// The network error
        source: ClientError,
    },
    /// The ledger could not be read or written
    #[error("ledger error for `{resource}`: {source}")]
    Storage {
        /// The resource being looked up or recorded
        resource: String,
        /// The storage error
        source: StorageError,
    },
    /// A resource was created but could not be recorded in the ledger
    #[error(
        "`{resource}` was deployed at {address:#x} but could not be recorded, \
         add it to the ledger before re-running: {source}"
    )]
    Unrecorded {
        /// The resource that was created
        resource: String,
        /// Where the resource now lives
        address: Address,
        /// The last storage error
        source: StorageError,
    },
    /// The recorded resource was deployed from a different image or with
    /// different arguments than the ones now requested
    #[error("`{resource}` is recorded with a different image or arguments")]
    Stale {
        /// The recorded resource
        resource: String,
    },
    /// The implementation behind an upgradeable resource is not initialized
    #[error("implementation {implementation:#x} behind `{resource}` is not initialized")]
    UninitializedImplementation {
        /// The upgradeable resource
        resource: String,
        /// The implementation address
        implementation: Address,
    },
    /// An action completed but the state it was meant to establish is still
    /// not observed
    #[error("`{label}` was applied but the remote state did not converge")]
    NotConverged {
        /// The reconciliation step
        label: String,
    },
    /// The deployment configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}
