//! Definitions of errors that can occur during the execution of the deploy scripts

use deploy_core::errors::{ConfigError, DeployError, StorageError};
use thiserror::Error;

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Error initializing the RPC client
    #[error("error initializing client: {0}")]
    ClientInitialization(String),
    /// Error parsing a command line argument
    #[error("error parsing argument: {0}")]
    ArgParsing(String),
    /// A command referenced a resource the ledger has no record of
    #[error("no deployment of `{0}` is recorded")]
    UnknownResource(String),
    /// Error in the deployment configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Error reading the deployment ledger
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Error materializing or reconciling a resource
    #[error(transparent)]
    Deploy(#[from] DeployError),
}
