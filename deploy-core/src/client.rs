//! The network-facing collaborators the engine drives
//!
//! Neither trait knows about the ledger or the deployment context; they only
//! send calls to the network and report what happened.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;

use crate::{
    errors::ClientError,
    types::{Artifact, UpgradeableDeployment},
};

/// Sends state-mutating and read-only calls to the network
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Create a new instance of `artifact` with the given ABI-encoded
    /// constructor arguments, returning its address once the creation is
    /// confirmed
    async fn create(&self, artifact: &Artifact, args: &Bytes) -> Result<Address, ClientError>;

    /// Execute a read-only call against `address`
    async fn call(&self, address: Address, calldata: Bytes) -> Result<Bytes, ClientError>;

    /// Send a state-mutating call to `address` and wait for its confirmation
    async fn send(&self, address: Address, calldata: Bytes) -> Result<TxHash, ClientError>;
}

/// Manages the proxy / implementation split of upgradeable resources
#[async_trait]
pub trait UpgradeManager: Send + Sync {
    /// The kind name of the proxy artifact resources are deployed behind
    fn proxy_kind(&self) -> &str;

    /// Deploy `artifact` behind a fresh instance of `proxy`, calling the
    /// implementation's initializer with `init_calldata` through the proxy
    ///
    /// Once the proxy's creation is confirmed this must return `Ok`, so the
    /// deployment can be recorded.
    async fn deploy_upgradeable(
        &self,
        artifact: &Artifact,
        proxy: &Artifact,
        init_calldata: &Bytes,
    ) -> Result<UpgradeableDeployment, ClientError>;

    /// Whether the implementation contract has itself been initialized, so
    /// that it cannot be claimed by calling it directly
    async fn verify_implementation_initialized(
        &self,
        implementation: Address,
    ) -> Result<bool, ClientError>;
}

#[async_trait]
impl<T: LedgerClient + ?Sized> LedgerClient for Arc<T> {
    async fn create(&self, artifact: &Artifact, args: &Bytes) -> Result<Address, ClientError> {
        (**self).create(artifact, args).await
    }

    async fn call(&self, address: Address, calldata: Bytes) -> Result<Bytes, ClientError> {
        (**self).call(address, calldata).await
    }

    async fn send(&self, address: Address, calldata: Bytes) -> Result<TxHash, ClientError> {
        (**self).send(address, calldata).await
    }
}

#[async_trait]
impl<T: UpgradeManager + ?Sized> UpgradeManager for Arc<T> {
    fn proxy_kind(&self) -> &str {
        (**self).proxy_kind()
    }

    async fn deploy_upgradeable(
        &self,
        artifact: &Artifact,
        proxy: &Artifact,
        init_calldata: &Bytes,
    ) -> Result<UpgradeableDeployment, ClientError> {
        (**self).deploy_upgradeable(artifact, proxy, init_calldata).await
    }

    async fn verify_implementation_initialized(
        &self,
        implementation: Address,
    ) -> Result<bool, ClientError> {
        (**self).verify_implementation_initialized(implementation).await
    }
}
