//! An [`UpgradeManager`] deploying implementations behind OpenZeppelin v5
//! transparent proxies
//!
//! Concretely, the proxy is a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/5.x/api/proxy#transparent_proxy),
//! which itself deploys a `ProxyAdmin` contract owned by the configured owner.
//! Calls made directly to the proxy are forwarded to the implementation
//! contract; upgrade calls can only be made through the `ProxyAdmin`.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use deploy_core::{
    client::{LedgerClient, UpgradeManager},
    errors::ClientError,
    types::{Artifact, UpgradeableDeployment},
};
use tracing::{info, warn};

use crate::{
    client::{AlloyClient, StorageReader},
    constants::{
        INITIALIZABLE_STORAGE_SLOT, NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT,
        PROXY_ADMIN_STORAGE_SLOT, PROXY_KIND_NAME,
    },
};

/// Deploys upgradeable resources over a network client
#[derive(Clone)]
pub struct AlloyUpgradeManager<C = AlloyClient> {
    /// The network client
    client: C,
    /// The owner of the proxy admin
    owner: Address,
}

impl<C: StorageReader> AlloyUpgradeManager<C> {
    /// Create a manager whose proxies are administered by `owner`
    pub fn new(client: C, owner: Address) -> Self {
        Self { client, owner }
    }

    /// Read the proxy admin address of a proxy.
    ///
    /// This is the recommended way to get the proxy admin address:
    /// https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
    async fn proxy_admin(&self, proxy: Address) -> Result<Address, ClientError> {
        let word = self
            .client
            .storage_at(proxy, PROXY_ADMIN_STORAGE_SLOT)
            .await?
            .to_be_bytes::<NUM_BYTES_STORAGE_SLOT>();

        Ok(Address::from_slice(&word[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..]))
    }
}

/// The constructor arguments of a `TransparentUpgradeableProxy`
pub fn proxy_constructor_args(
    implementation: Address,
    owner: Address,
    init_calldata: &Bytes,
) -> Bytes {
    (implementation, owner, init_calldata.clone()).abi_encode_params().into()
}

/// Whether a raw `Initializable` storage word records an initialization.
///
/// The `_initialized` version occupies the low 8 bytes of the slot
pub fn is_initialized(word: &[u8; NUM_BYTES_STORAGE_SLOT]) -> bool {
    word[NUM_BYTES_STORAGE_SLOT - 8..].iter().any(|b| *b != 0)
}

#[async_trait]
impl<C: LedgerClient + StorageReader> UpgradeManager for AlloyUpgradeManager<C> {
    fn proxy_kind(&self) -> &str {
        PROXY_KIND_NAME
    }

    async fn deploy_upgradeable(
        &self,
        artifact: &Artifact,
        proxy: &Artifact,
        init_calldata: &Bytes,
    ) -> Result<UpgradeableDeployment, ClientError> {
        let implementation = self.client.create(artifact, &Bytes::new()).await?;
        info!(kind = %artifact.kind_name, %implementation, "deployed implementation");

        let args = proxy_constructor_args(implementation, self.owner, init_calldata);
        let proxy = self.client.create(proxy, &args).await?;

        // The proxy exists from here on, so the admin read only informs the log
        match self.proxy_admin(proxy).await {
            Ok(proxy_admin) => info!(%proxy, %proxy_admin, owner = %self.owner, "deployed proxy"),
            Err(e) => {
                warn!(%proxy, owner = %self.owner, error = %e, "deployed proxy, admin unreadable")
            }
        }

        Ok(UpgradeableDeployment {
            proxy,
            implementation,
        })
    }

    async fn verify_implementation_initialized(
        &self,
        implementation: Address,
    ) -> Result<bool, ClientError> {
        let word = self
            .client
            .storage_at(implementation, INITIALIZABLE_STORAGE_SLOT)
            .await?
            .to_be_bytes::<NUM_BYTES_STORAGE_SLOT>();

        Ok(is_initialized(&word))
    }
}
