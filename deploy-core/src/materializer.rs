//! Materializing resources: reuse what the ledger records, create and record
//! what it does not
//!
//! Creation and recording are separate phases. A resource is only recorded
//! once its creation is confirmed, and recording is retried on its own so a
//! transient storage failure does not force a second, duplicate creation.

use alloy_primitives::{Address, Bytes, B256};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    client::{LedgerClient, UpgradeManager},
    constants::{LEDGER_WRITE_ATTEMPTS, LEDGER_WRITE_BACKOFF},
    deployer::Deployer,
    errors::DeployError,
    reporter::StepStatus,
    types::{Artifact, DeploymentRecord, DeploymentStrategy, ResourceHandle, StalePolicy},
};

impl<C: LedgerClient, U: UpgradeManager> Deployer<C, U> {
    /// Return a handle to `resource_name`, creating it from `kind_name` with
    /// the ABI-encoded `args` if the ledger has no record of it
    ///
    /// For [`DeploymentStrategy::Upgradeable`] the arguments are the
    /// initializer calldata passed through the proxy, and the implementation
    /// is checked to be initialized whether the resource was created or reused.
    pub async fn materialize_if_needed(
        &self,
        resource_name: &str,
        kind_name: &str,
        args: Bytes,
        strategy: DeploymentStrategy,
    ) -> Result<ResourceHandle, DeployError> {
        match self.materialize(resource_name, kind_name, &args, strategy).await {
            Ok((handle, status)) => {
                self.reporter.report(resource_name, status);
                Ok(handle)
            }
            Err(e) => {
                self.reporter.report(resource_name, StepStatus::Failed);
                Err(e)
            }
        }
    }

    /// The body of [`Deployer::materialize_if_needed`], without reporting
    async fn materialize(
        &self,
        resource_name: &str,
        kind_name: &str,
        args: &Bytes,
        strategy: DeploymentStrategy,
    ) -> Result<(ResourceHandle, StepStatus), DeployError> {
        // Resolve every artifact before touching the network
        let artifact = self.artifacts.load(kind_name)?;
        let proxy = match strategy {
            DeploymentStrategy::Plain => None,
            DeploymentStrategy::Upgradeable => {
                Some(self.artifacts.load(self.upgrades.proxy_kind())?)
            }
        };
        let fingerprint = artifact.fingerprint(args);

        let key = self.ctx.ledger_key();
        let existing = self.ledger.get(&key, resource_name).await.map_err(|source| {
            DeployError::Storage {
                resource: resource_name.to_string(),
                source,
            }
        })?;

        let (record, status) = match existing {
            Some(record) => {
                self.check_recorded(resource_name, kind_name, &record, fingerprint, strategy)?;
                info!(
                    resource = resource_name,
                    address = %record.address,
                    "reusing recorded deployment"
                );
                (record, StepStatus::Reused)
            }
            None => {
                let record = self
                    .create(resource_name, &artifact, proxy.as_ref(), args, fingerprint)
                    .await?;
                (record, StepStatus::Created)
            }
        };

        if let Some(implementation) = record.implementation {
            self.check_initialized(resource_name, implementation).await?;
        }

        Ok((record.handle(resource_name), status))
    }

    /// Compare a recorded deployment against the one now requested
    ///
    /// A record is stale if it was made from another kind, image or
    /// arguments, or with the other deployment strategy.
    fn check_recorded(
        &self,
        resource_name: &str,
        kind_name: &str,
        record: &DeploymentRecord,
        fingerprint: B256,
        strategy: DeploymentStrategy,
    ) -> Result<(), DeployError> {
        let recorded_strategy = match record.implementation {
            Some(_) => DeploymentStrategy::Upgradeable,
            None => DeploymentStrategy::Plain,
        };
        if record.fingerprint == fingerprint
            && record.kind == kind_name
            && recorded_strategy == strategy
        {
            return Ok(());
        }

        match self.stale_policy {
            StalePolicy::Warn => {
                warn!(
                    resource = resource_name,
                    recorded_kind = %record.kind,
                    requested_kind = kind_name,
                    ?recorded_strategy,
                    requested_strategy = ?strategy,
                    "recorded deployment differs from the requested one, \
                     keeping the recorded deployment"
                );
                Ok(())
            }
            StalePolicy::Deny => Err(DeployError::Stale {
                resource: resource_name.to_string(),
            }),
        }
    }

    /// Create the resource on the network and record it
    ///
    /// A resource with a `proxy` artifact is deployed behind that proxy.
    async fn create(
        &self,
        resource_name: &str,
        artifact: &Artifact,
        proxy: Option<&Artifact>,
        args: &Bytes,
        fingerprint: B256,
    ) -> Result<DeploymentRecord, DeployError> {
        let creation_failed = |source| DeployError::CreationFailed {
            resource: resource_name.to_string(),
            source,
        };

        let (address, implementation) = match proxy {
            None => {
                let address = self.client.create(artifact, args).await.map_err(creation_failed)?;
                (address, None)
            }
            Some(proxy) => {
                let deployment = self
                    .upgrades
                    .deploy_upgradeable(artifact, proxy, args)
                    .await
                    .map_err(creation_failed)?;
                (deployment.proxy, Some(deployment.implementation))
            }
        };

        info!(
            resource = resource_name,
            kind = %artifact.kind_name,
            %address,
            "created resource"
        );

        let record = DeploymentRecord {
            kind: artifact.kind_name.clone(),
            address,
            interface_descriptor: artifact.interface_descriptor.clone(),
            image: artifact.image.clone(),
            fingerprint,
            implementation,
        };
        self.record(resource_name, &record).await?;

        Ok(record)
    }

    /// Write a confirmed creation to the ledger, retrying on failure
    async fn record(
        &self,
        resource_name: &str,
        record: &DeploymentRecord,
    ) -> Result<(), DeployError> {
        let key = self.ctx.ledger_key();
        let mut attempt = 1;
        loop {
            match self.ledger.put(&key, resource_name, record.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < LEDGER_WRITE_ATTEMPTS => {
                    warn!(
                        resource = resource_name,
                        attempt,
                        error = %e,
                        "error recording deployment, retrying"
                    );
                    sleep(LEDGER_WRITE_BACKOFF).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(DeployError::Unrecorded {
                        resource: resource_name.to_string(),
                        address: record.address,
                        source,
                    });
                }
            }
        }
    }

    /// Check that the implementation behind an upgradeable resource cannot be
    /// initialized by a third party
    async fn check_initialized(
        &self,
        resource_name: &str,
        implementation: Address,
    ) -> Result<(), DeployError> {
        let initialized = self
            .upgrades
            .verify_implementation_initialized(implementation)
            .await
            .map_err(|source| DeployError::CallFailed {
                label: format!("{resource_name}: verify implementation"),
                source,
            })?;

        if !initialized {
            return Err(DeployError::UninitializedImplementation {
                resource: resource_name.to_string(),
                implementation,
            });
        }

        Ok(())
    }
}
