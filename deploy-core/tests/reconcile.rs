//! Tests for reconciling resource configuration against a mock network

use std::{collections::HashMap, sync::Arc};

use alloy_primitives::{Address, Bytes};
use deploy_core::{
    client::LedgerClient,
    context::DeploymentContext,
    errors::{ClientError, DeployError},
    ledger::DeploymentLedger,
    reporter::StepStatus,
    test_helpers::{mock_artifact, read_calldata, write_calldata, MockNetwork, RecordingReporter},
    types::{DeploymentStrategy, ResourceHandle},
    Deployer,
};

/// The deployer type used in the tests
type MockDeployer = Deployer<Arc<MockNetwork>, Arc<MockNetwork>>;

/// The slot holding a vault's admin
const ADMIN_SLOT: [u8; 4] = [0x70, 0x4b, 0x6c, 0x02];

/// A deployer for the local core market
fn deployer(root: &std::path::Path, net: &Arc<MockNetwork>) -> MockDeployer {
    let artifacts: HashMap<_, _> = ["FujiAdmin", "FujiVault"]
        .into_iter()
        .map(|kind| (kind.to_string(), mock_artifact(kind, &[0x60, 0x80])))
        .collect();

    let ctx = DeploymentContext::parse("local", "core").unwrap();
    Deployer::new(ctx, DeploymentLedger::new(root), net.clone(), net.clone(), artifacts)
}

/// Materialize the admin registry and a vault
async fn admin_and_vault(deployer: &MockDeployer) -> (ResourceHandle, ResourceHandle) {
    let admin = deployer
        .materialize_if_needed("admin", "FujiAdmin", Bytes::new(), DeploymentStrategy::Plain)
        .await
        .unwrap();
    let vault = deployer
        .materialize_if_needed("vaultETHDAI", "FujiVault", Bytes::new(), DeploymentStrategy::Plain)
        .await
        .unwrap();

    (admin, vault)
}

/// Point the vault's admin at `admin`
async fn set_admin(
    deployer: &MockDeployer,
    vault: Address,
    admin: Address,
) -> Result<StepStatus, DeployError> {
    let client = deployer.client();
    deployer
        .apply_if_needed(
            "setFujiAdmin",
            move || async move {
                let current = client.call(vault, read_calldata(ADMIN_SLOT)).await?;
                Ok(current.as_ref() == admin.as_slice())
            },
            move || async move {
                client.send(vault, write_calldata(ADMIN_SLOT, admin.as_slice())).await?;
                Ok(())
            },
        )
        .await
}

#[tokio::test]
async fn test_partial_wiring() {
    let dir = tempfile::tempdir().unwrap();
    let net = Arc::new(MockNetwork::default());
    let deployer = deployer(dir.path(), &net);
    let (admin, vault) = admin_and_vault(&deployer).await;

    let status = set_admin(&deployer, vault.address, admin.address).await.unwrap();
    assert_eq!(status, StepStatus::Applied);
    assert_eq!(net.writes(), 1);
    assert_eq!(
        net.slot(vault.address, &ADMIN_SLOT),
        Some(Bytes::copy_from_slice(admin.address.as_slice()))
    );

    // A second identical call observes the wiring and writes nothing
    let status = set_admin(&deployer, vault.address, admin.address).await.unwrap();
    assert_eq!(status, StepStatus::Skipped);
    assert_eq!(net.writes(), 1);
}

#[tokio::test]
async fn test_rerun_after_failed_write() {
    let dir = tempfile::tempdir().unwrap();
    let net = Arc::new(MockNetwork::default());
    let reporter = Arc::new(RecordingReporter::default());
    let deployer = deployer(dir.path(), &net).with_reporter(reporter.clone());
    let (admin, vault) = admin_and_vault(&deployer).await;

    net.fail_next_send(ClientError::Reverted("caller is not the owner".to_string()));
    let err = set_admin(&deployer, vault.address, admin.address).await.unwrap_err();
    assert!(matches!(err, DeployError::CallFailed { ref label, .. } if label == "setFujiAdmin"));
    assert_eq!(net.writes(), 0);

    // Re-running the whole script reuses both resources and retries the wiring
    let (admin, vault) = admin_and_vault(&deployer).await;
    let status = set_admin(&deployer, vault.address, admin.address).await.unwrap();
    assert_eq!(status, StepStatus::Applied);
    assert_eq!(net.writes(), 1);
    assert_eq!(net.creations().len(), 2);

    let steps: Vec<_> = reporter.events().into_iter().map(|(_, status)| status).collect();
    assert_eq!(
        steps,
        vec![
            StepStatus::Created,
            StepStatus::Created,
            StepStatus::Failed,
            StepStatus::Reused,
            StepStatus::Reused,
            StepStatus::Applied,
        ]
    );
}

#[tokio::test]
async fn test_write_without_effect_does_not_converge() {
    let dir = tempfile::tempdir().unwrap();
    let net = Arc::new(MockNetwork::default());
    let deployer = deployer(dir.path(), &net);
    let (admin, vault) = admin_and_vault(&deployer).await;

    net.drop_writes();
    let err = set_admin(&deployer, vault.address, admin.address).await.unwrap_err();

    assert!(matches!(err, DeployError::NotConverged { ref label } if label == "setFujiAdmin"));
    assert_eq!(net.writes(), 1);
}
