//! The script-facing entry point bundling a deployment context with the
//! ledger and the network collaborators

use std::future::Future;

use crate::{
    artifacts::ArtifactSource,
    client::{LedgerClient, UpgradeManager},
    context::DeploymentContext,
    errors::{ClientError, DeployError},
    ledger::DeploymentLedger,
    reconciler,
    reporter::{Reporter, StepStatus, TracingReporter},
    resolver,
    types::{ResourceHandle, StalePolicy},
};

/// Everything a deployment script needs to materialize resources and
/// reconcile their configuration in one (network, market)
pub struct Deployer<C, U> {
    /// The network and market the script runs against
    pub(crate) ctx: DeploymentContext,
    /// The persisted record of what has been deployed
    pub(crate) ledger: DeploymentLedger,
    /// The network client
    pub(crate) client: C,
    /// The upgradeable proxy manager
    pub(crate) upgrades: U,
    /// Where kind artifacts are loaded from
    pub(crate) artifacts: Box<dyn ArtifactSource>,
    /// Where step outcomes are reported
    pub(crate) reporter: Box<dyn Reporter>,
    /// How recorded resources with a different fingerprint are treated
    pub(crate) stale_policy: StalePolicy,
}

impl<C: LedgerClient, U: UpgradeManager> Deployer<C, U> {
    /// Create a deployer reporting through `tracing` and warning on stale
    /// records
    pub fn new(
        ctx: DeploymentContext,
        ledger: DeploymentLedger,
        client: C,
        upgrades: U,
        artifacts: impl ArtifactSource + 'static,
    ) -> Self {
        Self {
            ctx,
            ledger,
            client,
            upgrades,
            artifacts: Box::new(artifacts),
            reporter: Box::new(TracingReporter),
            stale_policy: StalePolicy::default(),
        }
    }

    /// Report step outcomes to `reporter`
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Treat stale records according to `policy`
    pub fn with_stale_policy(mut self, policy: StalePolicy) -> Self {
        self.stale_policy = policy;
        self
    }

    /// The context the deployer runs in
    pub fn context(&self) -> &DeploymentContext {
        &self.ctx
    }

    /// The ledger the deployer records to
    pub fn ledger(&self) -> &DeploymentLedger {
        &self.ledger
    }

    /// The network client, for building reconciliation predicates and actions
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Resolve the concrete kind name of a logical resource in this context
    pub fn resolve_kind(&self, logical: &str) -> Result<&'static str, DeployError> {
        Ok(resolver::resolve_kind(&self.ctx, logical)?)
    }

    /// A handle to a resource already recorded in this context's partition
    pub async fn lookup(&self, resource_name: &str) -> Result<Option<ResourceHandle>, DeployError> {
        let record = self
            .ledger
            .get(&self.ctx.ledger_key(), resource_name)
            .await
            .map_err(|source| DeployError::Storage {
                resource: resource_name.to_string(),
                source,
            })?;

        Ok(record.map(|r| r.handle(resource_name)))
    }

    /// Apply `action` only if `is_applied` reports the desired state is not
    /// yet in place
    ///
    /// See [`reconciler::apply_if_needed`].
    pub async fn apply_if_needed<P, PF, A, AF>(
        &self,
        label: &str,
        is_applied: P,
        action: A,
    ) -> Result<StepStatus, DeployError>
    where
        P: FnMut() -> PF,
        PF: Future<Output = Result<bool, ClientError>>,
        A: FnOnce() -> AF,
        AF: Future<Output = Result<(), ClientError>>,
    {
        reconciler::apply_if_needed(self.reporter.as_ref(), label, is_applied, action).await
    }
}
