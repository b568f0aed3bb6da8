//! Reconciling remote configuration: read the current state, write only if
//! it is wrong
//!
//! The network is the source of truth. Nothing about a reconciliation step is
//! remembered locally, so re-running a script after a failure re-reads the
//! real state and only applies what is still missing.

use std::future::Future;

use tracing::{debug, info};

use crate::{
    errors::{ClientError, DeployError},
    reporter::{Reporter, StepStatus},
};

/// Evaluate `is_applied` against the current remote state; if it reports
/// `false`, run `action` and check that the state converged
///
/// `action` runs at most once and is never retried. Failures of either
/// closure abort with [`DeployError::CallFailed`] tagged with `label`.
pub async fn apply_if_needed<P, PF, A, AF>(
    reporter: &dyn Reporter,
    label: &str,
    mut is_applied: P,
    action: A,
) -> Result<StepStatus, DeployError>
where
    P: FnMut() -> PF,
    PF: Future<Output = Result<bool, ClientError>>,
    A: FnOnce() -> AF,
    AF: Future<Output = Result<(), ClientError>>,
{
    let res = reconcile(label, &mut is_applied, action).await;
    match &res {
        Ok(status) => reporter.report(label, *status),
        Err(_) => reporter.report(label, StepStatus::Failed),
    }

    res
}

/// The body of [`apply_if_needed`], without reporting
async fn reconcile<P, PF, A, AF>(
    label: &str,
    is_applied: &mut P,
    action: A,
) -> Result<StepStatus, DeployError>
where
    P: FnMut() -> PF,
    PF: Future<Output = Result<bool, ClientError>>,
    A: FnOnce() -> AF,
    AF: Future<Output = Result<(), ClientError>>,
{
    let call_failed = |source| DeployError::CallFailed {
        label: label.to_string(),
        source,
    };

    if is_applied().await.map_err(call_failed)? {
        debug!(label, "already applied, skipping");
        return Ok(StepStatus::Skipped);
    }

    info!(label, "applying");
    action().await.map_err(call_failed)?;

    if !is_applied().await.map_err(call_failed)? {
        return Err(DeployError::NotConverged {
            label: label.to_string(),
        });
    }

    Ok(StepStatus::Applied)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::test_helpers::RecordingReporter;

    #[tokio::test]
    async fn test_skips_when_applied() {
        let reporter = RecordingReporter::default();
        let writes = AtomicUsize::new(0);
        let writes_ref = &writes;

        let status = apply_if_needed(
            &reporter,
            "setAdmin",
            || async { Ok(true) },
            move || async move {
                writes_ref.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await
        .unwrap();

        assert_eq!(status, StepStatus::Skipped);
        assert_eq!(writes.load(Ordering::SeqCst), 0);
        assert_eq!(reporter.events(), vec![("setAdmin".to_string(), StepStatus::Skipped)]);
    }

    #[tokio::test]
    async fn test_applies_and_converges() {
        let reporter = RecordingReporter::default();
        let state = Arc::new(AtomicBool::new(false));
        let writes = Arc::new(AtomicUsize::new(0));

        let check = {
            let state = state.clone();
            move || {
                let state = state.clone();
                async move { Ok(state.load(Ordering::SeqCst)) }
            }
        };
        let apply = {
            let state = state.clone();
            let writes = writes.clone();
            move || async move {
                writes.fetch_add(1, Ordering::SeqCst);
                state.store(true, Ordering::SeqCst);
                Ok(())
            }
        };
        let status = apply_if_needed(&reporter, "setOracle", check, apply).await.unwrap();

        assert_eq!(status, StepStatus::Applied);
        assert_eq!(writes.load(Ordering::SeqCst), 1);
        assert!(state.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_action_failure_is_labelled() {
        let reporter = RecordingReporter::default();

        let err = apply_if_needed(
            &reporter,
            "setFlasher",
            || async { Ok(false) },
            || async { Err(ClientError::Reverted("not owner".to_string())) },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DeployError::CallFailed { ref label, source: ClientError::Reverted(_) }
                if label == "setFlasher"
        ));
        assert_eq!(reporter.events(), vec![("setFlasher".to_string(), StepStatus::Failed)]);
    }

    #[tokio::test]
    async fn test_predicate_failure_skips_action() {
        let reporter = RecordingReporter::default();
        let writes = AtomicUsize::new(0);
        let writes_ref = &writes;

        let err = apply_if_needed(
            &reporter,
            "setController",
            || async { Err(ClientError::Timeout("eth_call".to_string())) },
            move || async move {
                writes_ref.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DeployError::CallFailed { .. }));
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_converged() {
        let reporter = RecordingReporter::default();

        let err = apply_if_needed(
            &reporter,
            "setSwapper",
            || async { Ok(false) },
            || async { Ok(()) },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DeployError::NotConverged { ref label } if label == "setSwapper"));
    }
}
