//! Progress reporting for deployment steps, decoupled from the engine

use std::{
    fmt::{self, Display},
    sync::Arc,
};

use tracing::{debug, error, info};

/// The outcome of a single deployment step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// A new resource was created and recorded
    Created,
    /// A recorded resource was reused
    Reused,
    /// A configuration step found the remote state already in place
    Skipped,
    /// A configuration step wrote to the network
    Applied,
    /// The step failed and the script is aborting
    Failed,
}

impl Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Created => write!(f, "created"),
            StepStatus::Reused => write!(f, "reused"),
            StepStatus::Skipped => write!(f, "skipped"),
            StepStatus::Applied => write!(f, "applied"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Receives the outcome of every materialization and reconciliation step
pub trait Reporter: Send + Sync {
    /// Report the outcome of `step`, a resource name or a configuration label
    fn report(&self, step: &str, status: StepStatus);
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn report(&self, step: &str, status: StepStatus) {
        (**self).report(step, status)
    }
}

/// A [`Reporter`] that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, step: &str, status: StepStatus) {
        match status {
            StepStatus::Skipped => debug!(step, %status, "step already in place"),
            StepStatus::Failed => error!(step, %status, "step failed"),
            _ => info!(step, %status, "step complete"),
        }
    }
}
