use crate::domain::models::run::WorkflowRun;
use anyhow::Error;
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single cancellation request. Never fatal to the caller.
#[derive(Debug, Error)]
pub enum CancelRunError {
    #[error("failed to send cancel request for workflow #{id}: {source}")]
    Request {
        id: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to cancel workflow #{id}, status code: {status}, body: {body}")]
    UnexpectedStatus { id: u64, status: u16, body: String },
}

impl CancelRunError {
    #[must_use]
    pub fn run_id(&self) -> u64 {
        match self {
            Self::Request { id, .. } | Self::UnexpectedStatus { id, .. } => *id,
        }
    }
}

#[async_trait]
pub trait GitHubApi {
    /// Lists the runs of `repository` filtered server-side by `branch`.
    ///
    /// Only the first page returned by the API is considered.
    async fn list_workflow_runs(
        &self,
        repository: &str,
        branch: &str,
    ) -> Result<Vec<WorkflowRun>, Error>;

    /// Requests cancellation of one run. Succeeds only on `202 Accepted`.
    async fn cancel_workflow_run(&self, repository: &str, run_id: u64)
    -> Result<(), CancelRunError>;
}
