use crate::domain::external_apis::github::{CancelRunError, GitHubApi};
use crate::domain::models::settings::Settings;
use anyhow::{Context, Error};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub struct CancelStaleRunsUseCaseInput {
    pub settings: Arc<Settings>,
}

/// Outcome of one invocation. Failed cancellations are reported, never raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelStaleRunsUseCaseOutput {
    /// Number of runs returned by the listing call.
    pub listed: usize,
    pub requested: Vec<u64>,
    pub cancelled: Vec<u64>,
    pub failed: Vec<u64>,
}

#[async_trait]
pub trait CancelStaleRunsUseCase {
    /// Cancels the unfinished runs of the configured branch that belong to
    /// other commits.
    ///
    /// # Errors
    ///
    /// Fails only when the runs cannot be listed, in which case nothing is
    /// cancelled.
    async fn execute(
        &self,
        input: CancelStaleRunsUseCaseInput,
    ) -> Result<CancelStaleRunsUseCaseOutput, Error>;
}

pub struct CancelStaleRunsInteractor<G: GitHubApi + Send + Sync + 'static> {
    github_api: Arc<G>,
}

impl<G: GitHubApi + Send + Sync + 'static> CancelStaleRunsInteractor<G> {
    pub fn new(github_api: Arc<G>) -> Self {
        Self { github_api }
    }
}

#[async_trait]
impl<G: GitHubApi + Send + Sync + 'static> CancelStaleRunsUseCase for CancelStaleRunsInteractor<G> {
    #[tracing::instrument(name = "CancelStaleRunsInteractor::execute", skip_all)]
    async fn execute(
        &self,
        input: CancelStaleRunsUseCaseInput,
    ) -> Result<CancelStaleRunsUseCaseOutput, Error> {
        let settings = input.settings;

        tracing::info!(
            "listing runs for branch {} in repo {}",
            settings.branch,
            settings.repository
        );
        let runs = self
            .github_api
            .list_workflow_runs(&settings.repository, &settings.branch)
            .await
            .with_context(|| {
                format!(
                    "Failed to list workflow runs for branch {} in repo {}",
                    settings.branch, settings.repository
                )
            })?;
        tracing::debug!("Listed {} workflow runs", runs.len());

        let mut output = CancelStaleRunsUseCaseOutput {
            listed: runs.len(),
            ..Default::default()
        };

        // one task per stale run; the set is drained before returning
        let mut tasks = JoinSet::new();
        for run in runs
            .into_iter()
            .filter(|run| run.is_stale(&settings.branch, &settings.current_sha))
        {
            tracing::info!("canceling run {}", settings.run_html_url(run.id));
            output.requested.push(run.id);

            let github_api = self.github_api.clone();
            let settings = settings.clone();
            let run_id = run.id;
            tasks.spawn(async move {
                let result = github_api
                    .cancel_workflow_run(&settings.repository, run_id)
                    .await;
                (run_id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((run_id, Ok(()))) => {
                    tracing::debug!("Cancellation of run #{} accepted", run_id);
                    output.cancelled.push(run_id);
                }
                Ok((run_id, Err(e))) => {
                    match &e {
                        CancelRunError::UnexpectedStatus { .. } => tracing::warn!("{}", e),
                        CancelRunError::Request { .. } => tracing::error!("{}", e),
                    }
                    output.failed.push(run_id);
                }
                Err(e) => {
                    tracing::error!("Cancellation task did not complete: {}", e);
                }
            }
        }

        // a task that panicked never reported its id
        for run_id in &output.requested {
            if !output.cancelled.contains(run_id) && !output.failed.contains(run_id) {
                output.failed.push(*run_id);
            }
        }

        // completion order is arbitrary
        output.cancelled.sort_unstable();
        output.failed.sort_unstable();

        Ok(output)
    }
}
