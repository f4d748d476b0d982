use crate::application::use_cases::cancel_stale_runs::{
    CancelStaleRunsInteractor, CancelStaleRunsUseCase, CancelStaleRunsUseCaseInput,
    CancelStaleRunsUseCaseOutput,
};
use crate::domain::models::settings::Settings;
use crate::infrastructures::adapters::secondary::external_apis::github::GitHubApiAdapter;
use anyhow::Error;
use std::sync::Arc;

/// Wires the GitHub adapter into the use case and runs it once.
///
/// # Errors
///
/// Propagates client construction and listing failures. Individual
/// cancellation failures are only logged.
#[tracing::instrument(name = "cli::run", skip_all, fields(repository = %settings.repository, branch = %settings.branch))]
pub async fn run(settings: Settings) -> Result<CancelStaleRunsUseCaseOutput, Error> {
    let settings = Arc::new(settings);
    let github_api_adapter = Arc::new(GitHubApiAdapter::new(
        settings.api_url.clone(),
        settings.token.clone(),
        settings.verify_tls,
    )?);
    let use_case = CancelStaleRunsInteractor::new(github_api_adapter);

    let output = use_case
        .execute(CancelStaleRunsUseCaseInput { settings })
        .await?;

    tracing::info!(
        "Listed {} runs, requested {} cancellations: {} accepted, {} failed",
        output.listed,
        output.requested.len(),
        output.cancelled.len(),
        output.failed.len()
    );
    Ok(output)
}
