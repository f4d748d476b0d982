use crate::domain::external_apis::github::{CancelRunError, GitHubApi};
use crate::domain::models::run::WorkflowRun;
use anyhow::{Context, Error};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Per-request timeout, covering connect, send and body read.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

// The API refuses requests without a User-Agent.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize, Debug, Clone)]
struct GitHubWorkflowRunResponse {
    id: u64,
    // status and head_branch are nullable in the API schema
    status: Option<String>,
    head_sha: String,
    head_branch: Option<String>,
}

// The /actions/runs endpoint wraps the runs in an object under the
// workflow_runs key.
#[derive(Deserialize, Debug)]
struct GitHubWorkflowRunsApiResponse {
    workflow_runs: Vec<GitHubWorkflowRunResponse>,
}

pub struct GitHubApiAdapter {
    client: Client,
    base_url: String,
    github_token: String,
}

impl GitHubApiAdapter {
    /// Builds the adapter and its shared HTTP client.
    ///
    /// When `verify_tls` is false, certificate chains are not validated.
    ///
    /// # Errors
    ///
    /// Fails when the TLS backend cannot be initialised.
    pub fn new(base_url: String, github_token: String, verify_tls: bool) -> Result<Self, Error> {
        if !verify_tls {
            tracing::warn!("TLS certificate verification is disabled");
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!verify_tls)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            github_token,
        })
    }

    /// Attaches the API version and token headers, then sends the request.
    ///
    /// The response status is not inspected here.
    async fn github_request(&self, request: RequestBuilder) -> Result<Response, reqwest::Error> {
        request
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(AUTHORIZATION, format!("token {}", self.github_token))
            .send()
            .await
    }
}

#[async_trait]
impl GitHubApi for GitHubApiAdapter {
    #[tracing::instrument(name = "GitHubApiAdapter::list_workflow_runs", skip(self))]
    async fn list_workflow_runs(
        &self,
        repository: &str,
        branch: &str,
    ) -> Result<Vec<WorkflowRun>, Error> {
        let url = format!("{}/repos/{}/actions/runs", self.base_url, repository);

        let response = self
            .github_request(self.client.get(&url).query(&[("branch", branch)]))
            .await
            .with_context(|| format!("Failed to send request listing workflow runs of {repository}"))?;
        tracing::debug!("Listing responded with status {}", response.status());

        let body = response
            .text()
            .await
            .context("Failed to read workflow runs response body")?;
        let api_response: GitHubWorkflowRunsApiResponse = serde_json::from_str(&body)
            .with_context(|| format!("Failed to decode workflow runs response of {repository}"))?;

        let workflow_runs = api_response
            .workflow_runs
            .into_iter()
            .map(|run_res| WorkflowRun {
                id: run_res.id,
                status: run_res.status.unwrap_or_default(),
                head_sha: run_res.head_sha,
                head_branch: run_res.head_branch.unwrap_or_default(),
            })
            .collect();

        Ok(workflow_runs)
    }

    #[tracing::instrument(name = "GitHubApiAdapter::cancel_workflow_run", skip(self))]
    async fn cancel_workflow_run(
        &self,
        repository: &str,
        run_id: u64,
    ) -> Result<(), CancelRunError> {
        let url = format!(
            "{}/repos/{}/actions/runs/{}/cancel",
            self.base_url, repository, run_id
        );

        let response = self
            .github_request(self.client.post(&url))
            .await
            .map_err(|e| CancelRunError::Request {
                id: run_id,
                source: Box::new(e),
            })?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            return Ok(());
        }

        // the body is only diagnostic, an unreadable one is reported empty
        let body = response.text().await.unwrap_or_default();
        Err(CancelRunError::UnexpectedStatus {
            id: run_id,
            status: status.as_u16(),
            body,
        })
    }
}
