use serde::{Deserialize, Serialize};

/// Status reported by the API once a run has finished, whatever its conclusion.
pub const COMPLETED_STATUS: &str = "completed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub status: String,
    pub head_sha: String,
    pub head_branch: String,
}

impl WorkflowRun {
    /// Whether this run is superseded by the commit currently being built on `branch`.
    ///
    /// Finished runs, runs of other branches and runs of `current_sha` itself are kept.
    #[must_use]
    pub fn is_stale(&self, branch: &str, current_sha: &str) -> bool {
        self.status != COMPLETED_STATUS && self.head_branch == branch && self.head_sha != current_sha
    }
}
