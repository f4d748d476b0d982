use std::fmt;
use thiserror::Error;

pub const REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const REF_VAR: &str = "GITHUB_REF";
pub const SHA_VAR: &str = "GITHUB_SHA";
pub const API_URL_VAR: &str = "GITHUB_API_URL";
pub const SERVER_URL_VAR: &str = "GITHUB_SERVER_URL";
pub const VERIFY_TLS_VAR: &str = "CANCEL_RUNS_VERIFY_TLS";

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

const BRANCH_REF_PREFIX: &str = "refs/heads/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
}

/// Immutable configuration of a single invocation, read once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// `owner/name` of the repository whose runs are cancelled.
    pub repository: String,
    pub token: String,
    pub branch: String,
    /// Commit being built by the invoking run; its own runs are never cancelled.
    pub current_sha: String,
    pub api_url: String,
    pub server_url: String,
    /// Certificate verification is off unless explicitly requested.
    pub verify_tls: bool,
}

impl Settings {
    /// Reads the settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when a required variable is unset.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the settings from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when a required variable is absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(SettingsError::Missing(key));

        let repository = required(REPOSITORY_VAR)?;
        let token = required(TOKEN_VAR)?;
        let branch = branch_from_ref(&required(REF_VAR)?).to_string();
        let current_sha = required(SHA_VAR)?;

        let api_url = lookup(API_URL_VAR)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let server_url = lookup(SERVER_URL_VAR)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let verify_tls = lookup(VERIFY_TLS_VAR).is_some_and(|value| parse_flag(&value));

        Ok(Self {
            repository,
            token,
            branch,
            current_sha,
            api_url: api_url.trim_end_matches('/').to_string(),
            server_url: server_url.trim_end_matches('/').to_string(),
            verify_tls,
        })
    }

    /// Browser URL of a run, used for logging.
    #[must_use]
    pub fn run_html_url(&self, run_id: u64) -> String {
        format!(
            "{}/{}/actions/runs/{}",
            self.server_url, self.repository, run_id
        )
    }
}

// keep the token out of logs
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .field("branch", &self.branch)
            .field("current_sha", &self.current_sha)
            .field("api_url", &self.api_url)
            .field("server_url", &self.server_url)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

/// Derives a branch name from a git ref, e.g. `refs/heads/main` becomes `main`.
///
/// Refs without the `refs/heads/` prefix are returned unchanged.
#[must_use]
pub fn branch_from_ref(git_ref: &str) -> &str {
    git_ref.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(git_ref)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        (REPOSITORY_VAR, "octo/hello"),
        (TOKEN_VAR, "s3cr3t"),
        (REF_VAR, "refs/heads/main"),
        (SHA_VAR, "abc123"),
    ];

    #[test]
    fn test_reads_required_variables_with_defaults() {
        let settings = Settings::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(settings.repository, "octo/hello");
        assert_eq!(settings.token, "s3cr3t");
        assert_eq!(settings.branch, "main");
        assert_eq!(settings.current_sha, "abc123");
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
        assert!(!settings.verify_tls);
    }

    #[test]
    fn test_missing_required_variable_is_reported() {
        for (missing, _) in REQUIRED {
            let vars: Vec<(&str, &str)> = REQUIRED
                .iter()
                .copied()
                .filter(|(key, _)| *key != missing)
                .collect();

            let err = Settings::from_lookup(lookup_from(&vars)).unwrap_err();
            assert_eq!(err, SettingsError::Missing(missing));
        }
    }

    #[test]
    fn test_optional_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.push((API_URL_VAR, "https://ghe.example.com/api/v3/"));
        vars.push((SERVER_URL_VAR, "https://ghe.example.com"));
        vars.push((VERIFY_TLS_VAR, "True"));

        let settings = Settings::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(settings.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(settings.server_url, "https://ghe.example.com");
        assert!(settings.verify_tls);
    }

    #[test]
    fn test_verify_tls_flag_values() {
        for (value, expected) in [("1", true), ("yes", true), ("0", false), ("false", false), ("", false)] {
            let mut vars = REQUIRED.to_vec();
            vars.push((VERIFY_TLS_VAR, value));
            let settings = Settings::from_lookup(lookup_from(&vars)).unwrap();
            assert_eq!(settings.verify_tls, expected, "value {value:?}");
        }
    }

    #[test]
    fn test_branch_from_ref() {
        assert_eq!(branch_from_ref("refs/heads/main"), "main");
        assert_eq!(branch_from_ref("refs/heads/feature/refs/heads/x"), "feature/refs/heads/x");
        assert_eq!(branch_from_ref("main"), "main");
        assert_eq!(branch_from_ref("refs/tags/v1.0"), "refs/tags/v1.0");
        assert_eq!(branch_from_ref(""), "");
    }

    #[test]
    fn test_run_html_url() {
        let settings = Settings::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(
            settings.run_html_url(42),
            "https://github.com/octo/hello/actions/runs/42"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let settings = Settings::from_lookup(lookup_from(&REQUIRED)).unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("<redacted>"));
    }
}
