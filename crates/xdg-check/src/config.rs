//! Run configuration.
//!
//! Everything a run needs is collected once into [`CheckConfig`] and passed
//! down explicitly. Nothing in this crate reads environment variables; the
//! binary maps its flags and the CI environment onto these types.

use crate::error::ConfigError;
use crate::validator::ValidatorPrograms;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default GitHub web endpoint, used for the status target URL.
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl FromStr for Repository {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Repository {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(ConfigError::InvalidRepository(s.to_string())),
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What triggered the run; decides where candidate files come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventContext {
    /// Check the files changed by this pull request.
    PullRequest { number: u64 },

    /// Push, manual dispatch or local run: check every matching file.
    Push,
}

impl EventContext {
    /// Classify an event from its name and (optional) JSON payload.
    pub fn from_payload(event_name: &str, payload: Option<&Value>) -> Self {
        if !is_pull_request_event(event_name) {
            return EventContext::Push;
        }

        let number = payload.and_then(|p| {
            p.pointer("/pull_request/number")
                .or_else(|| p.get("number"))
                .and_then(Value::as_u64)
        });

        match number {
            Some(number) => EventContext::PullRequest { number },
            None => {
                tracing::warn!(
                    event = %event_name,
                    "Pull request event without a pull request number; checking all files"
                );
                EventContext::Push
            }
        }
    }

    /// Classify an event, reading the payload file only for pull request events.
    pub fn load(event_name: &str, event_path: Option<&Path>) -> Result<Self, ConfigError> {
        if !is_pull_request_event(event_name) {
            return Ok(EventContext::Push);
        }

        let payload = match event_path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| {
                    ConfigError::EventPayloadRead {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                Some(serde_json::from_str::<Value>(&content)?)
            }
            None => None,
        };

        Ok(Self::from_payload(event_name, payload.as_ref()))
    }
}

fn is_pull_request_event(event_name: &str) -> bool {
    matches!(event_name, "pull_request" | "pull_request_target")
}

/// Settings for talking to the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub repository: Repository,
    pub sha: String,
    pub token: String,
    pub api_url: String,
    pub target_url: String,
}

impl RemoteConfig {
    /// Build from raw values; each of repository, sha and token is required.
    pub fn new(
        repository: Option<&str>,
        sha: Option<&str>,
        token: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let repository: Repository = required(repository, "repository (GITHUB_REPOSITORY)")?.parse()?;
        let sha = required(sha, "commit sha (GITHUB_SHA)")?.to_string();
        let token = required(token, "API token (GITHUB_TOKEN)")?.to_string();
        let target_url = target_url(DEFAULT_SERVER_URL, &repository, None);

        Ok(RemoteConfig {
            repository,
            sha,
            token,
            api_url: DEFAULT_API_URL.to_string(),
            target_url,
        })
    }

    /// Use a different REST endpoint (GitHub Enterprise).
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Point the status link at the given server, and at a workflow run when known.
    pub fn with_run(mut self, server_url: &str, run_id: Option<&str>) -> Self {
        self.target_url = target_url(server_url, &self.repository, run_id);
        self
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Link attached to every commit status of a run.
pub fn target_url(server_url: &str, repository: &Repository, run_id: Option<&str>) -> String {
    let server = server_url.trim_end_matches('/');
    match run_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("{}/{}/actions/runs/{}", server, repository, id),
        None => format!("{}/{}/actions", server, repository),
    }
}

/// Complete configuration of one run.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Root that globs and validator invocations are relative to.
    pub workspace: PathBuf,

    /// Use `validate-strict` for AppStream files.
    pub strict: bool,

    pub event: EventContext,

    pub programs: ValidatorPrograms,

    /// `None` runs without the remote API (local mode).
    pub remote: Option<RemoteConfig>,
}

impl CheckConfig {
    /// Local configuration: glob enumeration, no remote reporting.
    pub fn new(workspace: impl Into<PathBuf>, strict: bool) -> Self {
        Self {
            workspace: workspace.into(),
            strict,
            event: EventContext::Push,
            programs: ValidatorPrograms::default(),
            remote: None,
        }
    }

    pub fn with_event(mut self, event: EventContext) -> Self {
        self.event = event;
        self
    }

    pub fn with_remote(mut self, remote: RemoteConfig) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_programs(mut self, programs: ValidatorPrograms) -> Self {
        self.programs = programs;
        self
    }

    /// Whether statuses are posted to the hosting platform.
    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_repository_parse() {
        let repo: Repository = "flathub/org.example.App".parse().unwrap();
        assert_eq!(repo.owner, "flathub");
        assert_eq!(repo.name, "org.example.App");
        assert_eq!(repo.to_string(), "flathub/org.example.App");
    }

    #[test]
    fn test_repository_parse_rejects_malformed() {
        for bad in ["", "owner", "/name", "owner/", "a/b/c"] {
            assert!(
                matches!(bad.parse::<Repository>(), Err(ConfigError::InvalidRepository(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_pull_request_event_from_payload() {
        let payload = json!({ "pull_request": { "number": 42 }, "number": 7 });
        assert_eq!(
            EventContext::from_payload("pull_request", Some(&payload)),
            EventContext::PullRequest { number: 42 }
        );
    }

    #[test]
    fn test_pull_request_number_fallback() {
        let payload = json!({ "number": 7 });
        assert_eq!(
            EventContext::from_payload("pull_request_target", Some(&payload)),
            EventContext::PullRequest { number: 7 }
        );
    }

    #[test]
    fn test_pull_request_without_number_is_push() {
        let payload = json!({ "action": "opened" });
        assert_eq!(
            EventContext::from_payload("pull_request", Some(&payload)),
            EventContext::Push
        );
        assert_eq!(EventContext::from_payload("pull_request", None), EventContext::Push);
    }

    #[test]
    fn test_other_events_are_push() {
        let payload = json!({ "pull_request": { "number": 42 } });
        assert_eq!(EventContext::from_payload("push", Some(&payload)), EventContext::Push);
        assert_eq!(
            EventContext::from_payload("workflow_dispatch", None),
            EventContext::Push
        );
    }

    #[test]
    fn test_load_reads_payload_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pull_request": {{"number": 3}}}}"#).unwrap();

        let event = EventContext::load("pull_request", Some(file.path())).unwrap();
        assert_eq!(event, EventContext::PullRequest { number: 3 });
    }

    #[test]
    fn test_load_skips_payload_for_push() {
        let missing = Path::new("/nonexistent/event.json");
        assert_eq!(
            EventContext::load("push", Some(missing)).unwrap(),
            EventContext::Push
        );
    }

    #[test]
    fn test_load_missing_payload_file_is_error() {
        let missing = Path::new("/nonexistent/event.json");
        assert!(matches!(
            EventContext::load("pull_request", Some(missing)),
            Err(ConfigError::EventPayloadRead { .. })
        ));
    }

    #[test]
    fn test_load_invalid_payload_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            EventContext::load("pull_request", Some(file.path())),
            Err(ConfigError::EventPayloadParse(_))
        ));
    }

    #[test]
    fn test_remote_config_requires_fields() {
        assert!(matches!(
            RemoteConfig::new(None, Some("abc"), Some("t")),
            Err(ConfigError::Missing(_))
        ));
        assert!(matches!(
            RemoteConfig::new(Some("o/r"), Some("  "), Some("t")),
            Err(ConfigError::Missing(_))
        ));
        assert!(matches!(
            RemoteConfig::new(Some("o/r"), Some("abc"), None),
            Err(ConfigError::Missing(_))
        ));
        assert!(matches!(
            RemoteConfig::new(Some("nope"), Some("abc"), Some("t")),
            Err(ConfigError::InvalidRepository(_))
        ));
    }

    #[test]
    fn test_remote_config_defaults() {
        let remote = RemoteConfig::new(Some("o/r"), Some("abc123"), Some("tok")).unwrap();
        assert_eq!(remote.api_url, DEFAULT_API_URL);
        assert_eq!(remote.target_url, "https://github.com/o/r/actions");
        assert_eq!(remote.sha, "abc123");
    }

    #[test]
    fn test_remote_config_with_run() {
        let remote = RemoteConfig::new(Some("o/r"), Some("abc123"), Some("tok"))
            .unwrap()
            .with_api_url("https://ghe.example.com/api/v3/")
            .with_run("https://ghe.example.com/", Some("991"));
        assert_eq!(remote.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(
            remote.target_url,
            "https://ghe.example.com/o/r/actions/runs/991"
        );
    }

    #[test]
    fn test_check_config_builder() {
        let config = CheckConfig::new("/src", true)
            .with_event(EventContext::PullRequest { number: 5 });
        assert!(config.strict);
        assert!(!config.is_remote());
        assert_eq!(config.workspace, PathBuf::from("/src"));
        assert_eq!(config.event, EventContext::PullRequest { number: 5 });
        assert_eq!(config.programs, ValidatorPrograms::default());
    }
}
