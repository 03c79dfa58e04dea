//! Commit status reporting.

use crate::annotation::{Annotation, AnnotationSink};
use crate::error::ReportError;
use crate::github::{StatusApi, StatusRequest};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Status context every update is posted under.
pub const STATUS_CONTEXT: &str = "status-check/xdg";

/// GitHub rejects longer status descriptions.
pub const MAX_DESCRIPTION_CHARS: usize = 140;

/// State of a commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Error,
    Failure,
    Pending,
    Success,
}

impl CommitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitState::Error => "error",
            CommitState::Failure => "failure",
            CommitState::Pending => "pending",
            CommitState::Success => "success",
        }
    }

    /// Whether no further updates are expected after this state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommitState::Pending)
    }
}

impl FromStr for CommitState {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(CommitState::Error),
            "failure" => Ok(CommitState::Failure),
            "pending" => Ok(CommitState::Pending),
            "success" => Ok(CommitState::Success),
            other => Err(ReportError::InvalidState(other.to_string())),
        }
    }
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shorten a description to [`MAX_DESCRIPTION_CHARS`], ending in an ellipsis.
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_CHARS {
        return description.to_string();
    }
    let mut out: String = description.chars().take(MAX_DESCRIPTION_CHARS - 1).collect();
    out.push('…');
    out
}

/// Posts commit statuses for one commit and forwards annotations to a sink.
pub struct StatusReporter {
    api: Arc<dyn StatusApi>,
    sink: Arc<dyn AnnotationSink>,
    sha: String,
    target_url: String,
}

impl StatusReporter {
    pub fn new(
        api: Arc<dyn StatusApi>,
        sink: Arc<dyn AnnotationSink>,
        sha: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            api,
            sink,
            sha: sha.into(),
            target_url: target_url.into(),
        }
    }

    pub fn sha(&self) -> &str {
        &self.sha
    }

    /// Post `state` with `description` under [`STATUS_CONTEXT`].
    pub async fn set_status(&self, state: CommitState, description: &str) -> Result<(), ReportError> {
        let request = StatusRequest {
            state,
            target_url: self.target_url.clone(),
            description: truncate_description(description),
            context: STATUS_CONTEXT.to_string(),
        };
        debug!(sha = %self.sha, state = %state, description = %request.description, "Setting commit status");
        self.api.create_status(&self.sha, &request).await?;
        Ok(())
    }

    /// Like [`StatusReporter::set_status`] for a state given as text.
    ///
    /// Anything outside `error | failure | pending | success` is rejected
    /// before any request is made.
    pub async fn set_status_str(&self, state: &str, description: &str) -> Result<(), ReportError> {
        let state: CommitState = state.parse()?;
        self.set_status(state, description).await
    }

    /// Emit one annotation.
    pub fn annotate(&self, annotation: &Annotation) {
        self.sink.annotate(annotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Severity;
    use crate::fakes::{MemorySink, MemoryStatusApi};

    fn reporter(api: Arc<MemoryStatusApi>, sink: Arc<MemorySink>) -> StatusReporter {
        StatusReporter::new(api, sink, "abc123", "https://github.com/o/r/actions")
    }

    #[test]
    fn test_commit_state_parse() {
        assert_eq!("error".parse::<CommitState>().unwrap(), CommitState::Error);
        assert_eq!("failure".parse::<CommitState>().unwrap(), CommitState::Failure);
        assert_eq!("pending".parse::<CommitState>().unwrap(), CommitState::Pending);
        assert_eq!("success".parse::<CommitState>().unwrap(), CommitState::Success);
    }

    #[test]
    fn test_commit_state_rejects_unknown() {
        for bad in ["", "ok", "passed", "SUCCESS", "failed"] {
            assert!(matches!(
                bad.parse::<CommitState>(),
                Err(ReportError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn test_commit_state_terminal() {
        assert!(!CommitState::Pending.is_terminal());
        assert!(CommitState::Success.is_terminal());
        assert!(CommitState::Failure.is_terminal());
        assert!(CommitState::Error.is_terminal());
    }

    #[test]
    fn test_truncate_description() {
        assert_eq!(truncate_description("short"), "short");

        let exact = "x".repeat(MAX_DESCRIPTION_CHARS);
        assert_eq!(truncate_description(&exact), exact);

        let long = format!("Checking {}...", "dir/".repeat(60));
        let truncated = truncate_description(&long);
        assert_eq!(truncated.chars().count(), MAX_DESCRIPTION_CHARS);
        assert!(truncated.ends_with('…'));
    }

    #[tokio::test]
    async fn test_set_status_posts_request() {
        let api = Arc::new(MemoryStatusApi::new());
        let sink = Arc::new(MemorySink::new());
        let reporter = reporter(api.clone(), sink);

        reporter
            .set_status(CommitState::Pending, "Validating XDG files...")
            .await
            .unwrap();

        let statuses = api.statuses();
        assert_eq!(statuses.len(), 1);
        let (sha, request) = &statuses[0];
        assert_eq!(sha, "abc123");
        assert_eq!(request.state, CommitState::Pending);
        assert_eq!(request.description, "Validating XDG files...");
        assert_eq!(request.context, STATUS_CONTEXT);
        assert_eq!(request.target_url, "https://github.com/o/r/actions");
    }

    #[tokio::test]
    async fn test_set_status_str_rejects_invalid_state() {
        let api = Arc::new(MemoryStatusApi::new());
        let reporter = reporter(api.clone(), Arc::new(MemorySink::new()));

        let err = reporter.set_status_str("done", "whatever").await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidState(s) if s == "done"));
        assert!(api.statuses().is_empty(), "nothing should be posted");
    }

    #[tokio::test]
    async fn test_set_status_api_failure_is_reported() {
        let api = Arc::new(MemoryStatusApi::new().failing_statuses());
        let reporter = reporter(api.clone(), Arc::new(MemorySink::new()));

        let err = reporter
            .set_status(CommitState::Success, "XDG files are valid")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Api(_)));
    }

    #[test]
    fn test_annotate_forwards_to_sink() {
        let sink = Arc::new(MemorySink::new());
        let reporter = reporter(Arc::new(MemoryStatusApi::new()), sink.clone());

        reporter.annotate(&Annotation::error("bad").in_file("a.desktop"));

        let recorded = sink.annotations();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].severity, Severity::Error);
        assert_eq!(recorded[0].location.file.as_deref(), Some("a.desktop"));
    }
}
