//! Candidate file enumeration.

use crate::config::EventContext;
use crate::error::EnumerateError;
use crate::github::StatusApi;
use std::path::Path;
use tracing::{debug, warn};

/// Glob matching AppStream metadata, relative to the workspace.
pub const APPDATA_PATTERN: &str = "**/*.appdata.xml";

/// Glob matching desktop entries, relative to the workspace.
pub const DESKTOP_PATTERN: &str = "**/*.desktop";

/// A repository-relative path to check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateFile(String);

impl CandidateFile {
    pub fn new(path: impl Into<String>) -> Self {
        CandidateFile(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CandidateFile {
    fn from(path: String) -> Self {
        CandidateFile(path)
    }
}

impl From<&str> for CandidateFile {
    fn from(path: &str) -> Self {
        CandidateFile(path.to_string())
    }
}

impl std::fmt::Display for CandidateFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Files to check for this event.
///
/// Pull requests yield the changed files exactly as the API lists them
/// (platform order, duplicates kept). Every other event globs the workspace.
pub async fn enumerate(
    event: &EventContext,
    workspace: &Path,
    api: &dyn StatusApi,
) -> Result<Vec<CandidateFile>, EnumerateError> {
    match event {
        EventContext::PullRequest { number } => {
            let files = api.list_pull_request_files(*number).await?;
            debug!(pull_request = number, count = files.len(), "Listed pull request files");
            Ok(files.into_iter().map(CandidateFile::from).collect())
        }
        EventContext::Push => glob_candidates(workspace),
    }
}

/// All AppStream files, then all desktop entries, under `workspace`.
pub fn glob_candidates(workspace: &Path) -> Result<Vec<CandidateFile>, EnumerateError> {
    let mut files = glob_workspace(workspace, APPDATA_PATTERN)?;
    files.extend(glob_workspace(workspace, DESKTOP_PATTERN)?);
    debug!(workspace = %workspace.display(), count = files.len(), "Globbed candidate files");
    Ok(files)
}

fn glob_workspace(workspace: &Path, pattern: &str) -> Result<Vec<CandidateFile>, EnumerateError> {
    let root = glob::Pattern::escape(&workspace.to_string_lossy());
    let full = format!("{}/{}", root.trim_end_matches('/'), pattern);

    let mut files = Vec::new();
    for entry in glob::glob(&full)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable path");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(workspace).unwrap_or(&path);
        files.push(CandidateFile::new(relative.to_string_lossy()));
    }
    Ok(files)
}
