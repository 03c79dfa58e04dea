//! In-memory fakes for the trait seams (testing only)
//!
//! Provides `ScriptedRunner`, `MemoryStatusApi` and `MemorySink` so the
//! orchestration can be exercised without validator binaries or network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::annotation::{Annotation, AnnotationSink};
use crate::error::{ApiError, CommandError};
use crate::github::{StatusApi, StatusRequest};
use crate::runner::CommandRunner;
use crate::validator::ValidatorCommand;

// ---------------------------------------------------------------------------
// ScriptedRunner
// ---------------------------------------------------------------------------

/// Canned result for one file.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Exit 0 with this stdout.
    Pass(String),

    /// Non-zero exit with this output.
    Fail { code: i32, message: String },

    /// The program cannot be started.
    Missing,
}

impl ScriptedResponse {
    pub fn pass() -> Self {
        ScriptedResponse::Pass(String::new())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        ScriptedResponse::Fail {
            code: 1,
            message: message.into(),
        }
    }
}

/// Runner that answers from a script keyed by the last argument (the file).
///
/// Files without a script pass.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: HashMap<String, ScriptedResponse>,
    invocations: Mutex<Vec<ValidatorCommand>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, file: impl Into<String>, response: ScriptedResponse) -> Self {
        self.responses.insert(file.into(), response);
        self
    }

    /// Every command run so far, in order.
    pub fn invocations(&self) -> Vec<ValidatorCommand> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, CommandError> {
        self.invocations.lock().unwrap().push(ValidatorCommand {
            program: program.to_string(),
            args: args.to_vec(),
        });

        let key = args.last().cloned().unwrap_or_default();
        match self.responses.get(&key) {
            None => Ok(String::new()),
            Some(ScriptedResponse::Pass(out)) => Ok(out.trim().to_string()),
            Some(ScriptedResponse::Fail { code, message }) => Err(CommandError::Failed {
                program: program.to_string(),
                code: *code,
                message: message.trim().to_string(),
            }),
            Some(ScriptedResponse::Missing) => Err(CommandError::Launch {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStatusApi
// ---------------------------------------------------------------------------

/// Records statuses and serves pull request file lists from memory.
#[derive(Debug, Default)]
pub struct MemoryStatusApi {
    statuses: Mutex<Vec<(String, StatusRequest)>>,
    pull_files: HashMap<u64, Vec<String>>,
    fail_statuses: bool,
}

impl MemoryStatusApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `files` for pull request `number`.
    pub fn with_pull_request(mut self, number: u64, files: &[&str]) -> Self {
        self.pull_files
            .insert(number, files.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Make every `create_status` call fail (after recording the attempt).
    pub fn failing_statuses(mut self) -> Self {
        self.fail_statuses = true;
        self
    }

    /// `(sha, request)` pairs in the order they were posted.
    pub fn statuses(&self) -> Vec<(String, StatusRequest)> {
        self.statuses.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusApi for MemoryStatusApi {
    async fn create_status(&self, sha: &str, request: &StatusRequest) -> Result<(), ApiError> {
        self.statuses
            .lock()
            .unwrap()
            .push((sha.to_string(), request.clone()));
        if self.fail_statuses {
            return Err(ApiError::Status {
                status: 502,
                body: "Bad Gateway".to_string(),
            });
        }
        Ok(())
    }

    async fn list_pull_request_files(&self, number: u64) -> Result<Vec<String>, ApiError> {
        self.pull_files
            .get(&number)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: format!("pull request #{} not found", number),
            })
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Collects annotations instead of printing them.
#[derive(Debug, Default)]
pub struct MemorySink {
    annotations: Mutex<Vec<Annotation>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.annotations.lock().unwrap().clone()
    }
}

impl AnnotationSink for MemorySink {
    fn annotate(&self, annotation: &Annotation) {
        self.annotations.lock().unwrap().push(annotation.clone());
    }
}
