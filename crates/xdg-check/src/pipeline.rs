//! Validation run orchestration.

use crate::annotation::{Annotation, AnnotationSink};
use crate::config::{CheckConfig, EventContext};
use crate::enumerate::{enumerate, CandidateFile};
use crate::error::{CommandError, Result};
use crate::github::StatusApi;
use crate::queue::SequentialQueue;
use crate::reporter::{CommitState, StatusReporter};
use crate::runner::CommandRunner;
use crate::validator::{Dispatcher, Validator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Description of the opening `pending` status.
pub const MSG_VALIDATING: &str = "Validating XDG files...";

/// Description of the terminal `failure` status.
pub const MSG_FAILURE: &str = "One or more XDG files are not valid";

/// Description of the terminal `success` status.
pub const MSG_SUCCESS: &str = "XDG files are valid";

/// Sha used for statuses when no remote is configured.
pub const LOCAL_SHA: &str = "local";

/// Result of validating one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,

    /// Diagnostic lines, one annotation each.
    Invalid(Vec<String>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }
}

/// What happened to one candidate file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub file: CandidateFile,
    pub validator: Validator,

    /// `None` when the file was skipped (unrecognized suffix).
    pub outcome: Option<ValidationOutcome>,
}

impl FileOutcome {
    pub fn skipped(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, Some(ValidationOutcome::Invalid(_)))
    }
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Every candidate, in enumeration order.
    pub outcomes: Vec<FileOutcome>,

    /// Files with an `Invalid` outcome, in enumeration order.
    pub failed: Vec<String>,

    /// Commit status updates that could not be delivered.
    pub reporting_failures: usize,

    /// The terminal status that was reported.
    pub final_state: CommitState,

    pub duration_ms: u64,
}

impl RunReport {
    /// Whether every checked file is valid.
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn checked_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.skipped()).count()
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Some(ValidationOutcome::Valid)))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.failed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.skipped()).count()
    }
}

struct Checked {
    outcome: FileOutcome,
    reporting_failures: usize,
}

/// Validation run orchestrator.
///
/// Sequence: `pending` → enumerate → per recognized file (`pending`, debug
/// annotation, validate, error annotations) → `success` or `failure`.
pub struct XdgCheck {
    runner: Arc<dyn CommandRunner>,
    api: Arc<dyn StatusApi>,
    reporter: StatusReporter,
    dispatcher: Dispatcher,
    queue: SequentialQueue,
    event: EventContext,
    workspace: PathBuf,
}

impl XdgCheck {
    pub fn new(
        config: &CheckConfig,
        runner: Arc<dyn CommandRunner>,
        api: Arc<dyn StatusApi>,
        sink: Arc<dyn AnnotationSink>,
    ) -> Self {
        let (sha, target_url) = match &config.remote {
            Some(remote) => (remote.sha.clone(), remote.target_url.clone()),
            None => (LOCAL_SHA.to_string(), String::new()),
        };

        Self {
            runner,
            api: api.clone(),
            reporter: StatusReporter::new(api, sink, sha, target_url),
            dispatcher: Dispatcher::new(config.strict, config.programs.clone()),
            queue: SequentialQueue::new(),
            event: config.event,
            workspace: config.workspace.clone(),
        }
    }

    /// Validate every candidate file and report the aggregate status.
    ///
    /// Per-file problems never abort the run. Only a failure to enumerate
    /// candidates does; in that case an `error` status is reported first.
    pub async fn run(&self) -> Result<RunReport> {
        let start = Instant::now();
        let mut reporting_failures = 0;

        info!(sha = %self.reporter.sha(), strict = self.dispatcher.strict(), "Starting XDG validation");

        if !self.report(CommitState::Pending, MSG_VALIDATING).await {
            reporting_failures += 1;
        }

        let files = match enumerate(&self.event, &self.workspace, self.api.as_ref()).await {
            Ok(files) => files,
            Err(e) => {
                error!(error = %e, "Failed to enumerate candidate files");
                self.report(CommitState::Error, &format!("Failed to list XDG files: {}", e))
                    .await;
                return Err(e.into());
            }
        };
        info!(count = files.len(), "Enumerated candidate files");

        let checked = self
            .queue
            .run(files, move |file| self.check_file(file))
            .await;

        let mut outcomes = Vec::with_capacity(checked.len());
        for c in checked {
            reporting_failures += c.reporting_failures;
            outcomes.push(c.outcome);
        }

        let failed: Vec<String> = outcomes
            .iter()
            .filter(|o| o.failed())
            .map(|o| o.file.to_string())
            .collect();

        let (final_state, description) = if failed.is_empty() {
            (CommitState::Success, MSG_SUCCESS)
        } else {
            (CommitState::Failure, MSG_FAILURE)
        };
        if !self.report(final_state, description).await {
            reporting_failures += 1;
        }

        let report = RunReport {
            outcomes,
            failed,
            reporting_failures,
            final_state,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            checked = report.checked_count(),
            failed = report.failed_count(),
            skipped = report.skipped_count(),
            reporting_failures = report.reporting_failures,
            duration_ms = report.duration_ms,
            "XDG validation finished"
        );

        Ok(report)
    }

    async fn check_file(&self, file: CandidateFile) -> Checked {
        let validator = Validator::resolve(file.as_str());
        if validator == Validator::Unrecognized {
            return Checked {
                outcome: FileOutcome {
                    file,
                    validator,
                    outcome: None,
                },
                reporting_failures: 0,
            };
        }

        let mut reporting_failures = 0;
        let message = format!("Checking {}...", file);
        if !self.report(CommitState::Pending, &message).await {
            reporting_failures += 1;
        }
        self.reporter.annotate(&Annotation::debug(&message));

        let result = self
            .dispatcher
            .dispatch_resolved(self.runner.as_ref(), validator, file.as_str())
            .await;

        let outcome = match result {
            None => None,
            Some(Ok(_)) => {
                info!(file = %file, validator = %validator, "Valid");
                Some(ValidationOutcome::Valid)
            }
            Some(Err(CommandError::Failed { message, code, .. })) => {
                warn!(file = %file, validator = %validator, exit_code = code, "Invalid");
                let lines = diagnostic_lines(&message);
                for line in &lines {
                    self.reporter
                        .annotate(&Annotation::error(line.as_str()).in_file(file.as_str()));
                }
                Some(ValidationOutcome::Invalid(lines))
            }
            Some(Err(e)) => {
                warn!(file = %file, validator = %validator, error = %e, "Validation error");
                let text = e.to_string();
                self.reporter
                    .annotate(&Annotation::error(text.as_str()).in_file(file.as_str()));
                Some(ValidationOutcome::Invalid(vec![text]))
            }
        };

        Checked {
            outcome: FileOutcome {
                file,
                validator,
                outcome,
            },
            reporting_failures,
        }
    }

    /// Best-effort status update; returns whether it was delivered.
    async fn report(&self, state: CommitState, description: &str) -> bool {
        match self.reporter.set_status(state, description).await {
            Ok(()) => true,
            Err(e) => {
                warn!(state = %state, error = %e, "Failed to report commit status");
                false
            }
        }
    }
}

/// Non-empty lines of validator output.
pub fn diagnostic_lines(message: &str) -> Vec<String> {
    message
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
