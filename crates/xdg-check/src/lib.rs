//! xdg-check - freedesktop.org metadata validation for CI
//!
//! Finds AppStream (`*.appdata.xml`) and desktop entry (`*.desktop`) files,
//! validates each with its external validator, and reports:
//! - one GitHub commit status (`pending` while running, then `success`/`failure`)
//! - one workflow annotation per diagnostic line, attached to the file

pub mod annotation;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod fakes;
pub mod github;
pub mod pipeline;
pub mod queue;
pub mod reporter;
pub mod runner;
pub mod telemetry;
pub mod validator;

// Re-export key types
pub use annotation::{Annotation, AnnotationSink, Location, Severity, StdoutSink};
pub use config::{CheckConfig, EventContext, RemoteConfig, Repository};
pub use enumerate::{enumerate, glob_candidates, CandidateFile};
pub use error::{ApiError, CommandError, ConfigError, EnumerateError, ReportError, XdgCheckError};
pub use github::{GitHubClient, OfflineApi, StatusApi, StatusRequest};
pub use pipeline::{FileOutcome, RunReport, ValidationOutcome, XdgCheck};
pub use queue::SequentialQueue;
pub use reporter::{CommitState, StatusReporter, STATUS_CONTEXT};
pub use runner::{CommandRunner, ProcessRunner};
pub use telemetry::init_tracing;
pub use validator::{Dispatcher, Validator, ValidatorCommand, ValidatorPrograms};
