//! Workflow annotations (`::error file=...::message`).
//!
//! Annotations are printed to stdout in GitHub Actions workflow-command form so
//! the runner attaches them to files in the pull request view.

use std::io::Write;

/// Annotation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Debug,
    Warning,
    Error,
}

impl Severity {
    /// Workflow command name.
    pub fn command(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Optional source position an annotation is attached to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub col: Option<u32>,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.line.is_none() && self.col.is_none()
    }
}

/// One structured log message for the CI platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub severity: Severity,
    pub message: String,
    pub location: Location,
}

impl Annotation {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            location: Location::default(),
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Attach to a file.
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.location.file = Some(file.into());
        self
    }

    /// Attach to a line (and optionally a column) of the file.
    pub fn at(mut self, line: u32, col: Option<u32>) -> Self {
        self.location.line = Some(line);
        self.location.col = col;
        self
    }
}

impl std::fmt::Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "::{}", self.severity.command())?;

        let mut props = Vec::new();
        if let Some(file) = &self.location.file {
            props.push(format!("file={}", escape_property(file)));
        }
        if let Some(line) = self.location.line {
            props.push(format!("line={}", line));
        }
        if let Some(col) = self.location.col {
            props.push(format!("col={}", col));
        }
        if !props.is_empty() {
            write!(f, " {}", props.join(","))?;
        }

        write!(f, "::{}", escape_data(&self.message))
    }
}

/// Escape a workflow command message.
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a workflow command property value.
pub fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

/// Destination for annotations.
pub trait AnnotationSink: Send + Sync {
    fn annotate(&self, annotation: &Annotation);
}

/// Writes workflow commands to stdout, one per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl AnnotationSink for StdoutSink {
    fn annotate(&self, annotation: &Annotation) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = writeln!(handle, "{}", annotation) {
            tracing::warn!(error = %e, "Failed to write annotation");
        }
    }
}
