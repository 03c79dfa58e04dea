//! xdg-check - validate freedesktop.org metadata in CI
//!
//! Without a subcommand, `xdg-check` runs the full check: it finds AppStream
//! and desktop entry files, validates them, prints workflow annotations on
//! stdout and posts a `status-check/xdg` commit status.
//!
//! ## Commands
//!
//! - `check`: same as running without a subcommand
//! - `status`: post a single commit status
//! - `list`: show candidate files and the validator each resolves to

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn, Level};

use xdg_check::config::{DEFAULT_API_URL, DEFAULT_SERVER_URL};
use xdg_check::{
    enumerate, glob_candidates, CheckConfig, CommitState, ConfigError, Dispatcher, EventContext,
    GitHubClient, OfflineApi, ProcessRunner, RemoteConfig, RunReport, StatusApi, StatusReporter,
    StdoutSink, Validator, ValidatorPrograms, XdgCheck,
};

#[derive(Parser)]
#[command(name = "xdg-check")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Validate AppStream and desktop entry files and report a GitHub commit status",
    long_about = None
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    check: CheckArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate XDG files and report the result (default)
    Check(CheckArgs),

    /// Post a single commit status
    Status {
        /// One of: error, failure, pending, success
        state: String,

        /// Human-readable description
        description: String,

        #[command(flatten)]
        github: GitHubArgs,
    },

    /// List candidate files and the validator command for each
    List {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        validators: ValidatorArgs,

        #[command(flatten)]
        github: GitHubArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct CheckArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    validators: ValidatorArgs,

    #[command(flatten)]
    github: GitHubArgs,

    /// Run without the GitHub API: glob the workspace and only log statuses
    #[arg(long)]
    local: bool,
}

#[derive(Args, Debug, Clone)]
struct SourceArgs {
    /// Repository checkout to validate
    #[arg(short, long, env = "GITHUB_WORKSPACE", default_value = ".")]
    workspace: PathBuf,

    /// Triggering event (pull_request checks only the changed files)
    #[arg(long, env = "GITHUB_EVENT_NAME", default_value = "push")]
    event_name: String,

    /// Path of the JSON event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct ValidatorArgs {
    /// Validate AppStream files with `appstream-util validate-strict`
    #[arg(
        long,
        env = "INPUT_STRICT",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_strict
    )]
    strict: bool,

    /// appstream-util executable
    #[arg(long, env = "XDG_CHECK_APPSTREAM_UTIL", default_value = "appstream-util")]
    appstream_util: String,

    /// desktop-file-validate executable
    #[arg(
        long,
        env = "XDG_CHECK_DESKTOP_FILE_VALIDATE",
        default_value = "desktop-file-validate"
    )]
    desktop_file_validate: String,
}

/// Boolish flag value; empty means unset, as Actions passes undeclared inputs.
fn parse_strict(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        other => Err(format!("'{}' is not a boolean", other)),
    }
}

impl ValidatorArgs {
    fn programs(&self) -> ValidatorPrograms {
        ValidatorPrograms {
            appstream_util: self.appstream_util.clone(),
            desktop_file_validate: self.desktop_file_validate.clone(),
        }
    }

    fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.strict, self.programs())
    }
}

#[derive(Args, Debug, Clone)]
struct GitHubArgs {
    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Commit the status is attached to
    #[arg(long, env = "GITHUB_SHA")]
    sha: Option<String>,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// GitHub web URL, used for the status link
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    /// Workflow run the status links to
    #[arg(long, env = "GITHUB_RUN_ID")]
    run_id: Option<String>,
}

impl GitHubArgs {
    fn remote(&self) -> std::result::Result<RemoteConfig, ConfigError> {
        Ok(RemoteConfig::new(
            self.repository.as_deref(),
            self.sha.as_deref(),
            self.token.as_deref(),
        )?
        .with_api_url(&self.api_url)
        .with_run(&self.server_url, self.run_id.as_deref()))
    }
}

impl CheckArgs {
    fn config(&self) -> std::result::Result<CheckConfig, ConfigError> {
        let config = CheckConfig::new(&self.source.workspace, self.validators.strict)
            .with_programs(self.validators.programs());

        if self.local {
            return Ok(config);
        }

        let remote = self.github.remote()?;
        let event = EventContext::load(&self.source.event_name, self.source.event_path.as_deref())?;
        Ok(config.with_event(event).with_remote(remote))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    xdg_check::init_tracing(cli.json, level);

    match cli.command {
        None => cmd_check(&cli.check).await,
        Some(Commands::Check(args)) => cmd_check(&args).await,
        Some(Commands::Status {
            state,
            description,
            github,
        }) => cmd_status(&state, &description, &github).await,
        Some(Commands::List {
            source,
            validators,
            github,
        }) => cmd_list(&source, &validators, &github).await,
    }
}

fn status_api(config: &CheckConfig) -> Result<Arc<dyn StatusApi>> {
    match &config.remote {
        Some(remote) => Ok(Arc::new(
            GitHubClient::new(remote).context("Failed to create GitHub client")?,
        )),
        None => Ok(Arc::new(OfflineApi)),
    }
}

fn exit_code(report: &RunReport) -> ExitCode {
    if report.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Validate all candidate files and report the aggregate status
async fn cmd_check(args: &CheckArgs) -> Result<ExitCode> {
    let config = args.config().context("Invalid configuration")?;
    if !config.is_remote() {
        info!("Running locally; commit statuses are logged, not posted");
    }

    let api = status_api(&config)?;
    let runner = Arc::new(ProcessRunner::in_dir(&config.workspace));
    let check = XdgCheck::new(&config, runner, api, Arc::new(StdoutSink));

    let report = check.run().await.context("XDG validation aborted")?;

    for file in &report.failed {
        warn!(file = %file, "Not valid");
    }
    if report.reporting_failures > 0 {
        warn!(
            count = report.reporting_failures,
            "Some commit status updates could not be delivered"
        );
    }

    Ok(exit_code(&report))
}

/// Post a single commit status
async fn cmd_status(state: &str, description: &str, github: &GitHubArgs) -> Result<ExitCode> {
    let state: CommitState = state.parse()?;
    let remote = github.remote().context("Invalid configuration")?;

    let api = Arc::new(GitHubClient::new(&remote).context("Failed to create GitHub client")?);
    let reporter = StatusReporter::new(
        api,
        Arc::new(StdoutSink),
        remote.sha.clone(),
        remote.target_url.clone(),
    );

    reporter
        .set_status(state, description)
        .await
        .context("Failed to set commit status")?;

    info!(sha = %remote.sha, state = %state, "Commit status set");
    Ok(ExitCode::SUCCESS)
}

/// Print candidate files with the validator command each would run
async fn cmd_list(
    source: &SourceArgs,
    validators: &ValidatorArgs,
    github: &GitHubArgs,
) -> Result<ExitCode> {
    let event = EventContext::load(&source.event_name, source.event_path.as_deref())
        .context("Invalid event payload")?;

    let files = match (event, github.remote()) {
        (EventContext::PullRequest { .. }, Ok(remote)) => {
            let client = GitHubClient::new(&remote).context("Failed to create GitHub client")?;
            enumerate(&event, &source.workspace, &client)
                .await
                .context("Failed to list pull request files")?
        }
        (EventContext::PullRequest { number }, Err(e)) => {
            warn!(pull_request = number, error = %e, "No GitHub access; listing workspace files");
            glob_candidates(&source.workspace)?
        }
        (EventContext::Push, _) => glob_candidates(&source.workspace)?,
    };

    let dispatcher = validators.dispatcher();
    for file in &files {
        let validator = Validator::resolve(file.as_str());
        match dispatcher.command_for(validator, file.as_str()) {
            Some(command) => println!("{}\t{}\t{}", file, validator, command),
            None => println!("{}\t{}", file, validator),
        }
    }

    info!(count = files.len(), "Listed candidate files");
    Ok(ExitCode::SUCCESS)
}
