//! Validator selection and command construction.

use crate::error::CommandError;
use crate::runner::CommandRunner;

/// Filename suffix of AppStream metadata files.
pub const APPDATA_SUFFIX: &str = ".appdata.xml";

/// Filename suffix of desktop entry files.
pub const DESKTOP_SUFFIX: &str = ".desktop";

/// Which external validator a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Validator {
    /// appstream-util validate / validate-strict
    Appdata,

    /// desktop-file-validate
    Desktop,

    /// Not an XDG file; never validated.
    Unrecognized,
}

impl Validator {
    /// Resolve the validator for a filename. First matching suffix wins.
    pub fn resolve(filename: &str) -> Self {
        if filename.ends_with(APPDATA_SUFFIX) {
            Validator::Appdata
        } else if filename.ends_with(DESKTOP_SUFFIX) {
            Validator::Desktop
        } else {
            Validator::Unrecognized
        }
    }

    /// Get the validator name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Validator::Appdata => "appdata",
            Validator::Desktop => "desktop",
            Validator::Unrecognized => "unrecognized",
        }
    }

    /// Build the command line validating `filename`, or `None` when unrecognized.
    pub fn command(
        &self,
        filename: &str,
        strict: bool,
        programs: &ValidatorPrograms,
    ) -> Option<ValidatorCommand> {
        match self {
            Validator::Appdata => {
                let subcommand = if strict { "validate-strict" } else { "validate" };
                Some(ValidatorCommand {
                    program: programs.appstream_util.clone(),
                    args: vec![subcommand.to_string(), filename.to_string()],
                })
            }
            Validator::Desktop => Some(ValidatorCommand {
                program: programs.desktop_file_validate.clone(),
                args: vec![filename.to_string()],
            }),
            Validator::Unrecognized => None,
        }
    }
}

impl std::fmt::Display for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Executables used for each validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorPrograms {
    pub appstream_util: String,
    pub desktop_file_validate: String,
}

impl Default for ValidatorPrograms {
    fn default() -> Self {
        Self {
            appstream_util: "appstream-util".to_string(),
            desktop_file_validate: "desktop-file-validate".to_string(),
        }
    }
}

/// A resolved validator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl std::fmt::Display for ValidatorCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Routes files to their validator. `strict` is fixed for the whole run.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    strict: bool,
    programs: ValidatorPrograms,
}

impl Dispatcher {
    pub fn new(strict: bool, programs: ValidatorPrograms) -> Self {
        Self { strict, programs }
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Command that would validate `filename` with an already-resolved validator.
    pub fn command_for(&self, validator: Validator, filename: &str) -> Option<ValidatorCommand> {
        validator.command(filename, self.strict, &self.programs)
    }

    /// Validate `filename`. Returns `None` without running anything for
    /// unrecognized suffixes.
    pub async fn dispatch<R>(
        &self,
        runner: &R,
        filename: &str,
    ) -> Option<Result<String, CommandError>>
    where
        R: CommandRunner + ?Sized,
    {
        self.dispatch_resolved(runner, Validator::resolve(filename), filename)
            .await
    }

    /// Same as [`Dispatcher::dispatch`] when the caller already resolved the validator.
    pub async fn dispatch_resolved<R>(
        &self,
        runner: &R,
        validator: Validator,
        filename: &str,
    ) -> Option<Result<String, CommandError>>
    where
        R: CommandRunner + ?Sized,
    {
        let command = self.command_for(validator, filename)?;
        tracing::debug!(file = %filename, validator = %validator, command = %command, "Dispatching validator");
        Some(runner.run(&command.program, &command.args).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{ScriptedResponse, ScriptedRunner};

    #[test]
    fn test_resolve_by_suffix() {
        assert_eq!(Validator::resolve("foo.appdata.xml"), Validator::Appdata);
        assert_eq!(
            Validator::resolve("data/org.example.App.appdata.xml"),
            Validator::Appdata
        );
        assert_eq!(Validator::resolve("foo.desktop"), Validator::Desktop);
        assert_eq!(Validator::resolve("readme.md"), Validator::Unrecognized);
        assert_eq!(Validator::resolve("foo.xml"), Validator::Unrecognized);
        assert_eq!(
            Validator::resolve("foo.appdata.xml.in"),
            Validator::Unrecognized
        );
        assert_eq!(Validator::resolve("foo.desktop.in"), Validator::Unrecognized);
    }

    #[test]
    fn test_validator_names() {
        assert_eq!(Validator::Appdata.name(), "appdata");
        assert_eq!(Validator::Desktop.name(), "desktop");
        assert_eq!(Validator::Unrecognized.to_string(), "unrecognized");
    }

    #[test]
    fn test_appdata_command_default() {
        let cmd = Validator::Appdata
            .command("a.appdata.xml", false, &ValidatorPrograms::default())
            .expect("appdata has a command");
        assert_eq!(cmd.program, "appstream-util");
        assert_eq!(cmd.args, vec!["validate", "a.appdata.xml"]);
    }

    #[test]
    fn test_appdata_command_strict() {
        let cmd = Validator::Appdata
            .command("a.appdata.xml", true, &ValidatorPrograms::default())
            .expect("appdata has a command");
        assert_eq!(cmd.program, "appstream-util");
        assert_eq!(cmd.args, vec!["validate-strict", "a.appdata.xml"]);
        assert_eq!(cmd.to_string(), "appstream-util validate-strict a.appdata.xml");
    }

    #[test]
    fn test_desktop_command_ignores_strict() {
        let programs = ValidatorPrograms::default();
        let lax = Validator::Desktop.command("a.desktop", false, &programs);
        let strict = Validator::Desktop.command("a.desktop", true, &programs);
        assert_eq!(lax, strict);

        let cmd = lax.expect("desktop has a command");
        assert_eq!(cmd.program, "desktop-file-validate");
        assert_eq!(cmd.args, vec!["a.desktop"]);
    }

    #[test]
    fn test_unrecognized_has_no_command() {
        assert!(Validator::Unrecognized
            .command("readme.md", true, &ValidatorPrograms::default())
            .is_none());
    }

    #[test]
    fn test_custom_programs() {
        let programs = ValidatorPrograms {
            appstream_util: "/opt/bin/appstream-util".to_string(),
            desktop_file_validate: "/opt/bin/desktop-file-validate".to_string(),
        };
        let dispatcher = Dispatcher::new(false, programs);
        let cmd = dispatcher
            .command_for(Validator::Desktop, "x.desktop")
            .expect("desktop has a command");
        assert_eq!(cmd.program, "/opt/bin/desktop-file-validate");
    }

    #[tokio::test]
    async fn test_dispatch_unrecognized_is_noop() {
        let runner = ScriptedRunner::new();
        let dispatcher = Dispatcher::new(false, ValidatorPrograms::default());

        assert!(dispatcher.dispatch(&runner, "readme.md").await.is_none());
        assert!(runner.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_runs_resolved_command() {
        let runner = ScriptedRunner::new()
            .respond("bad.appdata.xml", ScriptedResponse::fail("bad.appdata.xml: ERROR"));
        let dispatcher = Dispatcher::new(true, ValidatorPrograms::default());

        let result = dispatcher
            .dispatch(&runner, "bad.appdata.xml")
            .await
            .expect("appdata is dispatched");
        assert!(matches!(result, Err(CommandError::Failed { .. })));

        let calls = runner.invocations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "appstream-util");
        assert_eq!(calls[0].args, vec!["validate-strict", "bad.appdata.xml"]);
    }
}
