//! Command-line front end.
//!
//! Each subcommand drives one or two session actions. Flags stand in for the
//! form inputs and file dialogs: `--set KEY=VALUE` edits a field, and an
//! omitted `--output` is treated as a cancelled save dialog.

use crate::error::AppError;
use crate::render;
use crate::session::{ActionOutcome, CalibrationSession};
use calib_core::FieldId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Camera calibration form - enter, save, load and test calibration records
#[derive(Parser, Debug)]
#[command(name = "calib-form")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CALIB_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Export the session log to this file when the command finishes
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Action to perform
    #[command(subcommand)]
    pub command: Command,
}

/// Form actions
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Auto-fill the default calibration and save it
    Defaults {
        /// Destination file; omitted means the save is cancelled
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Edit fields and save the calibration
    Save {
        /// Start from this calibration file instead of an empty form
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Start from the default calibration
        #[arg(long, conflicts_with = "input")]
        defaults: bool,

        /// Field edit, e.g. `--set fx=1400.5` (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        assignments: Vec<String>,

        /// Destination file; omitted means the save is cancelled
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Load a calibration file and print its fields
    Show {
        /// Calibration file
        file: PathBuf,
    },

    /// Run the synthetic reprojection test and print the histogram
    Test {
        /// Start from this calibration file instead of an empty form
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Start from the default calibration
        #[arg(long, conflicts_with = "input")]
        defaults: bool,

        /// Field edit, e.g. `--set mean_error=0.5` (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        assignments: Vec<String>,

        /// Histogram bar width in characters
        #[arg(long, default_value_t = render::DEFAULT_BAR_WIDTH)]
        width: usize,
    },

    /// List every form field key
    Fields,
}

/// Split a `KEY=VALUE` edit into its field and text.
///
/// The value is everything after the first `=`, kept verbatim.
pub fn parse_assignment(assignment: &str) -> Result<(FieldId, String), AppError> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| AppError::Assignment(assignment.to_string()))?;
    let field: FieldId = key.parse()?;
    Ok((field, value.to_string()))
}

/// Result of running a command: the final action outcome and any text the
/// command produced for stdout besides the log.
#[derive(Debug)]
pub struct CommandOutput {
    /// Outcome of the last action performed
    pub outcome: ActionOutcome,
    /// Rendered report (fields, histogram) if any
    pub report: Option<String>,
}

impl CommandOutput {
    fn outcome(outcome: ActionOutcome) -> Self {
        Self {
            outcome,
            report: None,
        }
    }
}

/// Execute `command` against `session`.
///
/// Malformed `--set` edits are rejected before any action runs.
pub fn execute(
    command: &Command,
    session: &mut CalibrationSession,
) -> Result<CommandOutput, AppError> {
    match command {
        Command::Defaults { output } => {
            session.auto_fill();
            Ok(CommandOutput::outcome(session.save(output.as_deref())))
        }

        Command::Save {
            input,
            defaults,
            assignments,
            output,
        } => {
            let edits = parse_assignments(assignments)?;
            if let Some(failed) = prepare_form(session, input, *defaults, edits) {
                return Ok(CommandOutput::outcome(failed));
            }
            Ok(CommandOutput::outcome(session.save(output.as_deref())))
        }

        Command::Show { file } => {
            let outcome = session.load(Some(file.as_path()));
            let report = outcome
                .is_completed()
                .then(|| render::render_form(session.form()));
            Ok(CommandOutput { outcome, report })
        }

        Command::Test {
            input,
            defaults,
            assignments,
            width,
        } => {
            let edits = parse_assignments(assignments)?;
            if let Some(failed) = prepare_form(session, input, *defaults, edits) {
                return Ok(CommandOutput::outcome(failed));
            }
            let outcome = session.run_test();
            let report = session
                .last_test()
                .filter(|_| outcome.is_completed())
                .map(|run| render::render_test_run(run, *width));
            Ok(CommandOutput { outcome, report })
        }

        Command::Fields => {
            let report = FieldId::all(calib_core::form::DEFAULT_RADIAL_SLOTS)
                .into_iter()
                .map(|id| format!("{:<20} {}\n", id.to_string(), id.label()))
                .collect::<String>();
            Ok(CommandOutput {
                outcome: ActionOutcome::Completed,
                report: Some(report),
            })
        }
    }
}

/// Execute the parsed command line against `session`, then export the
/// session log when `--log-file` was given.
pub fn run(cli: &Cli, session: &mut CalibrationSession) -> Result<CommandOutput, AppError> {
    let output = execute(&cli.command, session)?;
    if let Some(path) = &cli.log_file {
        session.save_log(Some(path.as_path()));
    }
    Ok(output)
}

fn parse_assignments(assignments: &[String]) -> Result<Vec<(FieldId, String)>, AppError> {
    assignments.iter().map(|a| parse_assignment(a)).collect()
}

/// Seed the form from a file or the defaults, then apply edits.
///
/// Returns the failed outcome when the starting file could not be loaded.
fn prepare_form(
    session: &mut CalibrationSession,
    input: &Option<PathBuf>,
    defaults: bool,
    edits: Vec<(FieldId, String)>,
) -> Option<ActionOutcome> {
    if let Some(path) = input {
        let outcome = session.load(Some(path.as_path()));
        if !outcome.is_completed() {
            return Some(outcome);
        }
    } else if defaults {
        session.auto_fill();
    }

    for (field, text) in edits {
        session.edit(field, text);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use calib_core::{CalibError, FormFields};
    use std::ffi::OsStr;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_assignment() {
        let (field, value) = parse_assignment("fx=1400.5").unwrap();
        assert_eq!(field, FieldId::FocalLengthX);
        assert_eq!(value, "1400.5");

        let (field, value) = parse_assignment("units=milli=meters").unwrap();
        assert_eq!(field, FieldId::WorldUnits);
        assert_eq!(value, "milli=meters");

        let (field, value) = parse_assignment("k3=").unwrap();
        assert_eq!(field, FieldId::Radial(2));
        assert_eq!(value, "");
    }

    #[test]
    fn test_parse_assignment_errors() {
        assert!(matches!(
            parse_assignment("fx"),
            Err(AppError::Assignment(_))
        ));
        assert!(matches!(
            parse_assignment("focal=1"),
            Err(AppError::Record(_))
        ));
    }

    #[test]
    fn test_cli_parses_save() {
        let cli = Cli::try_parse_from([
            "calib-form",
            "save",
            "--defaults",
            "--set",
            "fx=1400",
            "--set",
            "p1=0.01",
            "--output",
            "out.json",
        ])
        .unwrap();

        match cli.command {
            Command::Save {
                defaults,
                assignments,
                output,
                input,
            } => {
                assert!(defaults);
                assert!(input.is_none());
                assert_eq!(assignments, vec!["fx=1400", "p1=0.01"]);
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            other => panic!("Expected save command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_input_with_defaults() {
        let result = Cli::try_parse_from([
            "calib-form",
            "test",
            "--defaults",
            "--input",
            "cal.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_execute_defaults_without_output_is_cancelled() {
        let mut session = CalibrationSession::default();
        let output = execute(&Command::Defaults { output: None }, &mut session).unwrap();

        assert!(output.outcome.is_cancelled());
        assert_eq!(session.log().last(), Some("Save operation canceled."));
    }

    #[test]
    fn test_execute_test_with_defaults_renders_histogram() {
        let mut session = CalibrationSession::default();
        let command = Command::Test {
            input: None,
            defaults: true,
            assignments: vec![],
            width: 20,
        };
        let output = execute(&command, &mut session).unwrap();

        assert!(output.outcome.is_completed());
        let report = output.report.unwrap();
        assert!(report.starts_with("Reprojection Error Histogram"));
        assert!(report.contains("100 samples"));
    }

    #[test]
    fn test_execute_rejects_bad_assignment_before_acting() {
        let mut session = CalibrationSession::default();
        let command = Command::Save {
            input: None,
            defaults: true,
            assignments: vec!["nonsense".to_string()],
            output: None,
        };

        assert!(execute(&command, &mut session).is_err());
        assert!(session.log().is_empty());
    }

    #[test]
    fn test_execute_rejects_radial_key_out_of_range() {
        let mut session = CalibrationSession::default();
        let command = Command::Save {
            input: None,
            defaults: true,
            assignments: vec!["k18446744073709551615=0.1".to_string()],
            output: None,
        };

        match execute(&command, &mut session) {
            Err(AppError::Record(CalibError::Parse { reason, .. })) => {
                assert!(reason.contains("out of range"));
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
        assert!(session.log().is_empty());
        assert_eq!(session.form(), &FormFields::new());
    }

    #[test]
    fn test_run_exports_log_file() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("calibration.json");
        let log_path = dir.path().join("session.log");
        let cli = Cli::try_parse_from([
            OsStr::new("calib-form"),
            OsStr::new("--log-file"),
            log_path.as_os_str(),
            OsStr::new("defaults"),
            OsStr::new("--output"),
            output_path.as_os_str(),
        ])
        .unwrap();

        let mut session = CalibrationSession::default();
        let output = run(&cli, &mut session).unwrap();

        assert!(output.outcome.is_completed());
        assert!(output_path.exists());
        let exported = fs::read_to_string(&log_path).unwrap();
        assert!(exported.starts_with("Auto-filled calibration data with default values.\n"));
        let saved_line = format!("Calibration data saved to {}", output_path.display());
        assert!(exported.ends_with(&saved_line));
        assert_eq!(
            session.log().last().unwrap(),
            format!("Log saved to {}", log_path.display())
        );
    }

    #[test]
    fn test_run_failed_command_exits_non_zero() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let cli = Cli::try_parse_from([
            OsStr::new("calib-form"),
            OsStr::new("show"),
            missing.as_os_str(),
        ])
        .unwrap();

        let mut session = CalibrationSession::default();
        let output = run(&cli, &mut session).unwrap();

        assert!(matches!(output.outcome.error(), Some(CalibError::Io { .. })));
        assert_eq!(output.outcome.exit_status(), 1);
        assert!(output.report.is_none());
    }

    #[test]
    fn test_execute_fields_lists_keys() {
        let mut session = CalibrationSession::default();
        let output = execute(&Command::Fields, &mut session).unwrap();
        let report = output.report.unwrap();

        assert_eq!(report.lines().count(), 17);
        assert!(report.contains("mean_error"));
    }
}
