//! Calibration form session.
//!
//! [`CalibrationSession`] is the command interface behind the form: one
//! method per user action. Each action runs to completion, catches its own
//! failure, writes one summary line to the session log and reports an
//! [`ActionOutcome`]. A path of `None` stands for a cancelled file dialog.

use crate::config::SessionConfig;
use crate::log::SessionLog;
use calib_core::{
    default_record, store, CalibError, CalibrationRecord, FieldId, FormFields, Histogram,
    Result,
};
use std::path::Path;

/// Result of one user action.
#[derive(Debug)]
pub enum ActionOutcome {
    /// The action ran to completion
    Completed,
    /// The user dismissed the file selection; nothing was read or written
    Cancelled,
    /// The action failed; the error has already been logged
    Failed(CalibError),
}

impl ActionOutcome {
    /// Whether the action completed
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Whether the action was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The error of a failed action
    pub fn error(&self) -> Option<&CalibError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Process exit status: non-zero only for a failed action.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Completed | Self::Cancelled => 0,
            Self::Failed(_) => 1,
        }
    }
}

/// Output of the synthetic reprojection test, kept for the plot surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRun {
    /// Mean error the samples were centred on
    pub mean_error: f64,
    /// Absolute sampled errors
    pub samples: Vec<f64>,
    /// Binned samples
    pub histogram: Histogram,
}

/// Form state, log and configuration of one interactive session.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    config: SessionConfig,
    form: FormFields,
    log: SessionLog,
    last_test: Option<TestRun>,
}

impl Default for CalibrationSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl CalibrationSession {
    /// Start a session with an empty form.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            form: FormFields::new(),
            log: SessionLog::new(),
            last_test: None,
        }
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current form text
    pub fn form(&self) -> &FormFields {
        &self.form
    }

    /// Session log
    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Result of the most recent successful test run
    pub fn last_test(&self) -> Option<&TestRun> {
        self.last_test.as_ref()
    }

    /// Edit one form field.
    pub fn edit(&mut self, field: FieldId, text: impl Into<String>) {
        self.form.set(field, text);
    }

    /// Fill the form with the canned default record.
    pub fn auto_fill(&mut self) -> ActionOutcome {
        self.form = FormFields::from_record(&default_record());
        self.log.info("Auto-filled calibration data with default values.");
        ActionOutcome::Completed
    }

    /// Collect the form and write it to `path`.
    ///
    /// The form is collected before the path is looked at, so a form that
    /// does not parse fails even when the dialog would have been cancelled.
    pub fn save(&mut self, path: Option<&Path>) -> ActionOutcome {
        let record = match self.collect_checked() {
            Ok(record) => record,
            Err(e) => return self.fail("Error saving calibration", e),
        };

        let Some(path) = path else {
            self.log.info("Save operation canceled.");
            return ActionOutcome::Cancelled;
        };

        match store::save_record(path, &record, self.config.json_indent) {
            Ok(()) => {
                self.log.info(format!("Calibration data saved to {}", path.display()));
                ActionOutcome::Completed
            }
            Err(e) => self.fail("Error saving calibration", e),
        }
    }

    /// Read the record at `path` and replace the whole form with it.
    ///
    /// On any failure the form is left exactly as it was.
    pub fn load(&mut self, path: Option<&Path>) -> ActionOutcome {
        let Some(path) = path else {
            self.log.info("Load operation canceled.");
            return ActionOutcome::Cancelled;
        };

        let strict = self.config.strict_validation;
        let result = store::load_record(path).and_then(|record| {
            let findings = record.validate(strict)?;
            Ok((record, findings))
        });

        match result {
            Ok((record, findings)) => {
                self.warn_findings(&findings);
                self.form = FormFields::from_record(&record);
                self.log.info(format!("Calibration data loaded from {}", path.display()));
                ActionOutcome::Completed
            }
            Err(e) => self.fail("Error loading calibration", e),
        }
    }

    /// Collect the form and run the synthetic reprojection test.
    pub fn run_test(&mut self) -> ActionOutcome {
        match self.synthetic_test() {
            Ok(run) => {
                self.last_test = Some(run);
                self.log.info("Test completed and plot generated successfully.");
                ActionOutcome::Completed
            }
            Err(e) => self.fail("Test failed", e),
        }
    }

    /// Write the session log to `path`.
    pub fn save_log(&mut self, path: Option<&Path>) -> ActionOutcome {
        let Some(path) = path else {
            self.log.info("Log save operation canceled.");
            return ActionOutcome::Cancelled;
        };

        match self.log.export(path) {
            Ok(()) => {
                self.log.info(format!("Log saved to {}", path.display()));
                ActionOutcome::Completed
            }
            Err(e) => self.fail("Error saving log", e),
        }
    }

    fn synthetic_test(&self) -> Result<TestRun> {
        let record = self.form.collect()?;
        let mean_error = record.mean_reprojection_error;
        let samples = self.config.test.sampler().sample(mean_error)?;
        let histogram = Histogram::from_samples(&samples, self.config.test.histogram_bins)?;
        Ok(TestRun {
            mean_error,
            samples,
            histogram,
        })
    }

    fn collect_checked(&mut self) -> Result<CalibrationRecord> {
        let record = self.form.collect()?;
        let findings = record.validate(self.config.strict_validation)?;
        self.warn_findings(&findings);
        Ok(record)
    }

    fn warn_findings(&mut self, findings: &[String]) {
        for finding in findings {
            self.log.warn(format!("Warning: {}", finding));
        }
    }

    fn fail(&mut self, context: &str, error: CalibError) -> ActionOutcome {
        tracing::debug!(kind = error.kind(), action = context, "Action failed");
        self.log.error(format!("{}: {}", context, error));
        ActionOutcome::Failed(error)
    }
}
