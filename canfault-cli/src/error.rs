//! CLI-specific error types and exit code mapping

use canfault_core::error::CanfaultError;
use canfault_runner::RunnerError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Scenario file could not be loaded or contains invalid scenarios.
    #[error("scenario error: {0}")]
    Scenario(String),

    /// The campaign ran to completion but some scenarios failed.
    #[error("campaign finished with {failed} of {total} scenarios failing")]
    CampaignFailed { failed: usize, total: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from canfault-core.
    #[error("{0}")]
    Core(#[from] CanfaultError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                               |
    /// |------|---------------------------------------|
    /// | 0    | Success                               |
    /// | 1    | General / command error               |
    /// | 2    | Configuration error                   |
    /// | 3    | Scenario file error                   |
    /// | 4    | Campaign completed with failures      |
    /// | 10   | IO error                              |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Core(CanfaultError::Config(_)) => 2,
            Self::Scenario(_) => 3,
            Self::CampaignFailed { .. } => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<RunnerError> for CliError {
    fn from(e: RunnerError) -> Self {
        match e {
            RunnerError::ScenarioLoad { .. } | RunnerError::Validation(_) => {
                Self::Scenario(e.to_string())
            }
            RunnerError::Injector(_) | RunnerError::Report(_) => Self::Command(e.to_string()),
        }
    }
}
