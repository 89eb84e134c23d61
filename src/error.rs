//! Error types for fbsweep
//!
//! Library code returns [`Result`]; the CLI layer wraps these in `anyhow`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, SweepError>;

/// Failures a sweep can hit. None of them are recovered locally.
#[derive(Error, Debug)]
pub enum SweepError {
    /// Invalid or missing configuration field
    #[error("configuration error: {0}")]
    Config(String),

    /// File write/read failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External scoring program exited non-zero
    #[error("{program} exited with {}\n{output}", code.map(|c| c.to_string()).unwrap_or_else(|| "a signal".to_string()))]
    Process {
        program: String,
        /// None when the process was terminated by a signal
        code: Option<i32>,
        /// Combined stdout/stderr captured while it ran
        output: String,
    },

    /// Transport failure or non-2xx response from the evaluation service
    #[error("upload failed: {0}")]
    Upload(String),

    /// External process or HTTP call exceeded its bound
    #[error("{operation} timed out after {}s", after.as_secs_f64())]
    Timeout { operation: String, after: Duration },

    /// Response body does not have the expected record structure
    #[error("could not parse evaluation response: {0}")]
    Parse(String),

    /// Report could not be serialized
    #[error("failed to encode report: {0}")]
    Encode(String),

    /// Any of the above, tagged with where in the sweep it happened
    #[error("experiment {experiment} (batch {batch}) failed")]
    Experiment {
        batch: String,
        experiment: String,
        #[source]
        source: Box<SweepError>,
    },
}

impl SweepError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach batch/experiment context
    pub(crate) fn in_experiment(self, batch: &str, experiment: &str) -> Self {
        Self::Experiment {
            batch: batch.to_string(),
            experiment: experiment.to_string(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping experiment context wrappers
    pub fn root(&self) -> &SweepError {
        match self {
            Self::Experiment { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether a resubmission could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self.root(), Self::Upload(_))
    }
}
