//! Scoring invoker - runs the external retrieval program
//!
//! The program's contract is file-in/file-out: it takes one parameter file
//! path and writes the ranking file named inside it. Only the exit code is
//! interpreted here.

mod internal;

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SweepError};

/// Default bound on a single scorer run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Something that turns an experiment's parameter file into a ranking file
pub trait Scorer {
    /// Run the experiment named `experiment`, blocking until it exits.
    /// Returns the exit code; a non-zero exit is a [`SweepError::Process`].
    fn score(&self, experiment: &str) -> Result<i32>;
}

impl<T: Scorer + ?Sized> Scorer for &T {
    fn score(&self, experiment: &str) -> Result<i32> {
        (**self).score(experiment)
    }
}

/// Shells out to a fixed command with the parameter file appended
#[derive(Debug, Clone)]
pub struct ExternalScorer {
    program: String,
    args: Vec<String>,
    parameter_dir: PathBuf,
    timeout: Duration,
}

impl ExternalScorer {
    pub fn new(program: impl Into<String>, args: Vec<String>, parameter_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            parameter_dir: parameter_dir.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn parameter_file(&self, experiment: &str) -> PathBuf {
        self.parameter_dir.join(experiment)
    }

    /// Resolve the program on PATH before a long sweep starts
    pub fn check_available(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|e| {
            SweepError::Config(format!("scoring program '{}' not found: {}", self.program, e))
        })
    }
}

impl Scorer for ExternalScorer {
    fn score(&self, experiment: &str) -> Result<i32> {
        let parameter_file = self.parameter_file(experiment);
        let mut args = self.args.clone();
        args.push(parameter_file.display().to_string());

        tracing::info!(experiment, program = %self.program, "running scorer");
        let run = internal::run(&self.program, &args, experiment, self.timeout)?;

        match run.status.code() {
            Some(0) => Ok(0),
            code => Err(SweepError::Process {
                program: self.program.clone(),
                code,
                output: run.output,
            }),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ExternalScorer {
        ExternalScorer::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "sh".to_string()],
            "/params",
        )
    }

    #[test]
    fn test_parameter_file_is_last_argument() {
        // exits 0 only if $1 is the resolved parameter file
        let scorer = sh(r#"test "$1" = /params/exp1_2"#);
        assert_eq!(scorer.score("exp1_2").unwrap(), 0);
    }

    #[test]
    fn test_nonzero_exit_captures_both_streams() {
        let scorer = sh("echo ranking; echo broken >&2; exit 3");
        match scorer.score("exp2_1").unwrap_err() {
            SweepError::Process { code, output, .. } => {
                assert_eq!(code, Some(3));
                assert!(output.contains("ranking"));
                assert!(output.contains("broken"));
            }
            other => panic!("expected process error, got {other:?}"),
        }
    }

    #[test]
    fn test_hung_scorer_times_out() {
        let scorer = sh("sleep 5").with_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = scorer.score("exp3_1").unwrap_err();
        assert!(matches!(err, SweepError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_non_utf8_output_is_forwarded_and_drained() {
        // well past the pipe buffer, after a line that is not UTF-8
        let script = r"printf 'score \377 ok\n'; head -c 100000 /dev/zero | tr '\0' a; echo; echo done; exit 0";
        let scorer = sh(script);
        assert_eq!(scorer.score("exp1_4").unwrap(), 0);

        let args = vec!["-c".to_string(), script.to_string()];
        let run = internal::run("sh", &args, "exp1_4", Duration::from_secs(10)).unwrap();
        assert!(run.status.success());
        let lines: Vec<&str> = run.output.lines().collect();
        assert_eq!(lines[0], "score \u{FFFD} ok");
        assert_eq!(lines[1].len(), 100_000);
        assert_eq!(lines[2], "done");
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let scorer = ExternalScorer::new("fbsweep-no-such-scorer", Vec::new(), "/params");
        assert!(matches!(scorer.score("exp1_1"), Err(SweepError::Io { .. })));
        assert!(matches!(scorer.check_available(), Err(SweepError::Config(_))));
    }
}
