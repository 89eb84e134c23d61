//! Parameter files for the external scoring program
//!
//! One `key=value` per line, in a fixed order. The feedback block is only
//! written for configs that carry a [`FeedbackConfig`](super::FeedbackConfig).

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::ExperimentConfig;
use crate::error::{Result, SweepError};

/// Writes `<parameter_dir>/<experiment name>` files
#[derive(Debug, Clone)]
pub struct ParameterFileWriter {
    parameter_dir: PathBuf,
    expansion_dir: PathBuf,
}

impl ParameterFileWriter {
    pub fn new(parameter_dir: impl Into<PathBuf>, expansion_dir: impl Into<PathBuf>) -> Self {
        Self {
            parameter_dir: parameter_dir.into(),
            expansion_dir: expansion_dir.into(),
        }
    }

    /// Where the parameter file for `name` lives
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.parameter_dir.join(name)
    }

    /// Where the scoring program writes expanded queries for `name`
    pub fn expansion_query_path(&self, name: &str) -> PathBuf {
        self.expansion_dir.join(name)
    }

    /// File contents for `config`
    pub fn render(&self, config: &ExperimentConfig) -> String {
        let mut lines: Vec<(&str, String)> = vec![
            ("indexPath", display(&config.index_path)),
            ("retrievalAlgorithm", config.algorithm.selector().to_string()),
            ("queryFilePath", display(&config.query_file)),
            ("trecEvalOutputPath", display(&config.output_path)),
        ];
        lines.extend(config.algorithm.parameter_lines());

        if let Some(fb) = &config.feedback {
            lines.push(("fb", "true".to_string()));
            lines.push(("fbDocs", fb.docs.to_string()));
            lines.push(("fbTerms", fb.terms.to_string()));
            lines.push(("fbMu", fb.mu.to_string()));
            lines.push(("fbOrigWeight", fb.orig_weight.to_string()));
            lines.push((
                "fbExpansionQueryFile",
                display(&self.expansion_query_path(&config.name)),
            ));
            if let Some(ranking) = &fb.initial_ranking {
                lines.push(("fbInitialRankingFile", display(ranking)));
            }
        }

        let mut out = String::new();
        for (key, value) in lines {
            // Writing to a String cannot fail
            let _ = writeln!(out, "{}={}", key, value);
        }
        out
    }

    /// Create or overwrite the parameter file for `config`
    pub fn write(&self, config: &ExperimentConfig) -> Result<PathBuf> {
        let path = self.path_for(&config.name);
        fs::create_dir_all(&self.parameter_dir)
            .map_err(|e| SweepError::io(&self.parameter_dir, e))?;
        fs::write(&path, self.render(config)).map_err(|e| SweepError::io(&path, e))?;
        tracing::debug!(experiment = %config.name, path = %path.display(), "wrote parameter file");
        Ok(path)
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{
        BaseSettings, ExperimentBuilder, FeedbackConfig, RetrievalAlgorithm,
    };
    use tempfile::TempDir;

    fn base() -> BaseSettings {
        BaseSettings {
            index_path: PathBuf::from("/idx"),
            query_file: PathBuf::from("/q/queries.txt"),
            output_dir: PathBuf::from("/out"),
        }
    }

    fn indri() -> RetrievalAlgorithm {
        RetrievalAlgorithm::Indri {
            mu: 1000.0,
            lambda: 0.7,
        }
    }

    #[test]
    fn test_render_indri_without_feedback() {
        let writer = ParameterFileWriter::new("/params", "/exp");
        let config = ExperimentBuilder::new("exp1_2", &base())
            .algorithm(indri())
            .build()
            .unwrap();

        assert_eq!(
            writer.render(&config),
            "indexPath=/idx\n\
             retrievalAlgorithm=Indri\n\
             queryFilePath=/q/queries.txt\n\
             trecEvalOutputPath=/out/exp1_2\n\
             Indri:mu=1000\n\
             Indri:lambda=0.7\n"
        );
    }

    #[test]
    fn test_render_feedback_block() {
        let writer = ParameterFileWriter::new("/params", "/exp");
        let config = ExperimentBuilder::new("exp1_5", &base())
            .algorithm(indri())
            .feedback(FeedbackConfig::new(10, 10, 0, 0.5).with_initial_ranking("/ref/bow"))
            .build()
            .unwrap();

        let text = writer.render(&config);
        assert!(text.ends_with(
            "fb=true\n\
             fbDocs=10\n\
             fbTerms=10\n\
             fbMu=0\n\
             fbOrigWeight=0.5\n\
             fbExpansionQueryFile=/exp/exp1_5\n\
             fbInitialRankingFile=/ref/bow\n"
        ));
    }

    #[test]
    fn test_ranked_boolean_has_no_model_lines() {
        let writer = ParameterFileWriter::new("/params", "/exp");
        let config = ExperimentBuilder::new("exp1_1", &base())
            .algorithm(RetrievalAlgorithm::RankedBoolean)
            .build()
            .unwrap();
        assert_eq!(writer.render(&config).lines().count(), 4);
    }

    #[test]
    fn test_write_creates_directory_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let writer = ParameterFileWriter::new(tmp.path().join("params"), tmp.path().join("exp"));
        let first = ExperimentBuilder::new("exp2_1", &base())
            .algorithm(indri())
            .feedback(FeedbackConfig::new(10, 10, 0, 0.5))
            .build()
            .unwrap();
        let second = ExperimentBuilder::new("exp2_1", &base())
            .algorithm(indri())
            .build()
            .unwrap();

        let path = writer.write(&first).unwrap();
        assert_eq!(path, tmp.path().join("params/exp2_1"));
        writer.write(&second).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("fb"));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_into_unwritable_location_is_io_error() {
        let tmp = TempDir::new().unwrap();
        // A regular file where the directory should be
        let blocker = tmp.path().join("params");
        fs::write(&blocker, "").unwrap();
        let writer = ParameterFileWriter::new(&blocker, tmp.path());
        let config = ExperimentBuilder::new("exp1_1", &base())
            .algorithm(RetrievalAlgorithm::RankedBoolean)
            .build()
            .unwrap();
        assert!(matches!(writer.write(&config), Err(SweepError::Io { .. })));
    }
}
