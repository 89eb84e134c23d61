//! Experiment configurations
//!
//! An [`ExperimentConfig`] is an immutable value built fresh for every
//! experiment by [`ExperimentBuilder`]. Nothing carries over between
//! experiments unless the caller copies it explicitly.

pub mod writer;

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, SweepError};

pub use writer::ParameterFileWriter;

/// Retrieval model selected in the parameter file
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "model")]
pub enum RetrievalAlgorithm {
    UnrankedBoolean,
    RankedBoolean,
    Bm25 { k1: f64, b: f64, k3: f64 },
    /// Dirichlet + Jelinek-Mercer smoothing
    Indri { mu: f64, lambda: f64 },
}

impl RetrievalAlgorithm {
    /// Value of the `retrievalAlgorithm` key
    pub fn selector(&self) -> &'static str {
        match self {
            Self::UnrankedBoolean => "UnrankedBoolean",
            Self::RankedBoolean => "RankedBoolean",
            Self::Bm25 { .. } => "BM25",
            Self::Indri { .. } => "Indri",
        }
    }

    /// Model-specific `key=value` pairs, in file order
    pub fn parameter_lines(&self) -> Vec<(&'static str, String)> {
        match *self {
            Self::UnrankedBoolean | Self::RankedBoolean => Vec::new(),
            Self::Bm25 { k1, b, k3 } => vec![
                ("BM25:k_1", k1.to_string()),
                ("BM25:b", b.to_string()),
                ("BM25:k_3", k3.to_string()),
            ],
            Self::Indri { mu, lambda } => vec![
                ("Indri:mu", mu.to_string()),
                ("Indri:lambda", lambda.to_string()),
            ],
        }
    }
}

impl fmt::Display for RetrievalAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Pseudo-relevance feedback settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackConfig {
    /// Top documents used for expansion
    pub docs: u32,
    /// Expansion terms kept
    pub terms: u32,
    /// Smoothing for expansion term scores
    pub mu: u32,
    /// Weight of the original query in the expanded query
    pub orig_weight: f64,
    /// Expand over this ranking instead of a fresh retrieval
    pub initial_ranking: Option<PathBuf>,
}

impl FeedbackConfig {
    pub fn new(docs: u32, terms: u32, mu: u32, orig_weight: f64) -> Self {
        Self {
            docs,
            terms,
            mu,
            orig_weight,
            initial_ranking: None,
        }
    }

    pub fn with_initial_ranking(mut self, path: impl Into<PathBuf>) -> Self {
        self.initial_ranking = Some(path.into());
        self
    }
}

/// One concrete, named experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentConfig {
    pub name: String,
    pub index_path: PathBuf,
    pub algorithm: RetrievalAlgorithm,
    pub query_file: PathBuf,
    /// Ranking file the scoring program writes
    pub output_path: PathBuf,
    pub feedback: Option<FeedbackConfig>,
}

impl ExperimentConfig {
    pub fn feedback_enabled(&self) -> bool {
        self.feedback.is_some()
    }
}

/// Settings shared by every experiment of a run
#[derive(Debug, Clone)]
pub struct BaseSettings {
    pub index_path: PathBuf,
    pub query_file: PathBuf,
    /// Ranking files land here as `<output_dir>/<experiment name>`
    pub output_dir: PathBuf,
}

/// Builds an [`ExperimentConfig`] from base settings plus overrides
#[derive(Debug, Clone)]
pub struct ExperimentBuilder {
    name: String,
    index_path: PathBuf,
    query_file: PathBuf,
    output_dir: PathBuf,
    algorithm: Option<RetrievalAlgorithm>,
    feedback: Option<FeedbackConfig>,
}

impl ExperimentBuilder {
    pub fn new(name: impl Into<String>, base: &BaseSettings) -> Self {
        Self {
            name: name.into(),
            index_path: base.index_path.clone(),
            query_file: base.query_file.clone(),
            output_dir: base.output_dir.clone(),
            algorithm: None,
            feedback: None,
        }
    }

    pub fn algorithm(mut self, algorithm: RetrievalAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn query_file(mut self, path: impl AsRef<Path>) -> Self {
        self.query_file = path.as_ref().to_path_buf();
        self
    }

    pub fn feedback(mut self, feedback: FeedbackConfig) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn build(self) -> Result<ExperimentConfig> {
        if self.name.trim().is_empty() {
            return Err(SweepError::Config("experiment name is empty".to_string()));
        }
        let algorithm = self.algorithm.ok_or_else(|| {
            SweepError::Config(format!("experiment {} has no retrieval algorithm", self.name))
        })?;

        Ok(ExperimentConfig {
            output_path: self.output_dir.join(&self.name),
            name: self.name,
            index_path: self.index_path,
            algorithm,
            query_file: self.query_file,
            feedback: self.feedback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseSettings {
        BaseSettings {
            index_path: PathBuf::from("/idx"),
            query_file: PathBuf::from("/q/queries.txt"),
            output_dir: PathBuf::from("/out"),
        }
    }

    #[test]
    fn test_build_derives_output_path_from_name() {
        let config = ExperimentBuilder::new("exp1_2", &base())
            .algorithm(RetrievalAlgorithm::Indri {
                mu: 1000.0,
                lambda: 0.7,
            })
            .build()
            .unwrap();
        assert_eq!(config.output_path, PathBuf::from("/out/exp1_2"));
        assert_eq!(config.query_file, PathBuf::from("/q/queries.txt"));
        assert!(!config.feedback_enabled());
    }

    #[test]
    fn test_missing_algorithm_is_config_error() {
        let err = ExperimentBuilder::new("exp1_1", &base()).build().unwrap_err();
        assert!(matches!(err, SweepError::Config(_)));
    }

    #[test]
    fn test_builders_do_not_share_state() {
        let with_ranking = ExperimentBuilder::new("exp1_5", &base())
            .algorithm(RetrievalAlgorithm::RankedBoolean)
            .feedback(FeedbackConfig::new(10, 10, 0, 0.5).with_initial_ranking("/bow"))
            .build()
            .unwrap();
        let fresh = ExperimentBuilder::new("exp1_6", &base())
            .algorithm(RetrievalAlgorithm::RankedBoolean)
            .feedback(FeedbackConfig::new(10, 10, 0, 0.5))
            .build()
            .unwrap();
        assert!(with_ranking.feedback.unwrap().initial_ranking.is_some());
        assert!(fresh.feedback.unwrap().initial_ranking.is_none());
    }

    #[test]
    fn test_selectors() {
        assert_eq!(RetrievalAlgorithm::RankedBoolean.selector(), "RankedBoolean");
        assert_eq!(
            RetrievalAlgorithm::Bm25 {
                k1: 1.2,
                b: 0.75,
                k3: 0.0
            }
            .to_string(),
            "BM25"
        );
    }
}
