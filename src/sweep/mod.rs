//! Sweep orchestration
//!
//! Batches run strictly in plan order. A sweep batch varies one feedback
//! dimension; once all of its candidates have results, the candidate with
//! the highest aggregate MAP becomes that dimension's winner and later
//! batches that require it build their configs on top of it.
//!
//! ```text
//! exp1 baseline ──▶ exp2 fbDocs ──▶ exp3 fbTerms ──▶ exp4 fbOrigWeight ──▶ exp5 final
//!                      │ bestDocs ────▶│ ───────────────▶│
//!                                      │ bestTerms ─────▶│
//! ```

mod orchestrator;
pub mod plan;
pub mod report;

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, SweepError};
use crate::experiment::{ExperimentConfig, FeedbackConfig};
use crate::metrics::SubmissionResult;

pub use orchestrator::{BatchOutcome, Orchestrator};
pub use plan::{default_plan, BatchKind, FeedbackTemplate, PlannedExperiment, SweepBatch, SweepPlan};
pub use report::{Report, ReportRow, ReportSection, CSV_HEADER};

/// How an experiment gets its ranking file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExperimentSource {
    /// Parameter file → scoring program → ranking file
    Generated(ExperimentConfig),
    /// Externally supplied ranking, submitted as-is
    Reference { file: PathBuf },
}

impl ExperimentSource {
    /// File uploaded to the evaluation service
    pub fn submission_file(&self) -> &Path {
        match self {
            Self::Generated(config) => &config.output_path,
            Self::Reference { file } => file,
        }
    }
}

/// One named experiment and, once evaluated, its metrics
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentRecord {
    pub name: String,
    pub batch: String,
    pub source: ExperimentSource,
    /// Swept value this experiment was built with
    pub candidate: Option<Candidate>,
    result: Option<SubmissionResult>,
}

impl ExperimentRecord {
    pub(crate) fn new(batch: &str, candidate: Option<Candidate>, planned: PlannedExperiment) -> Self {
        Self {
            name: planned.name,
            batch: batch.to_string(),
            source: planned.source,
            candidate,
            result: None,
        }
    }

    pub fn config(&self) -> Option<&ExperimentConfig> {
        match &self.source {
            ExperimentSource::Generated(config) => Some(config),
            ExperimentSource::Reference { .. } => None,
        }
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        self.result.as_ref()
    }

    /// Results arrive once and are never replaced
    pub(crate) fn complete(&mut self, result: SubmissionResult) {
        debug_assert!(self.result.is_none(), "{} already has a result", self.name);
        if self.result.is_none() {
            self.result = Some(result);
        }
    }
}

/// Feedback parameter a sweep varies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    Docs,
    Terms,
    OrigWeight,
}

impl Dimension {
    /// Parameter-file key this dimension controls
    pub fn key(&self) -> &'static str {
        match self {
            Self::Docs => "fbDocs",
            Self::Terms => "fbTerms",
            Self::OrigWeight => "fbOrigWeight",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One value of a swept dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Candidate {
    Docs(u32),
    Terms(u32),
    OrigWeight(f64),
}

impl Candidate {
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Docs(_) => Dimension::Docs,
            Self::Terms(_) => Dimension::Terms,
            Self::OrigWeight(_) => Dimension::OrigWeight,
        }
    }

    pub fn apply_to(&self, feedback: &mut FeedbackConfig) {
        match *self {
            Self::Docs(docs) => feedback.docs = docs,
            Self::Terms(terms) => feedback.terms = terms,
            Self::OrigWeight(weight) => feedback.orig_weight = weight,
        }
    }

    pub fn docs(values: &[u32]) -> Vec<Self> {
        values.iter().copied().map(Self::Docs).collect()
    }

    pub fn terms(values: &[u32]) -> Vec<Self> {
        values.iter().copied().map(Self::Terms).collect()
    }

    pub fn orig_weights(values: &[f64]) -> Vec<Self> {
        values.iter().copied().map(Self::OrigWeight).collect()
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Docs(v) | Self::Terms(v) => write!(f, "{}={}", self.dimension(), v),
            Self::OrigWeight(v) => write!(f, "{}={}", self.dimension(), v),
        }
    }
}

/// Winners carried from completed sweeps into later ones
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Winners {
    pub docs: Option<u32>,
    pub terms: Option<u32>,
    pub orig_weight: Option<f64>,
}

impl Winners {
    pub fn get(&self, dimension: Dimension) -> Option<Candidate> {
        match dimension {
            Dimension::Docs => self.docs.map(Candidate::Docs),
            Dimension::Terms => self.terms.map(Candidate::Terms),
            Dimension::OrigWeight => self.orig_weight.map(Candidate::OrigWeight),
        }
    }

    pub fn record(&mut self, winner: Candidate) {
        match winner {
            Candidate::Docs(v) => self.docs = Some(v),
            Candidate::Terms(v) => self.terms = Some(v),
            Candidate::OrigWeight(v) => self.orig_weight = Some(v),
        }
    }

    /// Apply every required winner to `feedback`; a missing one means the
    /// sweep that produces it has not completed yet
    pub fn apply(&self, requires: &[Dimension], feedback: &mut FeedbackConfig, batch: &str) -> Result<()> {
        for &dimension in requires {
            let winner = self.get(dimension).ok_or_else(|| {
                SweepError::Config(format!(
                    "batch {} needs the best {} before any {} sweep has finished",
                    batch, dimension, dimension
                ))
            })?;
            winner.apply_to(feedback);
        }
        Ok(())
    }
}

/// First candidate with the maximum score; NaN scores never win
pub fn select_best<T: Copy>(scored: &[(T, f64)]) -> Option<T> {
    let mut best: Option<(T, f64)> = None;
    for &(candidate, score) in scored {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(candidate, _)| candidate)
}
