//! Batch definitions and the default five-batch plan

use std::collections::HashSet;
use std::path::PathBuf;

use super::{Candidate, Dimension, ExperimentSource, Winners};
use crate::config::{Reference, SweepConfig};
use crate::error::{Result, SweepError};
use crate::experiment::{
    BaseSettings, ExperimentBuilder, ExperimentConfig, FeedbackConfig, RetrievalAlgorithm,
};

/// An experiment as the plan names it, before anything has run
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedExperiment {
    pub name: String,
    pub source: ExperimentSource,
}

impl PlannedExperiment {
    pub fn generated(config: ExperimentConfig) -> Self {
        Self {
            name: config.name.clone(),
            source: ExperimentSource::Generated(config),
        }
    }

    pub fn reference(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: ExperimentSource::Reference { file: file.into() },
        }
    }
}

/// Everything a sweep holds fixed
#[derive(Debug, Clone)]
pub struct FeedbackTemplate {
    pub base: BaseSettings,
    pub algorithm: RetrievalAlgorithm,
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Clone)]
pub enum BatchKind {
    /// Named experiments run unconditionally
    Fixed(Vec<PlannedExperiment>),
    /// One experiment per candidate, built on the required winners
    Sweep {
        dimension: Dimension,
        candidates: Vec<Candidate>,
        template: FeedbackTemplate,
        requires: Vec<Dimension>,
    },
}

#[derive(Debug, Clone)]
pub struct SweepBatch {
    pub name: String,
    pub kind: BatchKind,
}

impl SweepBatch {
    pub fn fixed(name: impl Into<String>, experiments: Vec<PlannedExperiment>) -> Self {
        Self {
            name: name.into(),
            kind: BatchKind::Fixed(experiments),
        }
    }

    pub fn sweep(
        name: impl Into<String>,
        template: FeedbackTemplate,
        candidates: Vec<Candidate>,
        requires: Vec<Dimension>,
    ) -> Result<Self> {
        let name = name.into();
        let dimension = candidates
            .first()
            .map(Candidate::dimension)
            .ok_or_else(|| SweepError::Config(format!("sweep {} has no candidates", name)))?;
        if candidates.iter().any(|c| c.dimension() != dimension) {
            return Err(SweepError::Config(format!(
                "sweep {} mixes candidates of different dimensions",
                name
            )));
        }

        Ok(Self {
            name,
            kind: BatchKind::Sweep {
                dimension,
                candidates,
                template,
                requires,
            },
        })
    }

    /// Dimension this batch picks a winner for
    pub fn dimension(&self) -> Option<Dimension> {
        match &self.kind {
            BatchKind::Fixed(_) => None,
            BatchKind::Sweep { dimension, .. } => Some(*dimension),
        }
    }

    /// Winners that must exist before this batch can run
    pub fn requires(&self) -> &[Dimension] {
        match &self.kind {
            BatchKind::Fixed(_) => &[],
            BatchKind::Sweep { requires, .. } => requires,
        }
    }

    fn sweep_name(&self, index: usize) -> String {
        format!("{}_{}", self.name, index + 1)
    }

    /// Experiment names with the files they submit, without running anything
    pub fn submission_files(&self) -> Vec<(String, PathBuf)> {
        match &self.kind {
            BatchKind::Fixed(experiments) => experiments
                .iter()
                .map(|e| (e.name.clone(), e.source.submission_file().to_path_buf()))
                .collect(),
            BatchKind::Sweep {
                candidates,
                template,
                ..
            } => (0..candidates.len())
                .map(|i| {
                    let name = self.sweep_name(i);
                    let file = template.base.output_dir.join(&name);
                    (name, file)
                })
                .collect(),
        }
    }

    pub fn experiment_names(&self) -> Vec<String> {
        self.submission_files().into_iter().map(|(name, _)| name).collect()
    }

    /// Concrete experiments, in run order, paired with the candidate each one tests
    pub fn materialize(&self, winners: &Winners) -> Result<Vec<(Option<Candidate>, PlannedExperiment)>> {
        match &self.kind {
            BatchKind::Fixed(experiments) => {
                Ok(experiments.iter().cloned().map(|e| (None, e)).collect())
            }
            BatchKind::Sweep {
                candidates,
                template,
                requires,
                ..
            } => candidates
                .iter()
                .enumerate()
                .map(|(i, candidate)| {
                    let mut feedback = template.feedback.clone();
                    winners.apply(requires, &mut feedback, &self.name)?;
                    candidate.apply_to(&mut feedback);

                    let config = ExperimentBuilder::new(self.sweep_name(i), &template.base)
                        .algorithm(template.algorithm)
                        .feedback(feedback)
                        .build()?;
                    Ok((Some(*candidate), PlannedExperiment::generated(config)))
                })
                .collect(),
        }
    }
}

/// Ordered batches of one run
#[derive(Debug, Clone)]
pub struct SweepPlan {
    batches: Vec<SweepBatch>,
}

impl SweepPlan {
    /// Experiment names must be unique across the whole plan, and every
    /// required winner must come from an earlier batch
    pub fn new(batches: Vec<SweepBatch>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut swept: Vec<Dimension> = Vec::new();

        for batch in &batches {
            for name in batch.experiment_names() {
                if !seen.insert(name.clone()) {
                    return Err(SweepError::Config(format!(
                        "experiment name {} appears twice in the plan",
                        name
                    )));
                }
            }
            if let Some(missing) = batch.requires().iter().find(|d| !swept.contains(*d)) {
                return Err(SweepError::Config(format!(
                    "batch {} requires the best {} but no earlier batch sweeps it",
                    batch.name, missing
                )));
            }
            if let Some(dimension) = batch.dimension() {
                swept.push(dimension);
            }
        }

        Ok(Self { batches })
    }

    pub fn batches(&self) -> &[SweepBatch] {
        &self.batches
    }
}

/// The five-batch query-expansion study
pub fn default_plan(config: &SweepConfig) -> Result<SweepPlan> {
    let base = BaseSettings {
        index_path: config.index_path()?,
        query_file: config.query_file(&config.paths.query_file)?,
        output_dir: config.output_dir()?,
    };
    let alt_queries = config.query_file(&config.paths.alt_query_file)?;
    let bow = config.reference(Reference::Bow)?;
    let sdm = config.reference(Reference::Sdm)?;

    let s = &config.sweep;
    let indri = RetrievalAlgorithm::Indri {
        mu: s.indri_mu,
        lambda: s.indri_lambda,
    };
    let feedback = FeedbackConfig::new(s.fb_docs, s.fb_terms, s.fb_mu, s.fb_orig_weight);
    let last = FeedbackConfig::new(
        s.last.fb_docs,
        s.last.fb_terms,
        s.last.fb_mu,
        s.last.fb_orig_weight,
    );

    let exp1 = SweepBatch::fixed(
        "exp1",
        vec![
            PlannedExperiment::generated(
                ExperimentBuilder::new("exp1_1", &base)
                    .algorithm(RetrievalAlgorithm::RankedBoolean)
                    .build()?,
            ),
            PlannedExperiment::generated(
                ExperimentBuilder::new("exp1_2", &base).algorithm(indri).build()?,
            ),
            PlannedExperiment::reference("exp1_3_1", &bow),
            PlannedExperiment::reference("exp1_3_2", &sdm),
            PlannedExperiment::generated(
                ExperimentBuilder::new("exp1_4", &base)
                    .algorithm(indri)
                    .feedback(feedback.clone())
                    .build()?,
            ),
            PlannedExperiment::generated(
                ExperimentBuilder::new("exp1_5", &base)
                    .algorithm(indri)
                    .feedback(feedback.clone().with_initial_ranking(&bow))
                    .build()?,
            ),
        ],
    );

    let template = FeedbackTemplate {
        base: base.clone(),
        algorithm: indri,
        feedback: feedback.with_initial_ranking(&bow),
    };
    let exp2 = SweepBatch::sweep(
        "exp2",
        template.clone(),
        Candidate::docs(&s.docs_candidates),
        vec![],
    )?;
    let exp3 = SweepBatch::sweep(
        "exp3",
        template.clone(),
        Candidate::terms(&s.terms_candidates),
        vec![Dimension::Docs],
    )?;
    let exp4 = SweepBatch::sweep(
        "exp4",
        template,
        Candidate::orig_weights(&s.weight_candidates),
        vec![Dimension::Docs, Dimension::Terms],
    )?;

    // Fixed parameters; deliberately independent of the sweep winners
    let exp5 = SweepBatch::fixed(
        "exp5",
        vec![
            PlannedExperiment::generated(
                ExperimentBuilder::new("exp5_1", &base)
                    .algorithm(indri)
                    .feedback(last.clone().with_initial_ranking(&sdm))
                    .build()?,
            ),
            PlannedExperiment::generated(
                ExperimentBuilder::new("exp5_2", &base)
                    .algorithm(indri)
                    .query_file(&alt_queries)
                    .feedback(last.clone().with_initial_ranking(&bow))
                    .build()?,
            ),
            PlannedExperiment::generated(
                ExperimentBuilder::new("exp5_3", &base)
                    .algorithm(indri)
                    .query_file(&alt_queries)
                    .feedback(last.with_initial_ranking(&sdm))
                    .build()?,
            ),
        ],
    );

    SweepPlan::new(vec![exp1, exp2, exp3, exp4, exp5])
}
