use std::path::Path;

use super::report::{self, Report};
use super::{select_best, Candidate, ExperimentRecord, ExperimentSource, SweepBatch, SweepPlan, Winners};
use crate::error::Result;
use crate::experiment::ParameterFileWriter;
use crate::metrics::{MetricsExtractor, SubmissionResult};
use crate::scoring::Scorer;
use crate::submit::Evaluator;

/// What a completed batch produced
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub name: String,
    pub experiments: Vec<String>,
    /// Set for sweep batches only
    pub winner: Option<Candidate>,
}

/// Owns every record and carried winner for the lifetime of a run
pub struct Orchestrator<S, E> {
    writer: ParameterFileWriter,
    scorer: S,
    evaluator: E,
    extractor: MetricsExtractor,
    records: Vec<ExperimentRecord>,
    winners: Winners,
}

impl<S: Scorer, E: Evaluator> Orchestrator<S, E> {
    pub fn new(
        writer: ParameterFileWriter,
        scorer: S,
        evaluator: E,
        extractor: MetricsExtractor,
    ) -> Self {
        Self {
            writer,
            scorer,
            evaluator,
            extractor,
            records: Vec::new(),
            winners: Winners::default(),
        }
    }

    pub fn records(&self) -> &[ExperimentRecord] {
        &self.records
    }

    pub fn record(&self, name: &str) -> Option<&ExperimentRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn winners(&self) -> &Winners {
        &self.winners
    }

    /// Every batch in order; the first failure stops the run
    pub fn run_plan(&mut self, plan: &SweepPlan) -> Result<Vec<BatchOutcome>> {
        plan.batches()
            .iter()
            .map(|batch| self.run_batch(batch))
            .collect()
    }

    /// Run one batch. A sweep's winner is recorded only after all of its
    /// candidates have results.
    pub fn run_batch(&mut self, batch: &SweepBatch) -> Result<BatchOutcome> {
        tracing::info!(batch = %batch.name, "starting batch");
        let steps = batch.materialize(&self.winners)?;

        let mut experiments = Vec::with_capacity(steps.len());
        let mut scored = Vec::new();

        for (candidate, planned) in steps {
            let name = planned.name.clone();
            self.records.push(ExperimentRecord::new(&batch.name, candidate, planned));
            let index = self.records.len() - 1;

            let result = self
                .run_experiment(&self.records[index].source)
                .map_err(|e| e.in_experiment(&batch.name, &name))?;
            tracing::info!(
                batch = %batch.name,
                experiment = %name,
                map = result.aggregate_map,
                wins = result.wins,
                losses = result.losses,
                "experiment evaluated"
            );

            if let Some(candidate) = candidate {
                scored.push((candidate, result.aggregate_map));
            }
            self.records[index].complete(result);
            experiments.push(name);
        }

        let winner = select_best(&scored);
        if let Some(winner) = winner {
            tracing::info!(batch = %batch.name, %winner, "selected best candidate");
            self.winners.record(winner);
        }

        Ok(BatchOutcome {
            name: batch.name.clone(),
            experiments,
            winner,
        })
    }

    /// Resubmit everything the plan names into one report
    pub fn report(&self, plan: &SweepPlan) -> Result<Report> {
        report::evaluate_plan(&self.evaluator, &self.extractor, plan)
    }

    /// Produce (if generated) and evaluate one experiment's ranking file
    pub fn run_experiment(&self, source: &ExperimentSource) -> Result<SubmissionResult> {
        if let ExperimentSource::Generated(config) = source {
            self.writer.write(config)?;
            self.scorer.score(&config.name)?;
        }
        evaluate(&self.evaluator, &self.extractor, source.submission_file())
    }
}

/// Submit one file and extract its metrics
pub(crate) fn evaluate<E: Evaluator>(
    evaluator: &E,
    extractor: &MetricsExtractor,
    file: &Path,
) -> Result<SubmissionResult> {
    let body = evaluator.submit(file)?;
    extractor.extract(&body)
}
