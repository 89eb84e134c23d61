//! `fbsweep run` - execute the whole plan, then write the report

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use fbsweep::experiment::ParameterFileWriter;
use fbsweep::scoring::{ExternalScorer, Scorer};
use fbsweep::submit::{self, Evaluator};
use fbsweep::sweep::{default_plan, BatchOutcome};
use fbsweep::{MetricsExtractor, Orchestrator};

use super::{load_config, print_result_row, print_table_header};

pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let (path, config) = load_config(config_path)?;
    println!("🔬 Query-expansion sweep ({})\n", path.display());

    let plan = default_plan(&config)?;

    let scorer = ExternalScorer::new(
        config.scorer.program.clone(),
        config.scorer.args.clone(),
        config.parameter_dir()?,
    )
    .with_timeout(config.scorer_timeout());
    let program = scorer
        .check_available()
        .context("scorer is not runnable")?;
    tracing::debug!(program = %program.display(), "resolved scorer");

    let client = submit::connect(&config)?;
    let writer = ParameterFileWriter::new(config.parameter_dir()?, config.expansion_dir()?);
    let extractor = MetricsExtractor::new(config.metrics.query_count, config.metrics.baseline);

    let mut orchestrator = Orchestrator::new(writer, scorer, client, extractor);

    for batch in plan.batches() {
        println!("━━━ {} ━━━\n", batch.name);
        let outcome = orchestrator
            .run_batch(batch)
            .with_context(|| format!("sweep stopped in batch {}", batch.name))?;
        print_outcome(&orchestrator, &outcome);
    }

    println!("━━━ Report ━━━\n");
    println!("Re-evaluating every experiment...");
    let report = orchestrator.report(&plan)?;
    let report_path = config.report_path()?;
    let json_path = report.write_all(&report_path)?;

    println!("✅ Report written: {}", report_path.display());
    println!("   Snapshot: {}", json_path.display());
    Ok(())
}

fn print_outcome<S: Scorer, E: Evaluator>(orchestrator: &Orchestrator<S, E>, outcome: &BatchOutcome) {
    print_table_header();

    for name in &outcome.experiments {
        let Some(record) = orchestrator.record(name) else {
            continue;
        };
        let Some(result) = record.result() else {
            continue;
        };
        let is_winner = outcome.winner.is_some() && record.candidate == outcome.winner;
        print_result_row(name, result, is_winner);
    }

    if let Some(winner) = outcome.winner {
        println!("\n🏆 Best: {}", winner.to_string().green().bold());
    }
    println!();
}
