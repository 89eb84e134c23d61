//! `fbsweep submit` - evaluate one ranking file

use anyhow::{Context, Result};
use std::path::Path;

use fbsweep::submit::{self, Evaluator};
use fbsweep::MetricsExtractor;

use super::{load_config, print_result_row, print_table_header};

pub fn execute(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let (_, config) = load_config(config_path)?;
    let client = submit::connect(&config)?;
    let extractor = MetricsExtractor::new(config.metrics.query_count, config.metrics.baseline);

    let body = client.submit(file)?;
    let result = extractor
        .extract(&body)
        .with_context(|| format!("unexpected evaluation response for {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_table_header();
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    print_result_row(&name, &result, false);

    println!("\nPer-query MAP (baseline {:.4}):", extractor.baseline());
    for (qid, map) in &result.per_query_map {
        let mark = if extractor.is_win(*map) { "✓" } else { "✗" };
        println!("  {} {:>4} {:.4}", mark, qid, map);
    }
    Ok(())
}
