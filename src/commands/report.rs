//! `fbsweep report` - rebuild the report from existing ranking files

use anyhow::Result;
use std::path::Path;

use fbsweep::submit;
use fbsweep::sweep::{default_plan, report};
use fbsweep::MetricsExtractor;

use super::{load_config, print_result_row, print_table_header};

pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let (_, config) = load_config(config_path)?;
    println!("📊 Rebuilding evaluation report (no scoring runs)\n");

    let plan = default_plan(&config)?;
    let client = submit::connect(&config)?;
    let extractor = MetricsExtractor::new(config.metrics.query_count, config.metrics.baseline);

    let report = report::evaluate_plan(&client, &extractor, &plan)?;

    for section in &report.sections {
        println!("━━━ {} ━━━\n", section.batch);
        print_table_header();
        for row in &section.rows {
            print_result_row(&row.experiment, &row.result, false);
        }
        println!();
    }

    let report_path = config.report_path()?;
    let json_path = report.write_all(&report_path)?;
    println!("✅ Report written: {}", report_path.display());
    println!("   Snapshot: {}", json_path.display());
    Ok(())
}
