pub mod init;
pub mod report;
pub mod run;
pub mod submit;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use fbsweep::config::{self, SweepConfig};
use fbsweep::SubmissionResult;

/// Resolve and load the config, or explain where it was looked for
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<(PathBuf, SweepConfig)> {
    let path = config::resolve(explicit).with_context(|| match explicit {
        Some(p) => format!("config file not found: {}", p.display()),
        None => format!(
            "no {} found; run `fbsweep init` to create one",
            config::CONFIG_FILE
        ),
    })?;
    let config = config::load(&path)?;
    Ok((path, config))
}

pub(crate) fn print_table_header() {
    println!(
        "{:<20} {:>8} {:>8} {:>8} {:>8} {:>9}",
        "Experiment", "MAP", "P10", "P20", "P30", "Win/Loss"
    );
    println!("{}", "─".repeat(66));
}

/// One result row; `highlight` marks a sweep winner
pub(crate) fn print_result_row(name: &str, result: &SubmissionResult, highlight: bool) {
    let line = format!(
        "{:<20} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>9}",
        name,
        result.aggregate_map,
        result.p10,
        result.p20,
        result.p30,
        format!("{}/{}", result.wins, result.losses)
    );
    if highlight {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line);
    }
}
