//! Consolidated evaluation report
//!
//! Every experiment the plan names is resubmitted and re-extracted, then
//! written as a sectioned CSV plus a JSON snapshot with per-query values.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::orchestrator::evaluate;
use super::SweepPlan;
use crate::error::{Result, SweepError};
use crate::metrics::{MetricsExtractor, SubmissionResult};
use crate::submit::Evaluator;

pub const CSV_HEADER: [&str; 6] = ["map_all", "P10", "P20", "P30", "win", "loss"];

#[derive(Debug, Serialize)]
pub struct Report {
    pub generated: DateTime<Utc>,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Serialize)]
pub struct ReportSection {
    pub batch: String,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Serialize)]
pub struct ReportRow {
    pub experiment: String,
    pub file: PathBuf,
    pub result: SubmissionResult,
}

/// Resubmit every experiment of `plan`, in plan order
pub fn evaluate_plan<E: Evaluator>(
    evaluator: &E,
    extractor: &MetricsExtractor,
    plan: &SweepPlan,
) -> Result<Report> {
    let mut sections = Vec::new();

    for batch in plan.batches() {
        let mut rows = Vec::new();
        for (experiment, file) in batch.submission_files() {
            tracing::info!(batch = %batch.name, %experiment, "evaluating");
            let result = evaluate(evaluator, extractor, &file)
                .map_err(|e| e.in_experiment(&batch.name, &experiment))?;
            rows.push(ReportRow {
                experiment,
                file,
                result,
            });
        }
        sections.push(ReportSection {
            batch: batch.name.clone(),
            rows,
        });
    }

    Ok(Report {
        generated: Utc::now(),
        sections,
    })
}

impl Report {
    pub fn rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.sections.iter().flat_map(|s| s.rows.iter())
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        writer.write_record(CSV_HEADER).map_err(encode_error)?;
        for section in &self.sections {
            writer.write_record([section.batch.as_str()]).map_err(encode_error)?;
            for row in &section.rows {
                let r = &row.result;
                writer
                    .write_record([
                        format!("{:.4}", r.aggregate_map),
                        format!("{:.4}", r.p10),
                        format!("{:.4}", r.p20),
                        format!("{:.4}", r.p30),
                        r.wins.to_string(),
                        r.losses.to_string(),
                    ])
                    .map_err(encode_error)?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| encode_error(e.into_error()))?;
        String::from_utf8(bytes).map_err(encode_error)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let contents = self.to_csv()?;
        create_parent(path)?;
        fs::write(path, contents).map_err(|e| SweepError::io(path, e))
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self).map_err(encode_error)?;
        create_parent(path)?;
        fs::write(path, contents).map_err(|e| SweepError::io(path, e))
    }

    /// CSV at `path`, JSON snapshot next to it; returns the JSON path
    pub fn write_all(&self, path: &Path) -> Result<PathBuf> {
        let json_path = path.with_extension("json");
        self.write_csv(path)?;
        self.write_json(&json_path)?;
        Ok(json_path)
    }
}

fn encode_error(e: impl std::fmt::Display) -> SweepError {
    SweepError::Encode(e.to_string())
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| SweepError::io(parent, e))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn result(map: f64, wins: usize) -> SubmissionResult {
        SubmissionResult {
            aggregate_map: map,
            p10: 0.3,
            p20: 0.25,
            p30: 0.2,
            wins,
            losses: 20 - wins,
            per_query_map: BTreeMap::from([(51, map)]),
        }
    }

    fn report() -> Report {
        Report {
            generated: Utc::now(),
            sections: vec![
                ReportSection {
                    batch: "exp1".to_string(),
                    rows: vec![ReportRow {
                        experiment: "exp1_1".to_string(),
                        file: PathBuf::from("/out/exp1_1"),
                        result: result(0.08, 12),
                    }],
                },
                ReportSection {
                    batch: "exp2".to_string(),
                    rows: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_csv_layout() {
        let csv = report().to_csv().unwrap();
        assert_eq!(
            csv,
            "map_all,P10,P20,P30,win,loss\nexp1\n0.0800,0.3000,0.2500,0.2000,12,8\nexp2\n"
        );
    }

    #[test]
    fn test_csv_failure_is_encode_error() {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(CSV_HEADER).unwrap();
        let err = writer.write_record(["exp1"]).map_err(encode_error).unwrap_err();

        assert!(matches!(err, SweepError::Encode(_)));
        assert!(!err.is_retryable());
        assert!(err.to_string().starts_with("failed to encode report:"));
    }

    #[test]
    fn test_write_all_places_json_next_to_csv() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reports/evaluation.csv");
        let json_path = report().write_all(&path).unwrap();

        assert_eq!(json_path, tmp.path().join("reports/evaluation.json"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["sections"][0]["rows"][0]["experiment"], "exp1_1");
        assert_eq!(json["sections"][0]["rows"][0]["result"]["per_query_map"]["51"], 0.08);
    }
}
