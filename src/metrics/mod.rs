//! Metrics extraction from evaluation-service responses
//!
//! The service answers with an HTML fragment, not a machine-readable format.
//! Every record we care about is a label, some tab-separated fields and a
//! numeric value, closed by a `<br>` marker:
//!
//! ```text
//! map      \t051\t0.1234<br>     (one per query, N of them)
//! map      \tall\t0.2345<br>     (aggregate)
//! P10      \tall\t0.4100<br>
//! P20      \tall\t0.3650<br>
//! P30      \tall\t0.3217<br>
//! ```
//!
//! Extraction is one forward pass with a cursor. The `map` label only
//! counts as a record when a tab follows it before the marker, so stray
//! prose mentioning "map" does not desynchronize the pass.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{Result, SweepError};

/// Per-query MAP a query must exceed to count as a win
pub const DEFAULT_BASELINE: f64 = 0.0750;

/// Query-set size of the observed deployment
pub const DEFAULT_QUERY_COUNT: usize = 20;

/// Precision cut-off labels, in response order
pub const PRECISION_LABELS: [&str; 3] = ["P10", "P20", "P30"];

/// Metrics extracted from one submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionResult {
    pub aggregate_map: f64,
    pub p10: f64,
    pub p20: f64,
    pub p30: f64,
    pub wins: usize,
    pub losses: usize,
    pub per_query_map: BTreeMap<u32, f64>,
}

/// Parses response bodies into [`SubmissionResult`]s
#[derive(Debug, Clone)]
pub struct MetricsExtractor {
    query_count: usize,
    baseline: f64,
}

impl Default for MetricsExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_COUNT, DEFAULT_BASELINE)
    }
}

fn map_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bmap\b").expect("valid regex"))
}

fn line_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"))
}

/// Query id right after the first tab, followed by more fields
fn query_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\t]*\t\s*(?P<qid>\d+)\s").expect("valid regex"))
}

/// Numeric value immediately before the line-break marker
fn trailing_value() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?P<value>\d*\.\d+)\s*$").expect("valid regex"))
}

/// Label of `PRECISION_LABELS[index]`; "P10" must not match inside "P100"
fn precision_label(index: usize) -> &'static Regex {
    static RE: [OnceLock<Regex>; 3] = [OnceLock::new(), OnceLock::new(), OnceLock::new()];
    RE[index].get_or_init(|| {
        Regex::new(&format!(r"\b{}\b", PRECISION_LABELS[index])).expect("valid regex")
    })
}

/// One label..marker span of the response
struct Record<'a> {
    /// Text between the label start and the marker
    body: &'a str,
    /// Offset just past the label match
    next: usize,
}

impl MetricsExtractor {
    pub fn new(query_count: usize, baseline: f64) -> Self {
        Self {
            query_count,
            baseline,
        }
    }

    pub fn query_count(&self) -> usize {
        self.query_count
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Whether a per-query value counts as a win (strictly above baseline)
    pub fn is_win(&self, value: f64) -> bool {
        value > self.baseline
    }

    pub fn extract(&self, text: &str) -> Result<SubmissionResult> {
        let mut cursor = 0;
        let mut per_query_map = BTreeMap::new();
        let mut wins = 0;
        let mut losses = 0;

        for row in 0..self.query_count {
            let record = next_map_record(text, cursor).ok_or_else(|| {
                SweepError::Parse(format!(
                    "expected {} per-query map rows, found {}",
                    self.query_count, row
                ))
            })?;

            let qid = query_id()
                .captures(record.body)
                .and_then(|c| c["qid"].parse::<u32>().ok())
                .ok_or_else(|| {
                    // a numbered row is missing: the aggregate came early
                    SweepError::Parse(format!(
                        "expected {} per-query map rows, found {}",
                        self.query_count, row
                    ))
                })?;
            let value = parse_value(record.body, "map")?;
            if per_query_map.insert(qid, value).is_some() {
                return Err(SweepError::Parse(format!(
                    "duplicate query id {} in per-query map rows",
                    qid
                )));
            }

            if self.is_win(value) {
                wins += 1;
            } else {
                losses += 1;
            }
            cursor = record.next;
        }

        let aggregate = next_map_record(text, cursor)
            .ok_or_else(|| SweepError::Parse("aggregate map row not found".to_string()))?;
        let aggregate_map = parse_value(aggregate.body, "aggregate map")?;
        cursor = aggregate.next;

        let mut precision = [0.0; 3];
        for (index, (slot, label)) in precision.iter_mut().zip(PRECISION_LABELS).enumerate() {
            let record = next_labeled_record(text, cursor, precision_label(index))
                .ok_or_else(|| SweepError::Parse(format!("{} row not found", label)))?;
            *slot = parse_value(record.body, label)?;
            cursor = record.next;
        }

        Ok(SubmissionResult {
            aggregate_map,
            p10: precision[0],
            p20: precision[1],
            p30: precision[2],
            wins,
            losses,
            per_query_map,
        })
    }
}

/// Next `map` record at or after `from`, skipping mentions without a tab
fn next_map_record(text: &str, from: usize) -> Option<Record<'_>> {
    let mut from = from;
    loop {
        let record = next_labeled_record(text, from, map_label())?;
        if record.body.contains('\t') {
            return Some(record);
        }
        from = record.next;
    }
}

fn next_labeled_record<'a>(text: &'a str, from: usize, label: &Regex) -> Option<Record<'a>> {
    let found = label.find_at(text, from)?;
    let marker = line_break().find_at(text, found.start())?;
    Some(Record {
        body: &text[found.start()..marker.start()],
        next: found.end(),
    })
}

fn parse_value(body: &str, what: &str) -> Result<f64> {
    let caps = trailing_value()
        .captures(body)
        .ok_or_else(|| SweepError::Parse(format!("{} row has no value: {:?}", what, body)))?;
    caps["value"]
        .parse::<f64>()
        .map_err(|e| SweepError::Parse(format!("{} value {:?}: {}", what, &caps["value"], e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn response(rows: &[(u32, &str)], all: &str, p: [&str; 3]) -> String {
        let mut text = String::from("<html><body><pre>\n");
        for (qid, value) in rows {
            text.push_str(&format!("num_ret       \t{:03}\t1000<br>\n", qid));
            text.push_str(&format!("map           \t{:03}\t{}<br>\n", qid, value));
        }
        text.push_str(&format!("map           \tall\t{}<br>\n", all));
        text.push_str(&format!("P10           \tall\t{}<br>\n", p[0]));
        text.push_str(&format!("P20           \tall\t{}<br>\n", p[1]));
        text.push_str(&format!("P30           \tall\t{}<br>\n", p[2]));
        text.push_str("</pre></body></html>");
        text
    }

    #[test]
    fn test_extracts_rows_aggregate_and_precision() {
        let extractor = MetricsExtractor::new(3, DEFAULT_BASELINE);
        let text = response(
            &[(51, "0.1234"), (52, "0.0100"), (53, "0.0751")],
            "0.2345",
            ["0.4100", "0.3650", "0.3217"],
        );

        let result = extractor.extract(&text).unwrap();
        assert_relative_eq!(result.aggregate_map, 0.2345);
        assert_relative_eq!(result.p10, 0.41);
        assert_relative_eq!(result.p20, 0.365);
        assert_relative_eq!(result.p30, 0.3217);
        assert_eq!(result.wins, 2);
        assert_eq!(result.losses, 1);
        assert_relative_eq!(result.per_query_map[&52], 0.01);
    }

    #[test]
    fn test_value_equal_to_baseline_is_loss() {
        let extractor = MetricsExtractor::new(1, DEFAULT_BASELINE);
        let text = response(&[(51, "0.0750")], "0.0750", ["0.1", "0.1", "0.1"]);
        let result = extractor.extract(&text).unwrap();
        assert_eq!((result.wins, result.losses), (0, 1));
    }

    #[test]
    fn test_short_response_fails_fast() {
        let extractor = MetricsExtractor::new(3, DEFAULT_BASELINE);
        let text = response(&[(51, "0.1"), (52, "0.2")], "0.15", ["0.1", "0.1", "0.1"]);
        let err = extractor.extract(&text).unwrap_err();
        assert!(matches!(err, SweepError::Parse(_)));
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_repeated_query_id_is_parse_error() {
        let extractor = MetricsExtractor::new(3, DEFAULT_BASELINE);
        let text = response(
            &[(51, "0.1000"), (52, "0.2000"), (51, "0.0500")],
            "0.1167",
            ["0.1", "0.1", "0.1"],
        );
        let err = extractor.extract(&text).unwrap_err();
        assert!(matches!(err, SweepError::Parse(_)));
        assert!(err.to_string().contains("duplicate query id 51"));
    }

    #[test]
    fn test_precision_patterns_are_compiled_once() {
        for index in 0..PRECISION_LABELS.len() {
            assert!(std::ptr::eq(precision_label(index), precision_label(index)));
            assert_eq!(
                precision_label(index).as_str(),
                format!(r"\b{}\b", PRECISION_LABELS[index])
            );
        }
    }

    #[test]
    fn test_missing_precision_row() {
        let extractor = MetricsExtractor::new(1, DEFAULT_BASELINE);
        let text = response(&[(51, "0.1")], "0.1", ["0.1", "0.1", "0.1"]).replace("P30", "Rprec");
        let err = extractor.extract(&text).unwrap_err();
        assert!(err.to_string().contains("P30"));
    }

    #[test]
    fn test_stray_map_mention_is_skipped() {
        let extractor = MetricsExtractor::new(1, DEFAULT_BASELINE);
        let text = format!(
            "<h2>Results (map is mean average precision)</h2><br>{}",
            response(&[(51, "0.0900")], "0.0900", ["0.2", "0.2", "0.2"])
        );
        let result = extractor.extract(&text).unwrap();
        assert_relative_eq!(result.per_query_map[&51], 0.09);
    }

    #[test]
    fn test_gm_map_and_p100_are_not_labels() {
        let extractor = MetricsExtractor::new(1, DEFAULT_BASELINE);
        let text = "map\t051\t0.3000<br>gm_map\tall\t0.0001<br>map\tall\t0.3000<br>\
                    P100\tall\t0.9999<br>P10\tall\t0.5000<br>P20\tall\t0.4000<br>P30\tall\t0.3000<br>";
        let result = extractor.extract(text).unwrap();
        assert_relative_eq!(result.aggregate_map, 0.3);
        assert_relative_eq!(result.p10, 0.5);
    }

    #[test]
    fn test_tolerates_whitespace_and_br_variants() {
        let extractor = MetricsExtractor::new(1, DEFAULT_BASELINE);
        let text = "map \t 051 \t 0.2000 <BR/>map\tall\t0.2000<br />\
                    P10\tall\t0.1000<br>P20\tall\t0.1000<br>P30\tall\t0.1000<br>";
        let result = extractor.extract(text).unwrap();
        assert_eq!(result.per_query_map.keys().copied().collect::<Vec<_>>(), vec![51]);
        assert_relative_eq!(result.per_query_map[&51], 0.2);
    }
}
