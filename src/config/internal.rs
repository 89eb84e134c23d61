//! Internal implementation for config module
//!
//! Handles fbsweep.toml - every path, endpoint and sweep candidate list.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SweepError};

// =============================================================================
// Config Types
// =============================================================================

/// Run configuration stored in fbsweep.toml
/// All sections are optional with defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub references: ReferencesSection,
    #[serde(default)]
    pub scorer: ScorerSection,
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub metrics: MetricsSection,
    #[serde(default)]
    pub sweep: SweepSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsSection {
    /// Index directory handed to the scoring program
    #[serde(default)]
    pub index: String,
    /// Folder holding query files
    #[serde(default)]
    pub query_dir: String,
    /// Default query file name (inside query_dir)
    #[serde(default = "default_query_file")]
    pub query_file: String,
    /// Query file used by the later exp5 runs
    #[serde(default = "default_alt_query_file")]
    pub alt_query_file: String,
    /// Where the scoring program writes ranking files
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Where parameter files are materialized
    #[serde(default = "default_parameter_dir")]
    pub parameter_dir: String,
    /// Where expansion queries are written
    #[serde(default = "default_expansion_dir")]
    pub expansion_dir: String,
    /// CSV report path
    #[serde(default = "default_report")]
    pub report: String,
}

fn default_query_file() -> String {
    "queries.txt".to_string()
}
fn default_alt_query_file() -> String {
    "Indri-Sdm.qry".to_string()
}
fn default_output_dir() -> String {
    "output".to_string()
}
fn default_parameter_dir() -> String {
    "parameters".to_string()
}
fn default_expansion_dir() -> String {
    "expansion".to_string()
}
fn default_report() -> String {
    "evaluation.csv".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            index: String::new(),
            query_dir: String::new(),
            query_file: default_query_file(),
            alt_query_file: default_alt_query_file(),
            output_dir: default_output_dir(),
            parameter_dir: default_parameter_dir(),
            expansion_dir: default_expansion_dir(),
            report: default_report(),
        }
    }
}

/// Externally supplied reference rankings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencesSection {
    #[serde(default = "default_bow")]
    pub bow: String,
    #[serde(default = "default_sdm")]
    pub sdm: String,
}

fn default_bow() -> String {
    "Indri-Bow.teIn".to_string()
}
fn default_sdm() -> String {
    "Indri-Sdm.teIn".to_string()
}

impl Default for ReferencesSection {
    fn default() -> Self {
        Self {
            bow: default_bow(),
            sdm: default_sdm(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerSection {
    /// External program; the parameter file path is appended to `args`
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_scorer_timeout")]
    pub timeout_secs: u64,
}

fn default_program() -> String {
    "java".to_string()
}
fn default_scorer_timeout() -> u64 {
    3600
}

impl Default for ScorerSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            timeout_secs: default_scorer_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSection {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_log_type")]
    pub log_type: String,
    #[serde(default = "default_homework_id")]
    pub homework_id: String,
    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,
    /// Extra attempts after a failed upload (0 = submit once)
    #[serde(default)]
    pub retries: u32,
    #[serde(default = "default_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_log_type() -> String {
    "Detailed".to_string()
}
fn default_homework_id() -> String {
    "HW4".to_string()
}
fn default_service_timeout() -> u64 {
    120
}
fn default_backoff() -> u64 {
    500
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            log_type: default_log_type(),
            homework_id: default_homework_id(),
            timeout_secs: default_service_timeout(),
            retries: 0,
            retry_backoff_ms: default_backoff(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSection {
    /// Number of per-query rows in every response
    #[serde(default = "default_query_count")]
    pub query_count: usize,
    /// Per-query MAP a query must beat to count as a win
    #[serde(default = "default_baseline")]
    pub baseline: f64,
}

fn default_query_count() -> usize {
    20
}
fn default_baseline() -> f64 {
    0.0750
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            query_count: default_query_count(),
            baseline: default_baseline(),
        }
    }
}

/// Candidate lists and the values held fixed while sweeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSection {
    #[serde(default = "default_indri_mu")]
    pub indri_mu: f64,
    #[serde(default = "default_indri_lambda")]
    pub indri_lambda: f64,
    #[serde(default = "default_fb_docs")]
    pub fb_docs: u32,
    #[serde(default = "default_fb_terms")]
    pub fb_terms: u32,
    #[serde(default)]
    pub fb_mu: u32,
    #[serde(default = "default_orig_weight")]
    pub fb_orig_weight: f64,
    #[serde(default = "default_docs_candidates")]
    pub docs_candidates: Vec<u32>,
    #[serde(default = "default_terms_candidates")]
    pub terms_candidates: Vec<u32>,
    #[serde(default = "default_weight_candidates")]
    pub weight_candidates: Vec<f64>,
    #[serde(default)]
    pub last: FinalSection,
}

fn default_indri_mu() -> f64 {
    1000.0
}
fn default_indri_lambda() -> f64 {
    0.7
}
fn default_fb_docs() -> u32 {
    10
}
fn default_fb_terms() -> u32 {
    10
}
fn default_orig_weight() -> f64 {
    0.5
}
fn default_docs_candidates() -> Vec<u32> {
    vec![10, 20, 30, 40, 50, 100]
}
fn default_terms_candidates() -> Vec<u32> {
    vec![5, 10, 20, 30, 40, 50]
}
fn default_weight_candidates() -> Vec<f64> {
    vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            indri_mu: default_indri_mu(),
            indri_lambda: default_indri_lambda(),
            fb_docs: default_fb_docs(),
            fb_terms: default_fb_terms(),
            fb_mu: 0,
            fb_orig_weight: default_orig_weight(),
            docs_candidates: default_docs_candidates(),
            terms_candidates: default_terms_candidates(),
            weight_candidates: default_weight_candidates(),
            last: FinalSection::default(),
        }
    }
}

/// Feedback parameters of the final comparison batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalSection {
    #[serde(default = "default_final_docs")]
    pub fb_docs: u32,
    #[serde(default = "default_final_terms")]
    pub fb_terms: u32,
    #[serde(default)]
    pub fb_mu: u32,
    #[serde(default = "default_final_weight")]
    pub fb_orig_weight: f64,
}

fn default_final_docs() -> u32 {
    100
}
fn default_final_terms() -> u32 {
    50
}
fn default_final_weight() -> f64 {
    1.0
}

impl Default for FinalSection {
    fn default() -> Self {
        Self {
            fb_docs: default_final_docs(),
            fb_terms: default_final_terms(),
            fb_mu: 0,
            fb_orig_weight: default_final_weight(),
        }
    }
}

// =============================================================================
// Derived values
// =============================================================================

/// Expand `~` and `$VAR` in a configured path
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    shellexpand::full(raw)
        .map(|s| PathBuf::from(s.as_ref()))
        .map_err(|e| SweepError::Config(format!("cannot expand path '{}': {}", raw, e)))
}

impl SweepConfig {
    pub fn output_dir(&self) -> Result<PathBuf> {
        expand_path(&self.paths.output_dir)
    }

    pub fn parameter_dir(&self) -> Result<PathBuf> {
        expand_path(&self.paths.parameter_dir)
    }

    pub fn expansion_dir(&self) -> Result<PathBuf> {
        expand_path(&self.paths.expansion_dir)
    }

    pub fn report_path(&self) -> Result<PathBuf> {
        expand_path(&self.paths.report)
    }

    pub fn index_path(&self) -> Result<PathBuf> {
        require("paths.index", &self.paths.index)?;
        expand_path(&self.paths.index)
    }

    /// Query file inside `query_dir`
    pub fn query_file(&self, name: &str) -> Result<PathBuf> {
        Ok(expand_path(&self.paths.query_dir)?.join(name))
    }

    pub fn reference(&self, which: Reference) -> Result<PathBuf> {
        match which {
            Reference::Bow => expand_path(&self.references.bow),
            Reference::Sdm => expand_path(&self.references.sdm),
        }
    }

    pub fn scorer_timeout(&self) -> Duration {
        Duration::from_secs(self.scorer.timeout_secs)
    }

    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }

    /// Service credentials, with environment overrides applied
    pub fn credentials(&self) -> Result<(String, String)> {
        let username = std::env::var(super::ENV_USERNAME)
            .unwrap_or_else(|_| self.service.username.clone());
        let password = std::env::var(super::ENV_PASSWORD)
            .unwrap_or_else(|_| self.service.password.clone());
        require("service.username", &username)?;
        Ok((username, password))
    }

    pub fn service_url(&self) -> Result<&str> {
        require("service.url", &self.service.url)?;
        Ok(&self.service.url)
    }
}

/// The two externally supplied reference rankings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Bow,
    Sdm,
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SweepError::Config(format!("{} is not set", field)));
    }
    Ok(())
}

// =============================================================================
// Config Load/Save
// =============================================================================

/// Load a config file. Missing fields take their defaults.
pub fn load(path: &Path) -> Result<SweepConfig> {
    let contents = fs::read_to_string(path).map_err(|e| SweepError::io(path, e))?;
    parse(&contents)
        .map_err(|e| SweepError::Config(format!("failed to parse {}: {}", path.display(), e)))
}

pub fn parse(contents: &str) -> std::result::Result<SweepConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// Save config, creating the parent directory if needed
pub fn save(path: &Path, config: &SweepConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SweepError::io(parent, e))?;
        }
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| SweepError::Config(format!("failed to serialize config: {}", e)))?;
    fs::write(path, contents).map_err(|e| SweepError::io(path, e))
}

/// Resolve which config file to use: explicit path, ./fbsweep.toml, then the user config dir
pub fn resolve(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(super::CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("fbsweep").join("config.toml"))
        .filter(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SweepConfig::default();
        assert_eq!(config.metrics.query_count, 20);
        assert_eq!(config.metrics.baseline, 0.0750);
        assert_eq!(config.service.log_type, "Detailed");
        assert_eq!(config.service.homework_id, "HW4");
        assert_eq!(config.service.retries, 0);
        assert_eq!(config.sweep.docs_candidates, vec![10, 20, 30, 40, 50, 100]);
        assert_eq!(config.sweep.last.fb_docs, 100);
    }

    #[test]
    fn test_load_partial_config() {
        let config = parse("[metrics]\nquery_count = 5\n").unwrap();
        assert_eq!(config.metrics.query_count, 5);
        // Other sections should have defaults
        assert_eq!(config.metrics.baseline, 0.0750);
        assert_eq!(config.paths.query_file, "queries.txt");
        assert_eq!(config.scorer.program, "java");
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/fbsweep.toml");

        let mut config = SweepConfig::default();
        config.paths.index = "/data/index".to_string();
        config.sweep.terms_candidates = vec![5, 15];

        save(&path, &config).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.paths.index, "/data/index");
        assert_eq!(loaded.sweep.terms_candidates, vec![5, 15]);
    }

    #[test]
    fn test_missing_index_is_config_error() {
        let config = SweepConfig::default();
        let err = config.index_path().unwrap_err();
        assert!(matches!(err, SweepError::Config(_)));
        assert!(err.to_string().contains("paths.index"));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fbsweep.toml");
        fs::write(&path, "[metrics\nquery_count = ").unwrap();
        assert!(matches!(load(&path), Err(SweepError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = load(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, SweepError::Io { .. }));
    }

    #[test]
    fn test_query_file_joins_dir() {
        let mut config = SweepConfig::default();
        config.paths.query_dir = "/q".to_string();
        assert_eq!(
            config.query_file("queries.txt").unwrap(),
            PathBuf::from("/q/queries.txt")
        );
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let explicit = Path::new("/somewhere/custom.toml");
        assert_eq!(resolve(Some(explicit)), Some(explicit.to_path_buf()));
    }
}
