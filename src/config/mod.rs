//! Config module - fbsweep.toml
//!
//! One file carries every run-specific setting:
//! index and output folders, the external scorer command line, the
//! evaluation endpoint with its credentials, and the sweep candidates.
//!
//! # Example
//!
//! ```no_run
//! use fbsweep::config;
//!
//! let path = config::resolve(None).expect("no fbsweep.toml found");
//! let config = config::load(&path)?;
//! println!("Scoring with: {}", config.scorer.program);
//! # Ok::<(), fbsweep::SweepError>(())
//! ```

mod internal;

use std::path::{Path, PathBuf};

use crate::error::Result;

pub use internal::{
    expand_path, FinalSection, MetricsSection, PathsSection, Reference, ReferencesSection,
    ScorerSection, ServiceSection, SweepConfig, SweepSection,
};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "fbsweep.toml";

/// Environment override for the service username
pub const ENV_USERNAME: &str = "FBSWEEP_USERNAME";

/// Environment override for the service password
pub const ENV_PASSWORD: &str = "FBSWEEP_PASSWORD";

/// Load config from a file
pub fn load(path: &Path) -> Result<SweepConfig> {
    internal::load(path)
}

/// Parse config from TOML text
pub fn parse(contents: &str) -> Result<SweepConfig> {
    internal::parse(contents)
        .map_err(|e| crate::SweepError::Config(format!("invalid config: {}", e)))
}

/// Save config to a file
pub fn save(path: &Path, config: &SweepConfig) -> Result<()> {
    internal::save(path, config)
}

/// Find the config file to use, if any
pub fn resolve(explicit: Option<&Path>) -> Option<PathBuf> {
    internal::resolve(explicit)
}
