//! `fbsweep init` - write a default config

use anyhow::{bail, Result};
use std::path::Path;

use fbsweep::config::{self, SweepConfig};

pub fn execute(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    config::save(path, &SweepConfig::default())?;

    println!("✅ Wrote {}", path.display());
    println!("\nNext steps:");
    println!("  1. Set paths.index and paths.query_dir");
    println!("  2. Set service.url and service.username");
    println!(
        "  3. Export {} (or set service.password)",
        config::ENV_PASSWORD
    );
    println!("  4. fbsweep run");
    Ok(())
}
