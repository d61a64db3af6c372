//! granary-sim: replay a staking scenario and print a JSON report.
//!
//! ```sh
//! granary-sim scenarios/masterchef.toml
//! GRANARY_SCENARIO=scenarios/masterchef.toml granary-sim
//! ```
//!
//! The report goes to stdout; logs go to stderr.

mod config;
mod replay;

use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::filter::{Directive, EnvFilter};

use crate::config::SimConfig;

/// Environment variable naming the scenario when no argument is given.
const SCENARIO_ENV: &str = "GRANARY_SCENARIO";

fn main() -> anyhow::Result<()> {
    let path = scenario_path()?;
    let config = SimConfig::load(&path)?;

    // RUST_LOG wins over the scenario's log level.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive: Directive = format!("granary={}", config.log.level).parse()?;
            EnvFilter::new("").add_directive(directive)
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(scenario = %path.display(), "granary-sim starting");

    let report = replay::run(&config)?;
    let rejected = report.steps.iter().filter(|s| !s.ok).count();
    if rejected > 0 {
        warn!(rejected, "some steps were rejected");
    }
    if !report.conserved {
        warn!(
            emitted = report.total_emitted,
            paid = report.total_paid,
            custody = report.custody_rewards,
            "reward conservation check failed"
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// First CLI argument, else the `GRANARY_SCENARIO` variable.
fn scenario_path() -> anyhow::Result<PathBuf> {
    if let Some(arg) = std::env::args_os().nth(1) {
        return Ok(PathBuf::from(arg));
    }
    match std::env::var_os(SCENARIO_ENV) {
        Some(path) => Ok(PathBuf::from(path)),
        None => anyhow::bail!("usage: granary-sim <scenario.toml> (or set {SCENARIO_ENV})"),
    }
}
