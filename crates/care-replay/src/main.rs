// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `care-replay`: replays a recorded interaction scenario and prints one JSON
//! object per result on stdout.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use care_app_core::config::ConfigService;
use care_config_fs::FsConfigStore;
use care_replay::{load_scenario, Replayer};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay an EchoCare interaction scenario")]
struct Args {
    /// Scenario JSON file.
    scenario: PathBuf,
    /// Load configuration from this directory instead of the scenario.
    #[arg(long, conflicts_with = "user_config")]
    config_dir: Option<PathBuf>,
    /// Load configuration from the platform config directory.
    #[arg(long)]
    user_config: bool,
    /// Write records here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let scenario = load_scenario(&args.scenario)?;

    let store = match (&args.config_dir, args.user_config) {
        (Some(dir), _) => Some(
            FsConfigStore::at(dir)
                .with_context(|| format!("failed to open config dir {}", dir.display()))?,
        ),
        (None, true) => Some(FsConfigStore::new().context("failed to open user config dir")?),
        (None, false) => None,
    };
    let mut replayer = match store {
        Some(store) => {
            if scenario.has_inline_config() {
                warn!("scenario configuration ignored; using config store");
            }
            info!(dir = %store.base().display(), "loading configuration");
            Replayer::from_config(&ConfigService::new(store))?
        }
        None => Replayer::from_scenario(&scenario),
    };

    let records = replayer.run(&scenario.steps);
    info!(steps = scenario.steps.len(), records = records.len(), "replay finished");

    let out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);
    for record in &records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
