// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ripple CLI
//!
//! Runs spatial greedy broadcast sessions over mesh files and manages the
//! stored broadcast prefs.
//!
//! ```text
//! ripple run --mesh mesh.json --start 0,0 --end 7,7
//! ripple prefs show
//! ```
// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ripple_app_core::config::ConfigService;
use ripple_app_core::config_port::{ConfigPort, PREFS_KEY};
use ripple_app_core::prefs::BroadcastPrefs;
use ripple_config_fs::FsConfigStore;
use ripple_core::{BroadcastOptions, Mesh, RelaySession};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ripple spatial broadcast tools")]
struct Args {
    /// Directory holding prefs (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Command to execute
    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Relay a message across a mesh file and report coverage
    Run {
        /// Mesh description (JSON)
        #[arg(long)]
        mesh: PathBuf,
        /// Origin peer as `x,y`
        #[arg(long, value_parser = parse_coord)]
        start: (u32, u32),
        /// Target peer as `x,y`
        #[arg(long, value_parser = parse_coord)]
        end: (u32, u32),
        /// Cell size for neighbor quantization (overrides prefs)
        #[arg(long)]
        grid_size: Option<u32>,
        /// Retry passes per node before it gives up (overrides prefs)
        #[arg(long)]
        max_passes: Option<u32>,
        /// Relay steps before the session is abandoned (overrides prefs)
        #[arg(long)]
        max_steps: Option<u32>,
    },
    /// Inspect or reset stored prefs
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(clap::Subcommand, Debug, Clone, Copy)]
enum PrefsAction {
    /// Print the effective prefs as JSON
    Show,
    /// Overwrite stored prefs with the defaults
    Reset,
}

/// Parses `x,y` into a coordinate pair.
fn parse_coord(raw: &str) -> Result<(u32, u32), String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{raw}`"))?;
    let axis = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("bad coordinate `{v}`: {e}"))
    };
    Ok((axis(x)?, axis(y)?))
}

fn open_config(dir: Option<PathBuf>) -> Result<ConfigService<FsConfigStore>> {
    let store = match dir {
        Some(dir) => FsConfigStore::with_root(&dir)
            .with_context(|| format!("opening config dir {}", dir.display()))?,
        None => FsConfigStore::new().context("opening platform config dir")?,
    };
    Ok(ConfigService::new(store))
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = open_config(args.config_dir)?;
    match args.cmd {
        Command::Run {
            mesh,
            start,
            end,
            grid_size,
            max_passes,
            max_steps,
        } => {
            let mut prefs = config.load_prefs().unwrap_or_default();
            prefs.grid_size = grid_size.unwrap_or(prefs.grid_size);
            prefs.max_passes = max_passes.unwrap_or(prefs.max_passes);
            prefs.max_steps = max_steps.unwrap_or(prefs.max_steps);
            run_session(&mesh, start, end, &prefs)
        }
        Command::Prefs { action } => manage_prefs(&config, action),
    }
}

fn run_session(
    path: &Path,
    start: (u32, u32),
    end: (u32, u32),
    prefs: &BroadcastPrefs,
) -> Result<()> {
    if prefs.grid_size == 0 {
        return Err(anyhow!("grid size must be at least 1"));
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading mesh {}", path.display()))?;
    let mesh = Mesh::from_json(&json).with_context(|| format!("parsing mesh {}", path.display()))?;
    let start = mesh.point(start.0, start.1).context("start peer")?;
    let end = mesh.point(end.0, end.1).context("end peer")?;
    info!(
        peers = mesh.peer_count(),
        links = mesh.link_count(),
        grid_size = prefs.grid_size,
        "mesh loaded"
    );

    let mut session = RelaySession::start(mesh, start, end, BroadcastOptions::from(prefs))?;
    let outcome = session.run(prefs.max_steps);
    let stats = session.stats();
    if let Err(err) = &outcome {
        warn!(error = %err, "session cut short");
    }
    let summary = serde_json::json!({
        "start": [start.x(), start.y()],
        "end": [end.x(), end.y()],
        "reached_end": session.has_reached(&end),
        "finished": outcome.is_ok(),
        "stats": stats,
        "coverage": stats.coverage(),
        "efficiency": stats.efficiency(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    outcome?;
    Ok(())
}

fn manage_prefs(config: &ConfigService<FsConfigStore>, action: PrefsAction) -> Result<()> {
    let prefs = match action {
        PrefsAction::Show => config
            .load_or_default::<BroadcastPrefs>(PREFS_KEY)
            .context("loading prefs")?,
        PrefsAction::Reset => {
            let prefs = BroadcastPrefs::default();
            config.save(PREFS_KEY, &prefs).context("saving prefs")?;
            info!(dir = %config.store().base_dir().display(), "prefs reset");
            prefs
        }
    };
    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(())
}
