//! Threadboard Replay
//!
//! Drives the transform engine from a scripted list of gestures against an
//! in-memory store and prints the resulting annotations as JSON.

mod script;

use clap::Parser;
use script::ReplayError;
use std::path::PathBuf;
use std::sync::Arc;
use threadboard_core::{EngineConfig, MemoryStore, Whiteboard, WorkspaceId};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Engine config file. Defaults to the user config directory.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "replay")]
    workspace: String,
    #[arg(long, default_value = "replay")]
    user: String,
    /// JSON script of gesture steps.
    script: PathBuf,
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig, ReplayError> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => match EngineConfig::default_path() {
            Some(path) => Ok(EngineConfig::load_or_default(&path)?),
            None => Ok(EngineConfig::default()),
        },
    }
}

fn replay(args: Args) -> Result<String, ReplayError> {
    let config = load_config(args.config.as_ref())?;
    let json = std::fs::read_to_string(&args.script).map_err(|source| ReplayError::Io {
        path: args.script.clone(),
        source,
    })?;
    let steps = script::parse(&json)?;
    log::info!("Replaying {} steps from {}", steps.len(), args.script.display());

    let store = Arc::new(MemoryStore::new());
    let workspace = WorkspaceId::new(args.workspace);
    let mut board = Whiteboard::new(store.clone(), workspace.clone(), args.user, config)?;
    let summary = pollster::block_on(script::run(&mut board, &steps))?;
    log::info!(
        "Created {}, committed {}, discarded {} ({} live writes)",
        summary.created,
        summary.committed,
        summary.discarded,
        summary.live_writes
    );

    let annotations = store.snapshot(&workspace)?;
    Ok(serde_json::to_string_pretty(&annotations)?)
}

fn main() {
    env_logger::init();
    match replay(Args::parse()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
