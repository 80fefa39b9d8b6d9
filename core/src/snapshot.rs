//! Snapshot serialization: full GameState to/from JSON.
//!
//! A snapshot captures everything needed to resume: grid, ledger,
//! queues, logs, effects and both RNG positions. Resuming from a
//! snapshot and ticking on must match a run that never stopped.

use crate::{
    error::{SimError, SimResult},
    state::GameState,
    types::Day,
};
use serde::{Deserialize, Serialize};

/// Bumped whenever a saved field changes meaning.
pub const SAVE_VERSION: u32 = 1;

/// Hosts persist a snapshot every SNAPSHOT_INTERVAL days.
pub const SNAPSHOT_INTERVAL: Day = 30; // monthly

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveFile {
    pub version: u32,
    pub state:   GameState,
}

/// Detached deep copy. Hosts render from this and never touch the live
/// state.
pub fn snapshot(state: &GameState) -> GameState {
    state.clone()
}

pub fn to_json(state: &GameState) -> SimResult<String> {
    let save = SaveFile { version: SAVE_VERSION, state: state.clone() };
    Ok(serde_json::to_string(&save)?)
}

pub fn from_json(json: &str) -> SimResult<GameState> {
    let save: SaveFile = serde_json::from_str(json)?;
    if save.version > SAVE_VERSION {
        return Err(SimError::UnsupportedSaveVersion {
            found: save.version,
            supported: SAVE_VERSION,
        });
    }
    Ok(save.state)
}
