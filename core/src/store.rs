//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The engine never calls the store; hosts decide when to persist.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use crate::{
    error::{SimError, SimResult},
    event::SimEvent,
    snapshot,
    state::GameState,
    types::Day,
};

/// One persisted notification row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub id:         Option<i64>,
    pub run_id:     String,
    pub day:        Day,
    pub event_type: String,
    pub payload:    String,
}

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, scenario_id: &str, version: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, scenario_id, version, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, seed as i64, scenario_id, version, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Seed recorded for `run_id`, if the run exists.
    pub fn run_seed(&self, run_id: &str) -> SimResult<Option<u64>> {
        let seed = self
            .conn
            .query_row("SELECT seed FROM run WHERE run_id = ?1", params![run_id], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        Ok(seed.map(|s| s as u64))
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_events(&self, run_id: &str, day: Day, events: &[SimEvent]) -> SimResult<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO event_log (run_id, day, event_type, payload) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for event in events {
            stmt.execute(params![
                run_id,
                day as i64,
                event.type_name(),
                serde_json::to_string(event)?,
            ])?;
        }
        Ok(())
    }

    pub fn events_for_day(&self, run_id: &str, day: Day) -> SimResult<Vec<StoredEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, day, event_type, payload
             FROM event_log WHERE run_id = ?1 AND day = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id, day as i64], |row| {
                Ok(StoredEvent {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    day:        row.get::<_, i64>(2)? as Day,
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Snapshot ───────────────────────────────────────────────

    /// Persist the full state under its current day. Re-saving the same
    /// day replaces the earlier row.
    pub fn save_snapshot(&self, run_id: &str, state: &GameState) -> SimResult<()> {
        let json = snapshot::to_json(state)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshot (run_id, day, state_json) VALUES (?1, ?2, ?3)",
            params![run_id, state.day as i64, json],
        )?;
        log::debug!("day={} store: snapshot saved for {run_id}", state.day);
        Ok(())
    }

    pub fn latest_snapshot_before(&self, run_id: &str, day: Day) -> SimResult<Option<(Day, String)>> {
        let result = self
            .conn
            .query_row(
                "SELECT day, state_json FROM snapshot
                 WHERE run_id = ?1 AND day <= ?2
                 ORDER BY day DESC LIMIT 1",
                params![run_id, day as i64],
                |row| Ok((row.get::<_, i64>(0)? as Day, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(result)
    }

    /// Restore the newest state at or before `day`.
    pub fn load_state(&self, run_id: &str, day: Day) -> SimResult<GameState> {
        match self.latest_snapshot_before(run_id, day)? {
            Some((_, json)) => snapshot::from_json(&json),
            None => Err(SimError::SnapshotNotFound { run_id: run_id.to_string(), day }),
        }
    }
}
