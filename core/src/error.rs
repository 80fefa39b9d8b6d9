use thiserror::Error;

/// Recoverable infrastructure failures.
///
/// Player mistakes are not errors: they come back as a failed
/// `CommandResult`. Broken invariants (unknown content ids, non-finite
/// cash) panic.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported save version: found {found}, this build reads up to {supported}")]
    UnsupportedSaveVersion { found: u32, supported: u32 },

    #[error("No snapshot for run '{run_id}' at or before day {day}")]
    SnapshotNotFound { run_id: String, day: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
