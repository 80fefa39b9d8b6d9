//! Shared primitive types used across the entire simulation.

/// Absolute simulated day index. Day 0 is January 1 of year 1.
pub type Day = u32;

/// Grid dimensions. The farm is a fixed 8×8 field of one-acre cells.
pub const GRID_ROWS: usize = 8;
pub const GRID_COLS: usize = 8;

/// The canonical run identifier used by the store.
pub type RunId = String;
