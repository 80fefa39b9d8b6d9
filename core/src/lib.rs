//! Grange: a deterministic, single-threaded farm simulation core.
//!
//! Hosts create a `SimEngine`, issue `Command`s, and call `tick` once
//! per simulated day. Same seed plus same command sequence produces
//! the same trajectory, including across save/resume.

pub mod auto_pause;
pub mod clock;
pub mod command;
pub mod command_processor;
pub mod config;
pub mod crop_subsystem;
pub mod economics_subsystem;
pub mod effect_subsystem;
pub mod engine;
pub mod error;
pub mod event;
pub mod rng;
pub mod snapshot;
pub mod soil_subsystem;
pub mod state;
pub mod store;
pub mod storylet_subsystem;
pub mod types;
pub mod weather_subsystem;
