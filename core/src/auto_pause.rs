//! Auto-pause scheduler.
//!
//! Any tick may raise several pause reasons. They queue up in a fixed
//! priority order (highest first); equal priorities keep insertion
//! order. The sort is stable, so re-sorting never reshuffles equals.
//! While the queue is non-empty the simulation speed is held at zero.

use crate::{
    economics_subsystem::YearSummary,
    state::GameState,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AutoPauseReason {
    HarvestReady,
    WaterStress,
    YearEnd,
    Bankruptcy,
    Year30,
    LoanOffer,
    Event,
    Advisor,
}

impl AutoPauseReason {
    pub fn priority(&self) -> u8 {
        match self {
            Self::Bankruptcy | Self::Year30 => 100,
            Self::LoanOffer                 => 90,
            Self::Event | Self::Advisor     => 80,
            Self::HarvestReady              => 60,
            Self::WaterStress               => 50,
            Self::YearEnd                   => 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PausePayload {
    Cells { cells: Vec<(usize, usize)> },
    YearSummary { summary: YearSummary },
    LoanOffer { amount: f64 },
    Storylet { storylet_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutoPauseEvent {
    pub reason:  AutoPauseReason,
    pub message: String,
    #[serde(default)]
    pub payload: Option<PausePayload>,
}

/// Queue a pause reason and restore priority order.
pub fn add_auto_pause(
    state: &mut GameState,
    reason: AutoPauseReason,
    message: impl Into<String>,
    payload: Option<PausePayload>,
) {
    let message = message.into();
    log::debug!("day={} auto-pause: {reason:?} ({message})", state.day);
    state.auto_pause_queue.push(AutoPauseEvent { reason, message, payload });
    // Vec::sort_by_key is stable.
    state
        .auto_pause_queue
        .sort_by_key(|p| std::cmp::Reverse(p.reason.priority()));
}

/// Drop every queued pause with one of `reasons`.
pub fn remove_reasons(state: &mut GameState, reasons: &[AutoPauseReason]) {
    state.auto_pause_queue.retain(|p| !reasons.contains(&p.reason));
}
