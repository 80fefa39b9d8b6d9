//! The simulation engine: one call advances exactly one day.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Refuse to advance when game over, paused, or a pause is queued
//!   2. Weather for the new day (weather RNG only)
//!   3. Calendar advance; season change resets the water-stress flag
//!   4. Per cell: soil, then crop
//!   5. Auto-pause reasons: harvest-ready, water-stress, year-end,
//!      insolvency, victory
//!   6. Expire time-boxed effects
//!   7. Storylet selection (event RNG only)
//!   8. Economy finiteness check
//!   9. Force speed to Paused if anything is queued
//!
//! RULES:
//!   - The engine never reads wall-clock time. Hosts decide when to tick.
//!   - Weather and events draw from separate RNG streams.
//!   - Every event returned is also recorded as a notification.

use crate::{
    auto_pause::{add_auto_pause, AutoPauseReason, PausePayload},
    clock::SimSpeed,
    command::{Command, CommandResult},
    command_processor::process_command,
    config::GameConfig,
    crop_subsystem::{age_perennial, simulate_crop},
    economics_subsystem::loan_amount,
    effect_subsystem::expire_effects,
    event::SimEvent,
    soil_subsystem::simulate_soil,
    state::{GameOverReason, GameState},
    storylet_subsystem::run_storylets,
    types::Day,
    weather_subsystem::generate_daily_weather,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    GameOver,
    Paused,
    AutoPause,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Blocked(BlockReason),
    Advanced { day: Day, events: Vec<SimEvent> },
}

/// Why a tick would be refused right now, if at all.
pub fn block_reason(state: &GameState) -> Option<BlockReason> {
    if state.game_over {
        Some(BlockReason::GameOver)
    } else if state.speed.is_paused() {
        Some(BlockReason::Paused)
    } else if !state.auto_pause_queue.is_empty() {
        Some(BlockReason::AutoPause)
    } else {
        None
    }
}

/// Advance `state` by one day.
pub fn tick(state: &mut GameState, config: &GameConfig) -> TickOutcome {
    if let Some(reason) = block_reason(state) {
        return TickOutcome::Blocked(reason);
    }

    let mut events = Vec::new();
    let previous = state.date();
    let new_day = state.day + 1;

    // ── 2. Weather ────────────────────────────────
    let weather = generate_daily_weather(
        new_day,
        &config.scenario,
        &mut state.weather_extremes,
        &mut state.weather_rng,
    );

    // ── 3. Calendar ───────────────────────────────
    state.day = new_day;
    let date = state.date();
    if date.season != previous.season {
        state.water_stress_paused_this_season = false;
        events.push(SimEvent::SeasonChanged { season: date.season, year: date.year });
    }
    let year_rolled = date.year != previous.year;

    // ── 4. Soil and crops ─────────────────────────
    let chill_hours = config.scenario.year(date.year).chill_hours;
    let mut harvest_ready = Vec::new();
    let mut stressed_cells = 0usize;
    for cell in state.cells_mut() {
        if let Some(event) = simulate_soil(cell, &weather, date.season, config) {
            events.push(event);
        }
        let outcome = simulate_crop(cell, &weather, &date, chill_hours, config);
        if outcome.became_harvestable {
            harvest_ready.push((cell.row, cell.col));
        }
        if outcome.water_stressed {
            stressed_cells += 1;
        }
        events.extend(outcome.events);
    }
    state.current_weather = Some(weather);

    // ── 5. Pause reasons ──────────────────────────
    if !harvest_ready.is_empty() {
        let event = SimEvent::HarvestReady { cells: harvest_ready.clone() };
        add_auto_pause(
            state,
            AutoPauseReason::HarvestReady,
            event.message(),
            Some(PausePayload::Cells { cells: harvest_ready }),
        );
        events.push(event);
    }

    if stressed_cells > 0 && !state.water_stress_paused_this_season {
        state.water_stress_paused_this_season = true;
        let event = SimEvent::WaterStress { cells: stressed_cells };
        add_auto_pause(state, AutoPauseReason::WaterStress, event.message(), None);
        events.push(event);
    }

    if year_rolled {
        events.extend(roll_year(state, config, previous.year));
    }

    if let Some(event) = check_insolvency(state, config) {
        events.push(event);
    }

    if year_rolled && date.year > config.economy.victory_year {
        events.push(declare_victory(state, previous.year));
    }

    // ── 6. Effects ────────────────────────────────
    events.extend(expire_effects(state));

    // ── 7. Storylets ──────────────────────────────
    events.extend(run_storylets(state, config));

    // ── 8. Invariants ─────────────────────────────
    state.economy.assert_finite();

    // ── 9. Speed ──────────────────────────────────
    if !state.auto_pause_queue.is_empty() {
        state.speed = SimSpeed::Paused;
    }

    for event in &events {
        state.notify(event.clone());
    }
    TickOutcome::Advanced { day: new_day, events }
}

/// Close `closed_year` and age perennials.
fn roll_year(state: &mut GameState, config: &GameConfig, closed_year: u32) -> Vec<SimEvent> {
    let mut events = Vec::new();

    let summary = state.economy.close_year(closed_year, &config.economy);
    state.economy.reset_yearly();
    log::info!(
        "day={} economy: year {closed_year} closed revenue={:.2} expenses={:.2} cash={:.2}",
        state.day,
        summary.revenue,
        summary.expenses,
        summary.cash
    );
    let event = SimEvent::YearEnded {
        year: closed_year,
        revenue: summary.revenue,
        expenses: summary.expenses,
    };
    state.year_end_summary_pending = true;
    add_auto_pause(
        state,
        AutoPauseReason::YearEnd,
        event.message(),
        Some(PausePayload::YearSummary { summary }),
    );
    events.push(event);

    for cell in state.cells_mut() {
        events.extend(age_perennial(cell, config));
    }
    events
}

/// The final year is complete. A bankruptcy raised on the same tick
/// keeps its terminal reason; an open loan offer stays answerable.
fn declare_victory(state: &mut GameState, final_year: u32) -> SimEvent {
    state.game_over = true;
    if state.game_over_reason.is_none() {
        state.game_over_reason = Some(GameOverReason::Victory);
    }
    log::info!("day={} engine: year {final_year} completed", state.day);
    let event = SimEvent::Victory { year: final_year };
    add_auto_pause(state, AutoPauseReason::Year30, event.message(), None);
    event
}

/// First insolvency raises a loan offer while loans remain; otherwise
/// the game ends in bankruptcy.
fn check_insolvency(state: &mut GameState, config: &GameConfig) -> Option<SimEvent> {
    if state.game_over || state.pending_loan_offer.is_some() || !state.economy.is_insolvent() {
        return None;
    }
    let cash = state.economy.cash;
    state.game_over = true;
    state.game_over_reason = Some(GameOverReason::Bankruptcy);

    if state.economy.loans_received < config.economy.max_loans {
        let amount = loan_amount(cash, &config.economy);
        state.pending_loan_offer = Some(amount);
        let event = SimEvent::LoanOffered { amount };
        add_auto_pause(
            state,
            AutoPauseReason::LoanOffer,
            event.message(),
            Some(PausePayload::LoanOffer { amount }),
        );
        Some(event)
    } else {
        let event = SimEvent::Bankrupt { cash };
        add_auto_pause(state, AutoPauseReason::Bankruptcy, event.message(), None);
        Some(event)
    }
}

/// Totals from a multi-day run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub days_advanced: u32,
    pub events:        Vec<SimEvent>,
    pub blocked:       Option<BlockReason>,
}

/// Owns one game session: content plus the mutable state.
pub struct SimEngine {
    pub config: GameConfig,
    pub state:  GameState,
}

impl SimEngine {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let state = GameState::new(&config, seed);
        Self { config, state }
    }

    /// Resume from a restored snapshot.
    pub fn from_state(config: GameConfig, state: GameState) -> Self {
        Self { config, state }
    }

    pub fn tick(&mut self) -> TickOutcome {
        tick(&mut self.state, &self.config)
    }

    /// Tick up to `n` days, stopping at the first refusal.
    pub fn run_ticks(&mut self, n: u32) -> RunSummary {
        let mut summary = RunSummary::default();
        for _ in 0..n {
            match self.tick() {
                TickOutcome::Advanced { events, .. } => {
                    summary.days_advanced += 1;
                    summary.events.extend(events);
                }
                TickOutcome::Blocked(reason) => {
                    summary.blocked = Some(reason);
                    break;
                }
            }
        }
        summary
    }

    pub fn process_command(&mut self, command: &Command) -> CommandResult {
        process_command(&mut self.state, &self.config, command)
    }

    /// Detached copy for hosts.
    pub fn snapshot(&self) -> GameState {
        crate::snapshot::snapshot(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_engine_does_not_advance() {
        let mut engine = SimEngine::new(GameConfig::standard(), 1);
        let day = engine.state.day;
        assert_eq!(engine.tick(), TickOutcome::Blocked(BlockReason::Paused));
        assert_eq!(engine.state.day, day);
    }

    #[test]
    fn queued_pause_forces_speed_to_zero() {
        let mut engine = SimEngine::new(GameConfig::standard(), 1);
        engine.state.speed = SimSpeed::Fast;
        engine.state.economy.cash = -1.0;
        let outcome = engine.tick();
        assert!(matches!(outcome, TickOutcome::Advanced { .. }));
        assert_eq!(engine.state.speed, SimSpeed::Paused);
        assert!(engine.state.pending_loan_offer.is_some());
        assert!(engine.state.game_over, "first insolvency is a transient game over");
    }
}
