//! GameState: the single mutable root of a game session.
//!
//! Owned exclusively by the simulation. Hosts read snapshots; they
//! mutate only by issuing commands. Save/resume must restore the whole
//! structure verbatim, RNG positions included.

use crate::{
    auto_pause::AutoPauseEvent,
    clock::{CalendarDate, SimSpeed, STARTING_DAY},
    config::GameConfig,
    crop_subsystem::CropInstance,
    economics_subsystem::EconomyState,
    effect_subsystem::ActiveEffect,
    event::{EventLogEntry, Notification, SimEvent},
    rng::{RngSlot, SimRng},
    soil_subsystem::SoilState,
    storylet_subsystem::PendingForeshadow,
    types::{Day, GRID_COLS, GRID_ROWS},
    weather_subsystem::{DailyWeather, ExtremeWeather},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Only the most recent notifications are kept.
pub const MAX_NOTIFICATIONS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    pub row:        usize,
    pub col:        usize,
    pub crop:       Option<CropInstance>,
    pub soil:       SoilState,
    pub cover_crop: Option<String>,
}

impl Cell {
    pub fn new(row: usize, col: usize, soil: SoilState) -> Self {
        Self { row, col, crop: None, soil, cover_crop: None }
    }

    pub fn is_empty(&self) -> bool {
        self.crop.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Bankruptcy,
    Victory,
}

/// A fired storylet awaiting the player's response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveEvent {
    pub storylet_id:  String,
    pub fired_on_day: Day,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub seed:        u64,
    pub scenario_id: String,
    pub day:         Day,
    pub speed:       SimSpeed,
    /// Row-major, GRID_ROWS × GRID_COLS.
    pub grid:        Vec<Vec<Cell>>,
    pub economy:     EconomyState,

    pub notifications:       Vec<Notification>,
    pub auto_pause_queue:    Vec<AutoPauseEvent>,
    pub event_log:           Vec<EventLogEntry>,
    pub pending_foreshadows: Vec<PendingForeshadow>,
    pub active_effects:      Vec<ActiveEffect>,
    pub active_event:        Option<ActiveEvent>,

    pub weather_rng:      SimRng,
    pub event_rng:        SimRng,
    pub weather_extremes: ExtremeWeather,
    pub current_weather:  Option<DailyWeather>,

    pub game_over:        bool,
    pub game_over_reason: Option<GameOverReason>,

    /// Content-defined flags set by storylet effects.
    pub flags: BTreeMap<String, bool>,
    pub water_stress_paused_this_season: bool,
    pub year_end_summary_pending:        bool,
    pub watering_restricted:             bool,
    pub pending_loan_offer:              Option<f64>,
}

impl GameState {
    /// A fresh game on March 1 of year 1.
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        let econ = &config.economy;
        let grid = (0..GRID_ROWS)
            .map(|row| {
                (0..GRID_COLS)
                    .map(|col| {
                        Cell::new(
                            row,
                            col,
                            SoilState::new(
                                econ.starting_nitrogen,
                                econ.starting_organic_matter,
                                econ.starting_moisture,
                            ),
                        )
                    })
                    .collect()
            })
            .collect();

        Self {
            seed,
            scenario_id: config.scenario.id.clone(),
            day: STARTING_DAY,
            speed: SimSpeed::Paused,
            grid,
            economy: EconomyState::new(econ.starting_cash),
            notifications: Vec::new(),
            auto_pause_queue: Vec::new(),
            event_log: Vec::new(),
            pending_foreshadows: Vec::new(),
            active_effects: Vec::new(),
            active_event: None,
            weather_rng: SimRng::new(seed, RngSlot::Weather),
            event_rng: SimRng::new(seed, RngSlot::Event),
            weather_extremes: ExtremeWeather::default(),
            current_weather: None,
            game_over: false,
            game_over_reason: None,
            flags: BTreeMap::new(),
            water_stress_paused_this_season: false,
            year_end_summary_pending: false,
            watering_restricted: false,
            pending_loan_offer: None,
        }
    }

    pub fn date(&self) -> CalendarDate {
        CalendarDate::from_day(self.day)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.grid.get(row)?.get(col)
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.grid.get_mut(row)?.get_mut(col)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.grid.iter().flatten()
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.grid.iter_mut().flatten()
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Record an event as a player notification.
    pub fn notify(&mut self, event: SimEvent) {
        log::info!("day={} {}: {}", self.day, event.type_name(), event.message());
        self.notifications.push(Notification { day: self.day, event });
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let excess = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
    }
}
