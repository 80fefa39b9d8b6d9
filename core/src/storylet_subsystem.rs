//! Storylet subsystem: content-driven events and advisor messages.
//!
//! RULE: Only this module draws from the event RNG.
//! RULE: Deterministic preconditions are checked (and short-circuit)
//!       before any Random precondition. A storylet that fails on
//!       deterministic grounds never consumes a draw, which keeps the
//!       event stream independent of the weather stream.
//! RULE: Nothing is evaluated while an event awaits a response.
//!
//! Lifecycle per storylet:
//!   dormant → conditions pass → fires now (no foreshadowing)
//!                             → PendingForeshadow → matures → fires
//!                                                           → false alarm

use crate::{
    auto_pause::{add_auto_pause, AutoPauseReason, PausePayload},
    clock::{month_in_window, Season},
    config::GameConfig,
    effect_subsystem::Effect,
    event::{EventLogEntry, SimEvent},
    state::{ActiveEvent, Cell, GameState},
    types::Day,
};
use serde::{Deserialize, Serialize};

/// Storylets at or above this priority bypass the weighted draw.
pub const MANDATORY_PRIORITY: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoryletKind {
    Event,
    Advisor,
}

impl StoryletKind {
    pub fn pause_reason(&self) -> AutoPauseReason {
        match self {
            Self::Event   => AutoPauseReason::Event,
            Self::Advisor => AutoPauseReason::Advisor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    MinDay { day: Day },
    SeasonIs { seasons: Vec<Season> },
    /// Inclusive; wraps across the new year when start > end.
    MonthBetween { start: u32, end: u32 },
    YearAtLeast { year: u32 },
    YearAtMost { year: u32 },
    CashBelow { amount: f64 },
    CashAbove { amount: f64 },
    HasCrop { crop_id: String },
    HasPerennial,
    HasEmptyCell,
    AvgMoistureBelow { inches: f64 },
    AvgNitrogenBelow { amount: f64 },
    AvgOrganicMatterBelow { percent: f64 },
    FlagSet { flag: String },
    FlagNotSet { flag: String },
    Random { probability: f64 },
}

impl Condition {
    pub fn is_random(&self) -> bool {
        matches!(self, Self::Random { .. })
    }

    /// Evaluate a deterministic condition. Random conditions are rolled
    /// separately against the event RNG.
    pub fn holds(&self, state: &GameState, config: &GameConfig) -> bool {
        let date = state.date();
        match self {
            Self::MinDay { day } => state.day >= *day,
            Self::SeasonIs { seasons } => seasons.contains(&date.season),
            Self::MonthBetween { start, end } => month_in_window(date.month, *start, *end),
            Self::YearAtLeast { year } => date.year >= *year,
            Self::YearAtMost { year } => date.year <= *year,
            Self::CashBelow { amount } => state.economy.cash < *amount,
            Self::CashAbove { amount } => state.economy.cash > *amount,
            Self::HasCrop { crop_id } => state
                .cells()
                .any(|c| c.crop.as_ref().is_some_and(|crop| &crop.crop_id == crop_id)),
            Self::HasPerennial => state.cells().any(|c| {
                c.crop
                    .as_ref()
                    .is_some_and(|crop| config.crop(&crop.crop_id).is_perennial())
            }),
            Self::HasEmptyCell => state.cells().any(|c| c.is_empty()),
            Self::AvgMoistureBelow { inches } => average(state, |c| c.soil.moisture) < *inches,
            Self::AvgNitrogenBelow { amount } => average(state, |c| c.soil.nitrogen) < *amount,
            Self::AvgOrganicMatterBelow { percent } => {
                average(state, |c| c.soil.organic_matter) < *percent
            }
            Self::FlagSet { flag } => state.flag(flag),
            Self::FlagNotSet { flag } => !state.flag(flag),
            Self::Random { .. } => panic!("Random condition evaluated deterministically"),
        }
    }
}

fn average(state: &GameState, f: impl Fn(&Cell) -> f64) -> f64 {
    let (sum, n) = state.cells().fold((0.0, 0usize), |(s, n), c| (s + f(c), n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    pub id:      String,
    pub label:   String,
    /// Affordability gate only; any charge is carried by the effects.
    #[serde(default)]
    pub cost:    Option<f64>,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForeshadowConfig {
    pub signal:            String,
    pub days_before_event: u32,
    /// Probability that the warning is followed by the real event.
    pub reliability:       f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Storylet {
    pub id:              String,
    pub kind:            StoryletKind,
    pub title:           String,
    pub description:     String,
    pub preconditions:   Vec<Condition>,
    pub priority:        u32,
    pub cooldown_days:   u32,
    #[serde(default)]
    pub max_occurrences: Option<u32>,
    #[serde(default)]
    pub foreshadowing:   Option<ForeshadowConfig>,
    pub choices:         Vec<Choice>,
}

impl Storylet {
    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingForeshadow {
    pub storylet_id:    String,
    pub appears_on_day: Day,
    pub event_day:      Day,
    /// Rolled once at creation.
    pub is_false_alarm: bool,
    pub dismissed:      bool,
}

// ── Occurrence bookkeeping ─────────────────────────────────────────

pub fn occurrences(state: &GameState, storylet_id: &str) -> u32 {
    state
        .event_log
        .iter()
        .filter(|e| e.storylet_id == storylet_id)
        .count() as u32
}

pub fn last_occurrence(state: &GameState, storylet_id: &str) -> Option<Day> {
    state
        .event_log
        .iter()
        .filter(|e| e.storylet_id == storylet_id)
        .map(|e| e.day)
        .max()
}

/// Cooldown and occurrence cap both permit another occurrence today.
pub fn is_available(storylet: &Storylet, state: &GameState) -> bool {
    if let Some(cap) = storylet.max_occurrences {
        if occurrences(state, &storylet.id) >= cap {
            return false;
        }
    }
    match last_occurrence(state, &storylet.id) {
        Some(last) => state.day.saturating_sub(last) >= storylet.cooldown_days,
        None => true,
    }
}

pub fn record_occurrence(state: &mut GameState, storylet_id: &str, day: Day, choice_id: &str) {
    state.event_log.push(EventLogEntry {
        storylet_id: storylet_id.to_string(),
        day,
        choice_id: choice_id.to_string(),
    });
}

// ── Selection ──────────────────────────────────────────────────────

fn preconditions_pass(storylet: &Storylet, state: &mut GameState, config: &GameConfig) -> bool {
    let view: &GameState = state;
    let deterministic_ok = storylet
        .preconditions
        .iter()
        .filter(|c| !c.is_random())
        .all(|c| c.holds(view, config));
    if !deterministic_ok {
        return false;
    }
    for condition in &storylet.preconditions {
        if let Condition::Random { probability } = condition {
            if !state.event_rng.chance(*probability) {
                return false;
            }
        }
    }
    true
}

/// Resolve matured foreshadows. Returns the storylet to fire (at most
/// one) and the ids resolved this pass.
fn resolve_foreshadows(state: &mut GameState, config: &GameConfig) -> (Option<String>, Vec<String>) {
    let today = state.day;
    let mut resolved = Vec::new();

    for i in 0..state.pending_foreshadows.len() {
        let pending = &state.pending_foreshadows[i];
        if pending.dismissed || pending.event_day > today {
            continue;
        }
        let id = pending.storylet_id.clone();
        let false_alarm = pending.is_false_alarm;
        state.pending_foreshadows[i].dismissed = true;
        resolved.push(id.clone());

        if false_alarm {
            log::debug!("day={today} storylet: foreshadow for {id} was a false alarm");
            continue;
        }
        if !is_available(config.storylet(&id), state) {
            log::debug!("day={today} storylet: foreshadow for {id} blocked by cooldown/cap");
            continue;
        }
        return (Some(id), resolved);
    }
    (None, resolved)
}

/// One selection pass for the current day. Returns the storylet that
/// fires (if any) plus foreshadow events raised along the way.
pub fn select_storylet(state: &mut GameState, config: &GameConfig) -> (Option<String>, Vec<SimEvent>) {
    let mut events = Vec::new();
    if state.game_over || state.active_event.is_some() {
        return (None, events);
    }
    let today = state.day;

    let (matured, resolved_today) = resolve_foreshadows(state, config);
    if matured.is_some() {
        state.pending_foreshadows.retain(|p| !p.dismissed);
        return (matured, events);
    }

    let mut eligible: Vec<&Storylet> = Vec::new();
    for storylet in &config.storylets {
        if !is_available(storylet, state) {
            continue;
        }
        if resolved_today.contains(&storylet.id)
            || state
                .pending_foreshadows
                .iter()
                .any(|p| !p.dismissed && p.storylet_id == storylet.id)
        {
            continue;
        }
        if !preconditions_pass(storylet, state, config) {
            continue;
        }

        match &storylet.foreshadowing {
            Some(foreshadow) => {
                let is_false_alarm = !state.event_rng.chance(foreshadow.reliability);
                let event_day = today + foreshadow.days_before_event;
                state.pending_foreshadows.push(PendingForeshadow {
                    storylet_id: storylet.id.clone(),
                    appears_on_day: today,
                    event_day,
                    is_false_alarm,
                    dismissed: false,
                });
                log::debug!(
                    "day={today} storylet: foreshadowed {} for day {event_day} (false_alarm={is_false_alarm})",
                    storylet.id
                );
                events.push(SimEvent::ForeshadowAppeared {
                    storylet_id: storylet.id.clone(),
                    signal: foreshadow.signal.clone(),
                    event_day,
                });
            }
            None => eligible.push(storylet),
        }
    }
    state.pending_foreshadows.retain(|p| !p.dismissed);

    if eligible.is_empty() {
        return (None, events);
    }
    if let Some(mandatory) = eligible.iter().find(|s| s.priority >= MANDATORY_PRIORITY) {
        return (Some(mandatory.id.clone()), events);
    }

    // Single weighted draw, walked in array order.
    let total: f64 = eligible.iter().map(|s| s.priority as f64).sum();
    let target = state.event_rng.next_f64() * total;
    let mut acc = 0.0;
    let mut picked = eligible[eligible.len() - 1];
    for storylet in &eligible {
        acc += storylet.priority as f64;
        if target < acc {
            picked = storylet;
            break;
        }
    }
    (Some(picked.id.clone()), events)
}

/// Make `storylet_id` the active event and queue its pause.
pub fn activate(state: &mut GameState, config: &GameConfig, storylet_id: &str) -> SimEvent {
    let storylet = config.storylet(storylet_id);
    state.active_event = Some(ActiveEvent {
        storylet_id: storylet.id.clone(),
        fired_on_day: state.day,
    });
    add_auto_pause(
        state,
        storylet.kind.pause_reason(),
        storylet.title.clone(),
        Some(PausePayload::Storylet { storylet_id: storylet.id.clone() }),
    );
    log::info!("day={} storylet: fired {}", state.day, storylet.id);
    SimEvent::StoryletFired {
        storylet_id: storylet.id.clone(),
        title: storylet.title.clone(),
    }
}

/// Selection plus activation; the tick's event step.
pub fn run_storylets(state: &mut GameState, config: &GameConfig) -> Vec<SimEvent> {
    let (fired, mut events) = select_storylet(state, config);
    if let Some(id) = fired {
        events.push(activate(state, config, &id));
    }
    events
}
