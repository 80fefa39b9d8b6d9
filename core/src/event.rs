//! Events emitted during a tick or a command.
//!
//! RULE: The core never renders anything. Every player-visible
//! happening is a SimEvent; the host decides how to show it.
//! Each event is also kept on the GameState as a Notification.

use crate::{
    clock::Season,
    effect_subsystem::EffectAxis,
    types::Day,
};
use serde::{Deserialize, Serialize};

/// Variants are only ever appended; saves contain them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Calendar ───────────────────────────────────
    SeasonChanged {
        season: Season,
        year: u32,
    },
    YearEnded {
        year: u32,
        revenue: f64,
        expenses: f64,
    },

    // ── Field ──────────────────────────────────────
    HarvestReady {
        cells: Vec<(usize, usize)>,
    },
    WaterStress {
        cells: usize,
    },
    CropRotted {
        row: usize,
        col: usize,
        crop_id: String,
    },
    FruitDropped {
        row: usize,
        col: usize,
        crop_id: String,
    },
    PerennialEstablished {
        row: usize,
        col: usize,
        crop_id: String,
    },
    CoverCropIncorporated {
        row: usize,
        col: usize,
        cover_crop_id: String,
    },

    // ── Storylets ──────────────────────────────────
    ForeshadowAppeared {
        storylet_id: String,
        signal: String,
        event_day: Day,
    },
    StoryletFired {
        storylet_id: String,
        title: String,
    },
    EffectExpired {
        axis: EffectAxis,
    },
    Notice {
        message: String,
    },

    // ── Economy ────────────────────────────────────
    LoanOffered {
        amount: f64,
    },
    LoanTaken {
        amount: f64,
    },
    Bankrupt {
        cash: f64,
    },
    Victory {
        year: u32,
    },
}

impl SimEvent {
    /// Stable name, used for the event_type column in the store.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SeasonChanged { .. }         => "season_changed",
            Self::YearEnded { .. }             => "year_ended",
            Self::HarvestReady { .. }          => "harvest_ready",
            Self::WaterStress { .. }           => "water_stress",
            Self::CropRotted { .. }            => "crop_rotted",
            Self::FruitDropped { .. }          => "fruit_dropped",
            Self::PerennialEstablished { .. }  => "perennial_established",
            Self::CoverCropIncorporated { .. } => "cover_crop_incorporated",
            Self::ForeshadowAppeared { .. }    => "foreshadow_appeared",
            Self::StoryletFired { .. }         => "storylet_fired",
            Self::EffectExpired { .. }         => "effect_expired",
            Self::Notice { .. }                => "notice",
            Self::LoanOffered { .. }           => "loan_offered",
            Self::LoanTaken { .. }             => "loan_taken",
            Self::Bankrupt { .. }              => "bankrupt",
            Self::Victory { .. }               => "victory",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::SeasonChanged { season, year } => {
                format!("{} of year {year} has begun.", season.label())
            }
            Self::YearEnded { year, revenue, expenses } => format!(
                "Year {year} closed: revenue ${revenue:.0}, expenses ${expenses:.0}."
            ),
            Self::HarvestReady { cells } => {
                format!("{} plot(s) ready to harvest.", cells.len())
            }
            Self::WaterStress { cells } => {
                format!("{cells} plot(s) are water-stressed.")
            }
            Self::CropRotted { row, col, crop_id } => {
                format!("The {crop_id} at ({row}, {col}) rotted in the field.")
            }
            Self::FruitDropped { row, col, crop_id } => {
                format!("Unpicked {crop_id} fruit at ({row}, {col}) dropped. This season's crop is lost.")
            }
            Self::PerennialEstablished { row, col, crop_id } => {
                format!("The {crop_id} at ({row}, {col}) is established and will bear fruit.")
            }
            Self::CoverCropIncorporated { row, col, cover_crop_id } => {
                format!("{cover_crop_id} at ({row}, {col}) was worked into the soil.")
            }
            Self::ForeshadowAppeared { signal, .. } => signal.clone(),
            Self::StoryletFired { title, .. } => title.clone(),
            Self::EffectExpired { axis } => format!("{} effect has ended.", axis.label()),
            Self::Notice { message } => message.clone(),
            Self::LoanOffered { amount } => {
                format!("You are out of cash. The bank offers a ${amount:.0} loan.")
            }
            Self::LoanTaken { amount } => format!("Loan of ${amount:.0} received."),
            Self::Bankrupt { cash } => format!("Bankrupt with ${cash:.0} in the account."),
            Self::Victory { year } => format!("You farmed through year {year}!"),
        }
    }
}

/// A SimEvent stamped with the day it happened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub day:   Day,
    pub event: SimEvent,
}

/// Occurrence log entry for a storylet: one per player response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventLogEntry {
    pub storylet_id: String,
    pub day:         Day,
    /// The chosen choice id, or DISMISSED_CHOICE.
    pub choice_id:   String,
}

/// Sentinel choice recorded when an event is dismissed without a choice.
pub const DISMISSED_CHOICE: &str = "dismissed";
