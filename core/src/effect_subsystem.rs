//! Effect subsystem: applies storylet choice effects and expires
//! time-boxed modifiers.
//!
//! Modifiers on the same axis compose multiplicatively; the composed
//! product is clamped to [0, 10].

use crate::{
    event::SimEvent,
    state::GameState,
    types::Day,
};
use serde::{Deserialize, Serialize};

pub const MODIFIER_MIN: f64 = 0.0;
pub const MODIFIER_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EffectAxis {
    Yield,
    Price,
    IrrigationCost,
    WateringRestriction,
}

impl EffectAxis {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Yield               => "Yield",
            Self::Price               => "Price",
            Self::IrrigationCost      => "Irrigation cost",
            Self::WateringRestriction => "Watering restriction",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveEffect {
    pub axis:           EffectAxis,
    pub multiplier:     f64,
    /// Removed by the sweep on the first tick where day >= expires_on_day.
    pub expires_on_day: Day,
    pub source:         String,
}

/// Effects a storylet choice can carry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    ModifyCash { amount: f64 },
    ModifyMoisture { amount: f64 },
    ModifyNitrogen { amount: f64 },
    ModifyOrganicMatter { amount: f64 },
    SetFlag { flag: String, value: bool },
    YieldModifier { multiplier: f64, duration_days: u32 },
    PriceModifier { multiplier: f64, duration_days: u32 },
    IrrigationCostModifier { multiplier: f64, duration_days: u32 },
    WateringRestriction { duration_days: u32 },
    Notify { message: String },
}

/// Composed multiplier for an axis.
pub fn modifier(state: &GameState, axis: EffectAxis) -> f64 {
    state
        .active_effects
        .iter()
        .filter(|e| e.axis == axis)
        .map(|e| e.multiplier)
        .product::<f64>()
        .clamp(MODIFIER_MIN, MODIFIER_MAX)
}

fn register(state: &mut GameState, axis: EffectAxis, multiplier: f64, duration_days: u32, source: &str) {
    state.active_effects.push(ActiveEffect {
        axis,
        multiplier,
        expires_on_day: state.day + duration_days,
        source: source.to_string(),
    });
}

/// Apply a choice's effects in order. Returns any events they produce.
pub fn apply_effects(state: &mut GameState, effects: &[Effect], source: &str) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for effect in effects {
        match effect {
            Effect::ModifyCash { amount } => state.economy.record_delta(*amount),
            Effect::ModifyMoisture { amount } => {
                for cell in state.cells_mut() {
                    cell.soil.add_moisture(*amount);
                }
            }
            Effect::ModifyNitrogen { amount } => {
                for cell in state.cells_mut() {
                    cell.soil.add_nitrogen(*amount);
                }
            }
            Effect::ModifyOrganicMatter { amount } => {
                for cell in state.cells_mut() {
                    cell.soil.add_organic_matter(*amount);
                }
            }
            Effect::SetFlag { flag, value } => {
                state.flags.insert(flag.clone(), *value);
            }
            Effect::YieldModifier { multiplier, duration_days } => {
                register(state, EffectAxis::Yield, *multiplier, *duration_days, source);
            }
            Effect::PriceModifier { multiplier, duration_days } => {
                register(state, EffectAxis::Price, *multiplier, *duration_days, source);
            }
            Effect::IrrigationCostModifier { multiplier, duration_days } => {
                register(state, EffectAxis::IrrigationCost, *multiplier, *duration_days, source);
            }
            Effect::WateringRestriction { duration_days } => {
                register(state, EffectAxis::WateringRestriction, 1.0, *duration_days, source);
                state.watering_restricted = true;
            }
            Effect::Notify { message } => {
                events.push(SimEvent::Notice { message: message.clone() });
            }
        }
        log::debug!("day={} effect: applied {effect:?} from {source}", state.day);
    }
    events
}

/// Remove expired effects. Clears the watering restriction once no
/// restriction effect remains.
pub fn expire_effects(state: &mut GameState) -> Vec<SimEvent> {
    let today = state.day;
    let mut events = Vec::new();
    let mut lifted_restriction = false;

    state.active_effects.retain(|effect| {
        if today >= effect.expires_on_day {
            if effect.axis == EffectAxis::WateringRestriction {
                lifted_restriction = true;
            }
            events.push(SimEvent::EffectExpired { axis: effect.axis });
            false
        } else {
            true
        }
    });

    if lifted_restriction
        && !state
            .active_effects
            .iter()
            .any(|e| e.axis == EffectAxis::WateringRestriction)
    {
        state.watering_restricted = false;
        log::info!("day={today} effect: watering restriction lifted");
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn state() -> GameState {
        GameState::new(&GameConfig::standard(), 1)
    }

    #[test]
    fn same_axis_composes_multiplicatively() {
        let mut s = state();
        apply_effects(
            &mut s,
            &[
                Effect::PriceModifier { multiplier: 1.5, duration_days: 10 },
                Effect::PriceModifier { multiplier: 2.0, duration_days: 10 },
                Effect::YieldModifier { multiplier: 0.5, duration_days: 10 },
            ],
            "test",
        );
        assert_eq!(modifier(&s, EffectAxis::Price), 3.0);
        assert_eq!(modifier(&s, EffectAxis::Yield), 0.5);
        assert_eq!(modifier(&s, EffectAxis::IrrigationCost), 1.0);
    }

    #[test]
    fn composed_modifier_is_clamped() {
        let mut s = state();
        for _ in 0..4 {
            apply_effects(&mut s, &[Effect::PriceModifier { multiplier: 3.0, duration_days: 5 }], "t");
        }
        assert_eq!(modifier(&s, EffectAxis::Price), MODIFIER_MAX);
    }

    #[test]
    fn restriction_clears_when_last_one_expires() {
        let mut s = state();
        apply_effects(&mut s, &[Effect::WateringRestriction { duration_days: 3 }], "a");
        apply_effects(&mut s, &[Effect::WateringRestriction { duration_days: 6 }], "b");
        assert!(s.watering_restricted);

        s.day += 3;
        expire_effects(&mut s);
        assert!(s.watering_restricted, "second restriction still active");

        s.day += 3;
        let events = expire_effects(&mut s);
        assert!(!s.watering_restricted);
        assert_eq!(events, vec![SimEvent::EffectExpired { axis: EffectAxis::WateringRestriction }]);
    }

    #[test]
    fn soil_effects_respect_bounds() {
        let mut s = state();
        apply_effects(&mut s, &[Effect::ModifyNitrogen { amount: 500.0 }], "t");
        apply_effects(&mut s, &[Effect::ModifyMoisture { amount: -50.0 }], "t");
        for cell in s.cells() {
            assert_eq!(cell.soil.nitrogen, 200.0);
            assert_eq!(cell.soil.moisture, 0.0);
        }
    }
}
