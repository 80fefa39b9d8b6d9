//! Crop subsystem: growth-stage state machine and harvest yield.
//!
//! Annual lifecycle (strictly forward):
//!   seedling → vegetative → flowering → mature → harvestable → overripe → rotted
//!
//! Perennials reuse the same stages within each season and add:
//!   - establishment: no harvestable fruit until established
//!   - dormancy (deciduous only): winter halts growth and banks chill hours
//!   - a spring re-anchor that starts a fresh season
//!   - an age-based yield curve and a chill-hour yield factor

use crate::{
    clock::{CalendarDate, Season},
    config::{CropConfig, GameConfig, StageCoefficients, YieldCurve},
    event::SimEvent,
    state::Cell,
    types::Day,
    weather_subsystem::DailyWeather,
};
use serde::{Deserialize, Serialize};

pub const OVERRIPE_DAYS: i32 = 30;

/// Length of the winter dormancy (Dec + Jan + Feb).
pub const DORMANCY_DAYS: f64 = 90.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Seedling,
    Vegetative,
    Flowering,
    Mature,
    Harvestable,
    Overripe,
}

impl GrowthStage {
    /// Stage reached at a normalized GDD progress (0..=1).
    pub fn for_progress(progress: f64) -> Self {
        if progress >= 1.0 {
            Self::Harvestable
        } else if progress >= 0.70 {
            Self::Mature
        } else if progress >= 0.40 {
            Self::Flowering
        } else if progress >= 0.10 {
            Self::Vegetative
        } else {
            Self::Seedling
        }
    }

    pub fn is_harvestable(&self) -> bool {
        matches!(self, Self::Harvestable | Self::Overripe)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropInstance {
    pub crop_id:                 String,
    /// Re-anchored each spring for perennials.
    pub planted_day:             Day,
    pub gdd_accumulated:         f64,
    pub water_stress_days:       u32,
    pub growth_stage:            GrowthStage,
    /// -1 unless growth_stage is Overripe.
    pub overripe_days_remaining: i32,
    pub perennial_age:           u32,
    pub perennial_established:   bool,
    pub is_dormant:              bool,
    pub harvested_this_season:   bool,
    pub chill_hours_accumulated: f64,
}

impl CropInstance {
    pub fn new(crop: &CropConfig, day: Day) -> Self {
        let established = crop
            .perennial
            .as_ref()
            .is_some_and(|p| p.years_to_establish == 0);
        Self {
            crop_id: crop.id.clone(),
            planted_day: day,
            gdd_accumulated: 0.0,
            water_stress_days: 0,
            growth_stage: GrowthStage::Seedling,
            overripe_days_remaining: -1,
            perennial_age: 0,
            perennial_established: established,
            is_dormant: false,
            harvested_this_season: false,
            chill_hours_accumulated: 0.0,
        }
    }

    pub fn progress(&self, crop: &CropConfig) -> f64 {
        if crop.gdd_to_maturity <= 0.0 {
            return 1.0;
        }
        (self.gdd_accumulated / crop.gdd_to_maturity).min(1.0)
    }

    /// Start a fresh perennial season on `day`.
    fn start_season(&mut self, day: Day) {
        self.planted_day = day;
        self.gdd_accumulated = 0.0;
        self.water_stress_days = 0;
        self.growth_stage = GrowthStage::Vegetative;
        self.overripe_days_remaining = -1;
        self.harvested_this_season = false;
    }

    /// This season's fruit is gone, picked or dropped. The plant stays.
    pub fn finish_season(&mut self) {
        self.growth_stage = GrowthStage::Mature;
        self.overripe_days_remaining = -1;
        self.harvested_this_season = true;
    }

    fn has_unpicked_fruit(&self) -> bool {
        self.growth_stage.is_harvestable() && !self.harvested_this_season
    }
}

pub fn stage_kc(crop: &CropConfig, stage: GrowthStage) -> f64 {
    let StageCoefficients { seedling, vegetative, flowering, mature } = crop.kc;
    match stage {
        GrowthStage::Seedling   => seedling,
        GrowthStage::Vegetative => vegetative,
        GrowthStage::Flowering  => flowering,
        GrowthStage::Mature | GrowthStage::Harvestable | GrowthStage::Overripe => mature,
    }
}

/// What one tick of crop growth did to a cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropTickOutcome {
    pub became_harvestable: bool,
    pub water_stressed:     bool,
    pub events:             Vec<SimEvent>,
}

/// One day of growth for the crop on `cell`, if any.
/// Runs after the soil subsystem has updated the cell for the day.
pub fn simulate_crop(
    cell: &mut Cell,
    weather: &DailyWeather,
    date: &CalendarDate,
    chill_hours_this_year: f64,
    config: &GameConfig,
) -> CropTickOutcome {
    let mut outcome = CropTickOutcome::default();
    let (row, col) = (cell.row, cell.col);
    let Some(crop) = cell.crop.as_mut() else {
        return outcome;
    };
    let def = config.crop(&crop.crop_id);
    let today = weather.day;

    // ── Perennial season boundaries ────────────────
    if let Some(perennial) = &def.perennial {
        if perennial.evergreen {
            if date.month == 3 && date.day_of_month == 1 {
                if crop.has_unpicked_fruit() {
                    outcome.events.push(SimEvent::FruitDropped { row, col, crop_id: def.id.clone() });
                }
                crop.start_season(today);
            }
        } else if date.season == Season::Winter {
            if !crop.is_dormant {
                if crop.has_unpicked_fruit() {
                    outcome.events.push(SimEvent::FruitDropped { row, col, crop_id: def.id.clone() });
                    crop.finish_season();
                }
                crop.is_dormant = true;
                crop.chill_hours_accumulated = 0.0;
                crop.overripe_days_remaining = -1;
                log::debug!("day={today} crop: {} at ({row}, {col}) entered dormancy", def.id);
            }
            crop.chill_hours_accumulated += chill_hours_this_year / DORMANCY_DAYS;
            return outcome;
        } else if crop.is_dormant {
            crop.is_dormant = false;
            crop.start_season(today);
            log::debug!(
                "day={today} crop: {} at ({row}, {col}) awoke with {:.0} chill hours",
                def.id,
                crop.chill_hours_accumulated
            );
        }
    }

    // ── Ripeness clock ─────────────────────────────
    match crop.growth_stage {
        GrowthStage::Harvestable => {
            crop.growth_stage = GrowthStage::Overripe;
            crop.overripe_days_remaining = OVERRIPE_DAYS;
            return outcome;
        }
        GrowthStage::Overripe => {
            crop.overripe_days_remaining -= 1;
            if crop.overripe_days_remaining <= 0 {
                if def.is_perennial() {
                    crop.finish_season();
                    outcome.events.push(SimEvent::FruitDropped { row, col, crop_id: def.id.clone() });
                } else {
                    outcome.events.push(SimEvent::CropRotted { row, col, crop_id: def.id.clone() });
                    cell.crop = None;
                    log::info!("day={today} crop: {} at ({row}, {col}) rotted", def.id);
                }
            }
            return outcome;
        }
        _ => {}
    }

    let season_done = def.is_perennial() && crop.harvested_this_season;

    // ── Water stress ───────────────────────────────
    if !season_done && cell.soil.moisture < def.water_stress_threshold * cell.soil.moisture_capacity {
        crop.water_stress_days += 1;
        outcome.water_stressed = true;
    }

    // ── Growth ─────────────────────────────────────
    let before = crop.progress(def);
    crop.gdd_accumulated += weather.gdd(def.gdd_base_temp);
    let after = crop.progress(def);
    let delta = (after - before).max(0.0);
    cell.soil.nitrogen = (cell.soil.nitrogen - def.nitrogen_demand * delta).max(0.0);

    let mut stage = GrowthStage::for_progress(after);
    if def.is_perennial() && (!crop.perennial_established || season_done) {
        stage = stage.min(GrowthStage::Mature);
    }
    let stage = stage.max(crop.growth_stage);
    if stage == GrowthStage::Harvestable && crop.growth_stage < GrowthStage::Harvestable {
        outcome.became_harvestable = true;
        log::debug!("day={today} crop: {} at ({row}, {col}) is harvestable", def.id);
    }
    crop.growth_stage = stage;

    outcome
}

/// Year-rollover aging for a perennial. Returns an event when the
/// plant becomes established.
pub fn age_perennial(cell: &mut Cell, config: &GameConfig) -> Option<SimEvent> {
    let crop = cell.crop.as_mut()?;
    let perennial = config.crop(&crop.crop_id).perennial.as_ref()?;
    crop.perennial_age += 1;
    if !crop.perennial_established && crop.perennial_age >= perennial.years_to_establish {
        crop.perennial_established = true;
        return Some(SimEvent::PerennialEstablished {
            row: cell.row,
            col: cell.col,
            crop_id: crop.crop_id.clone(),
        });
    }
    None
}

// ── Yield ──────────────────────────────────────────────────────────

pub fn water_factor(crop: &CropInstance, today: Day) -> f64 {
    let days = today.saturating_sub(crop.planted_day).max(1);
    let stressed = f64::from(crop.water_stress_days) / f64::from(days);
    (1.0 - 0.5 * stressed).clamp(0.5, 1.0)
}

pub fn nitrogen_factor(crop: &CropConfig, soil_nitrogen: f64) -> f64 {
    if crop.nitrogen_demand <= 0.0 {
        return 1.0;
    }
    let sufficiency = (soil_nitrogen / (0.5 * crop.nitrogen_demand)).clamp(0.0, 1.0);
    0.4 + 0.6 * sufficiency
}

pub fn overripe_factor(crop: &CropInstance) -> f64 {
    if crop.growth_stage == GrowthStage::Overripe {
        f64::from(crop.overripe_days_remaining.max(0)) / f64::from(OVERRIPE_DAYS)
    } else {
        1.0
    }
}

/// Yield multiplier by years since establishment.
pub fn yield_curve_factor(curve: &YieldCurve, years_established: u32) -> f64 {
    let y = f64::from(years_established);
    let ramp = f64::from(curve.ramp_up_years);
    let peak_end = ramp + f64::from(curve.peak_years);
    let decline_end = peak_end + f64::from(curve.decline_years);

    if y < ramp {
        0.6 + 0.4 * (y / ramp)
    } else if y < peak_end {
        1.0
    } else if y < decline_end {
        let t = (y - peak_end) / f64::from(curve.decline_years);
        (1.0 - (1.0 - curve.floor) * t).max(curve.floor)
    } else {
        curve.floor
    }
}

pub fn age_factor(def: &CropConfig, crop: &CropInstance) -> f64 {
    let Some(perennial) = &def.perennial else {
        return 1.0;
    };
    if !crop.perennial_established {
        return 0.0;
    }
    let years = crop.perennial_age.saturating_sub(perennial.years_to_establish);
    yield_curve_factor(&perennial.yield_curve, years)
}

pub fn chill_factor(def: &CropConfig, crop: &CropInstance) -> f64 {
    match &def.perennial {
        Some(p) if p.chill_hours_required > 0.0 => {
            (crop.chill_hours_accumulated / p.chill_hours_required).clamp(0.0, 1.0)
        }
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarvestYield {
    pub units:         f64,
    pub gross_revenue: f64,
    pub labor_cost:    f64,
}

/// Yield and revenue for harvesting `cell` today.
pub fn compute_harvest(
    cell: &Cell,
    config: &GameConfig,
    today: Day,
    yield_modifier: f64,
    price_modifier: f64,
) -> HarvestYield {
    let crop = cell
        .crop
        .as_ref()
        .unwrap_or_else(|| panic!("compute_harvest on empty cell ({}, {})", cell.row, cell.col));
    let def = config.crop(&crop.crop_id);

    let units = def.yield_per_acre
        * water_factor(crop, today)
        * nitrogen_factor(def, cell.soil.nitrogen)
        * overripe_factor(crop)
        * age_factor(def, crop)
        * chill_factor(def, crop)
        * yield_modifier;

    HarvestYield {
        units,
        gross_revenue: units * def.price_per_unit * price_modifier,
        labor_cost: def.labor_cost,
    }
}
