//! Soil subsystem: per-cell water, nitrogen and organic-matter balance.
//!
//! Runs for every cell, every tick, before the crop subsystem.
//! Moisture capacity is derived from organic matter and recomputed
//! each tick; moisture always stays within [0, capacity].

use crate::{
    clock::Season,
    config::GameConfig,
    crop_subsystem,
    event::SimEvent,
    state::Cell,
    weather_subsystem::DailyWeather,
};
use serde::{Deserialize, Serialize};

pub const NITROGEN_CAP: f64 = 200.0;
pub const ORGANIC_MATTER_FLOOR: f64 = 0.5;
pub const BARE_SOIL_KC: f64 = 0.3;

/// Fraction of current organic matter lost per year without cover.
const OM_DECAY_PER_YEAR: f64 = 0.02;
/// lbs N per acre per day, per % organic matter.
const MINERALIZATION_RATE: f64 = 0.02;

const CAPACITY_BASE: f64 = 0.8;
const CAPACITY_PER_OM: f64 = 0.6;

pub fn moisture_capacity_for(organic_matter: f64) -> f64 {
    CAPACITY_BASE + CAPACITY_PER_OM * organic_matter
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoilState {
    /// lbs/acre, 0..=200
    pub nitrogen:          f64,
    /// percent, >= 0.5
    pub organic_matter:    f64,
    /// inches, 0..=moisture_capacity
    pub moisture:          f64,
    pub moisture_capacity: f64,
}

impl SoilState {
    pub fn new(nitrogen: f64, organic_matter: f64, moisture: f64) -> Self {
        let mut soil = Self {
            nitrogen: nitrogen.clamp(0.0, NITROGEN_CAP),
            organic_matter: organic_matter.max(ORGANIC_MATTER_FLOOR),
            moisture,
            moisture_capacity: 0.0,
        };
        soil.recompute_capacity();
        soil
    }

    /// Re-derive capacity from organic matter and re-clamp moisture.
    pub fn recompute_capacity(&mut self) {
        self.moisture_capacity = moisture_capacity_for(self.organic_matter);
        self.moisture = self.moisture.clamp(0.0, self.moisture_capacity);
    }

    pub fn add_moisture(&mut self, inches: f64) {
        self.moisture = (self.moisture + inches).clamp(0.0, self.moisture_capacity);
    }

    pub fn add_nitrogen(&mut self, lbs: f64) {
        self.nitrogen = (self.nitrogen + lbs).clamp(0.0, NITROGEN_CAP);
    }

    pub fn add_organic_matter(&mut self, percent: f64) {
        self.organic_matter = (self.organic_matter + percent).max(ORGANIC_MATTER_FLOOR);
        self.recompute_capacity();
    }
}

/// Work a cover crop into the soil: remove it and credit its nitrogen
/// and organic matter.
pub fn incorporate_cover_crop(cell: &mut Cell, config: &GameConfig) -> Option<SimEvent> {
    let cover_id = cell.cover_crop.take()?;
    let cover = config.cover_crop(&cover_id);
    cell.soil.add_nitrogen(cover.nitrogen_fixation);
    cell.soil.add_organic_matter(cover.organic_matter_bonus);
    Some(SimEvent::CoverCropIncorporated {
        row: cell.row,
        col: cell.col,
        cover_crop_id: cover_id,
    })
}

/// Crop coefficient for the cell's current cover.
pub fn cell_kc(cell: &Cell, season: Season, config: &GameConfig) -> f64 {
    if let Some(crop) = cell.crop.as_ref().filter(|c| !c.is_dormant) {
        return crop_subsystem::stage_kc(config.crop(&crop.crop_id), crop.growth_stage);
    }
    if let Some(cover_id) = &cell.cover_crop {
        let cover = config.cover_crop(cover_id);
        return if season == Season::Winter {
            cover.winter_et_coefficient
        } else {
            cover.et_coefficient
        };
    }
    if let Some(crop) = &cell.crop {
        if let Some(perennial) = &config.crop(&crop.crop_id).perennial {
            return perennial.dormant_kc;
        }
    }
    BARE_SOIL_KC
}

/// One day of soil processes for a cell.
pub fn simulate_soil(
    cell: &mut Cell,
    weather: &DailyWeather,
    season: Season,
    config: &GameConfig,
) -> Option<SimEvent> {
    cell.soil.recompute_capacity();

    let incorporated = if season == Season::Spring {
        incorporate_cover_crop(cell, config)
    } else {
        None
    };

    let kc = cell_kc(cell, season, config);
    let et = weather.et0 * kc;
    cell.soil.moisture =
        (cell.soil.moisture - et + weather.precipitation).clamp(0.0, cell.soil.moisture_capacity);

    if cell.cover_crop.is_none() {
        let decay = cell.soil.organic_matter * OM_DECAY_PER_YEAR / 365.0;
        cell.soil.organic_matter = (cell.soil.organic_matter - decay).max(ORGANIC_MATTER_FLOOR);
    }

    let mineralized = cell.soil.organic_matter * MINERALIZATION_RATE;
    cell.soil.nitrogen = (cell.soil.nitrogen + mineralized).min(NITROGEN_CAP);

    cell.soil.recompute_capacity();
    incorporated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dry_day(et0: f64) -> DailyWeather {
        DailyWeather {
            day: 100,
            temp_high: 80.0,
            temp_low: 55.0,
            precipitation: 0.0,
            et0,
            heatwave: false,
            frost: false,
        }
    }

    fn bare_cell() -> Cell {
        Cell::new(0, 0, SoilState::new(100.0, 2.0, 1.5))
    }

    #[test]
    fn capacity_tracks_organic_matter() {
        let soil = SoilState::new(50.0, 2.0, 10.0);
        assert!((soil.moisture_capacity - 2.0).abs() < 1e-12);
        assert!((soil.moisture - 2.0).abs() < 1e-12, "moisture clamps to capacity");
    }

    #[test]
    fn bare_soil_loses_moisture_at_bare_coefficient() {
        let config = GameConfig::standard();
        let mut cell = bare_cell();
        simulate_soil(&mut cell, &dry_day(0.2), Season::Summer, &config);
        assert!((cell.soil.moisture - (1.5 - 0.2 * BARE_SOIL_KC)).abs() < 1e-9);
    }

    #[test]
    fn winter_cover_loses_less_water_than_bare() {
        let config = GameConfig::standard();
        let mut bare = bare_cell();
        let mut covered = bare_cell();
        covered.cover_crop = Some("cereal-rye".into());
        simulate_soil(&mut bare, &dry_day(0.1), Season::Winter, &config);
        simulate_soil(&mut covered, &dry_day(0.1), Season::Winter, &config);
        assert!(covered.soil.moisture > bare.soil.moisture);
    }

    #[test]
    fn cover_crop_halts_organic_matter_decay() {
        let config = GameConfig::standard();
        let mut bare = bare_cell();
        let mut covered = bare_cell();
        covered.cover_crop = Some("legume-vetch".into());
        for _ in 0..30 {
            simulate_soil(&mut bare, &dry_day(0.0), Season::Fall, &config);
            simulate_soil(&mut covered, &dry_day(0.0), Season::Fall, &config);
        }
        assert!(bare.soil.organic_matter < 2.0);
        assert_eq!(covered.soil.organic_matter, 2.0);
    }

    #[test]
    fn spring_incorporates_cover_crop() {
        let config = GameConfig::standard();
        let mut cell = bare_cell();
        cell.cover_crop = Some("legume-vetch".into());
        let event = simulate_soil(&mut cell, &dry_day(0.0), Season::Spring, &config);
        assert!(matches!(event, Some(SimEvent::CoverCropIncorporated { .. })));
        assert!(cell.cover_crop.is_none());
        assert!(cell.soil.nitrogen > 149.0);
    }

    #[test]
    fn nitrogen_and_moisture_stay_in_bounds() {
        let config = GameConfig::standard();
        let mut cell = Cell::new(0, 0, SoilState::new(199.99, 3.0, 0.0));
        let mut wet = dry_day(0.0);
        wet.precipitation = 5.0;
        simulate_soil(&mut cell, &wet, Season::Winter, &config);
        assert_eq!(cell.soil.nitrogen, NITROGEN_CAP);
        assert_eq!(cell.soil.moisture, cell.soil.moisture_capacity);
    }
}
