//! Weather subsystem: one day of weather per tick from the weather RNG.
//!
//! Canonical draw sequence per day (never reordered, never skipped):
//!   1. temperature roll
//!   2. precipitation roll
//!   3. precipitation amount roll (drawn even on dry days)
//!   4. extreme-weather roll(s), only while no extreme is running:
//!      heatwave roll, then frost roll if no heatwave started,
//!      then a duration roll if either started.
//!
//! Heatwaves and frosts persist 3–5 days once triggered.

use crate::{
    clock::CalendarDate,
    config::ClimateScenario,
    rng::SimRng,
    types::Day,
};
use serde::{Deserialize, Serialize};

/// Days in a season, used to spread a per-season probability over days.
const SEASON_DAYS: f64 = 91.0;

const HEATWAVE_HIGH_BOOST: f64 = 15.0;
const HEATWAVE_ET_FACTOR: f64 = 1.4;
const FROST_LOW_CAP: f64 = 28.0;
const FROST_HIGH_DROP: f64 = 10.0;

const MIN_EXTREME_DAYS: i64 = 3;
const MAX_EXTREME_DAYS: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyWeather {
    pub day:           Day,
    pub temp_high:     f64,
    pub temp_low:      f64,
    /// Inches.
    pub precipitation: f64,
    /// Reference evapotranspiration, inches.
    pub et0:           f64,
    pub heatwave:      bool,
    pub frost:         bool,
}

impl DailyWeather {
    /// Growing-degree-days for a crop with the given base temperature.
    pub fn gdd(&self, base_temp: f64) -> f64 {
        ((self.temp_high + self.temp_low) / 2.0 - base_temp).max(0.0)
    }
}

/// Multi-day persistence of extreme weather. Persisted with the game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ExtremeWeather {
    pub heatwave_days_left: u32,
    pub frost_days_left:    u32,
}

impl ExtremeWeather {
    pub fn is_active(&self) -> bool {
        self.heatwave_days_left > 0 || self.frost_days_left > 0
    }
}

/// Convert a per-season probability of at least one occurrence into a
/// per-day probability.
pub fn daily_probability(per_season: f64) -> f64 {
    if per_season <= 0.0 {
        return 0.0;
    }
    1.0 - (1.0 - per_season.min(1.0)).powf(1.0 / SEASON_DAYS)
}

pub fn generate_daily_weather(
    day: Day,
    scenario: &ClimateScenario,
    extremes: &mut ExtremeWeather,
    rng: &mut SimRng,
) -> DailyWeather {
    let date = CalendarDate::from_day(day);
    let params = *scenario.year(date.year).season(date.season);

    let temp_roll = rng.next_f64();
    let precip_roll = rng.next_f64();
    let amount_roll = rng.next_f64();

    let noise = (temp_roll * 2.0 - 1.0) * params.temp_variance;
    let mut temp_high = params.avg_high + noise;
    let mut temp_low = params.avg_low + noise;
    let precipitation = if precip_roll < params.precip_probability {
        params.avg_precip * (0.5 + amount_roll)
    } else {
        0.0
    };
    let mut et0 = (params.avg_et0 * (1.0 + noise / 50.0)).max(0.0);

    if !extremes.is_active() {
        if rng.chance(daily_probability(params.heatwave_probability)) {
            extremes.heatwave_days_left = rng.next_int(MIN_EXTREME_DAYS, MAX_EXTREME_DAYS) as u32;
            log::debug!("day={day} weather: heatwave for {} days", extremes.heatwave_days_left);
        } else if rng.chance(daily_probability(params.frost_probability)) {
            extremes.frost_days_left = rng.next_int(MIN_EXTREME_DAYS, MAX_EXTREME_DAYS) as u32;
            log::debug!("day={day} weather: frost for {} days", extremes.frost_days_left);
        }
    }

    let heatwave = extremes.heatwave_days_left > 0;
    let frost = !heatwave && extremes.frost_days_left > 0;
    if heatwave {
        temp_high += HEATWAVE_HIGH_BOOST;
        et0 *= HEATWAVE_ET_FACTOR;
        extremes.heatwave_days_left -= 1;
    } else if frost {
        temp_low = temp_low.min(FROST_LOW_CAP);
        temp_high -= FROST_HIGH_DROP;
        extremes.frost_days_left -= 1;
    }
    if temp_low > temp_high {
        temp_low = temp_high;
    }

    log::debug!(
        "day={day} weather: high={temp_high:.1} low={temp_low:.1} precip={precipitation:.2} et0={et0:.3}"
    );

    DailyWeather {
        day,
        temp_high,
        temp_low,
        precipitation,
        et0,
        heatwave,
        frost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::STARTING_DAY,
        rng::RngSlot,
    };

    #[test]
    fn daily_probability_compounds_to_season_probability() {
        let p = daily_probability(0.3);
        let season = 1.0 - (1.0 - p).powf(SEASON_DAYS);
        assert!((season - 0.3).abs() < 1e-9);
        assert_eq!(daily_probability(0.0), 0.0);
    }

    #[test]
    fn same_seed_same_weather() {
        let scenario = ClimateScenario::gradual_warming();
        let mut rng_a = SimRng::new(11, RngSlot::Weather);
        let mut rng_b = SimRng::new(11, RngSlot::Weather);
        let mut ext_a = ExtremeWeather::default();
        let mut ext_b = ExtremeWeather::default();
        for day in STARTING_DAY..STARTING_DAY + 400 {
            let a = generate_daily_weather(day, &scenario, &mut ext_a, &mut rng_a);
            let b = generate_daily_weather(day, &scenario, &mut ext_b, &mut rng_b);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn extremes_persist_three_to_five_days() {
        let mut scenario = ClimateScenario::gradual_warming();
        for year in &mut scenario.years {
            year.summer.heatwave_probability = 1.0;
        }
        let mut rng = SimRng::new(3, RngSlot::Weather);
        let mut extremes = ExtremeWeather::default();
        // July 1, year 1.
        let start = 181;
        let mut run = 0;
        let mut runs = Vec::new();
        for day in start..start + 60 {
            let w = generate_daily_weather(day, &scenario, &mut extremes, &mut rng);
            if w.heatwave {
                run += 1;
            } else if run > 0 {
                runs.push(run);
                run = 0;
            }
            if extremes.heatwave_days_left == 0 && run > 0 {
                runs.push(run);
                run = 0;
            }
        }
        assert!(!runs.is_empty());
        for r in runs {
            assert!((3..=5).contains(&r), "heatwave lasted {r} days");
        }
    }

    #[test]
    fn gdd_is_never_negative() {
        let w = DailyWeather {
            day: 0,
            temp_high: 40.0,
            temp_low: 30.0,
            precipitation: 0.0,
            et0: 0.05,
            heatwave: false,
            frost: false,
        };
        assert_eq!(w.gdd(50.0), 0.0);
        assert_eq!(w.gdd(30.0), 5.0);
    }
}
