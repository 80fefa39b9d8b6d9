use crate::{
    clock::Season,
    effect_subsystem::Effect,
    storylet_subsystem::{Choice, Condition, ForeshadowConfig, Storylet, StoryletKind},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Crops ──────────────────────────────────────────────────────────

/// Planting window by calendar month, inclusive. May wrap year-end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlantingWindow {
    pub start_month: u32,
    pub end_month:   u32,
}

/// Crop coefficients (kc) applied to reference ET by growth stage.
/// Harvestable and overripe crops use the mature coefficient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StageCoefficients {
    pub seedling:   f64,
    pub vegetative: f64,
    pub flowering:  f64,
    pub mature:     f64,
}

/// Perennial yield-by-age curve, measured in years since establishment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct YieldCurve {
    pub ramp_up_years: u32,
    pub peak_years:    u32,
    pub decline_years: u32,
    pub floor:         f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerennialConfig {
    pub years_to_establish:   u32,
    pub evergreen:            bool,
    pub dormant_kc:           f64,
    /// 0 for crops with no chill requirement.
    pub chill_hours_required: f64,
    pub yield_curve:          YieldCurve,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropConfig {
    pub id:                     String,
    pub name:                   String,
    /// Planting cost per one-acre cell.
    pub seed_cost:              f64,
    /// Harvest labor cost per cell.
    pub labor_cost:             f64,
    pub yield_per_acre:         f64,
    pub yield_unit:             String,
    pub price_per_unit:         f64,
    pub gdd_base_temp:          f64,
    pub gdd_to_maturity:        f64,
    pub planting_window:        PlantingWindow,
    /// Fraction of moisture capacity below which the crop is water-stressed.
    pub water_stress_threshold: f64,
    /// Nitrogen (lbs/acre) drawn from soil over a full season.
    pub nitrogen_demand:        f64,
    pub kc:                     StageCoefficients,
    #[serde(default)]
    pub perennial:              Option<PerennialConfig>,
}

impl CropConfig {
    pub fn is_perennial(&self) -> bool {
        self.perennial.is_some()
    }

    pub fn is_evergreen(&self) -> bool {
        self.perennial.as_ref().is_some_and(|p| p.evergreen)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverCropConfig {
    pub id:                    String,
    pub name:                  String,
    pub seed_cost:             f64,
    /// Nitrogen credited to the soil when incorporated in spring.
    pub nitrogen_fixation:     f64,
    /// Organic matter (%) added when incorporated.
    pub organic_matter_bonus:  f64,
    pub et_coefficient:        f64,
    /// Lower than bare soil: a winter cover shades the ground.
    pub winter_et_coefficient: f64,
}

// ── Climate scenario ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeasonWeather {
    pub avg_high:             f64,
    pub avg_low:              f64,
    pub temp_variance:        f64,
    pub precip_probability:   f64,
    pub avg_precip:           f64,
    pub avg_et0:              f64,
    /// Probability that at least one heatwave starts during the season.
    pub heatwave_probability: f64,
    pub frost_probability:    f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioYear {
    pub year:        u32,
    /// Chill hours a dormant orchard can bank over the winter.
    pub chill_hours: f64,
    pub spring:      SeasonWeather,
    pub summer:      SeasonWeather,
    pub fall:        SeasonWeather,
    pub winter:      SeasonWeather,
}

impl ScenarioYear {
    pub fn season(&self, season: Season) -> &SeasonWeather {
        match season {
            Season::Spring => &self.spring,
            Season::Summer => &self.summer,
            Season::Fall   => &self.fall,
            Season::Winter => &self.winter,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClimateScenario {
    pub id:    String,
    pub name:  String,
    pub years: Vec<ScenarioYear>,
}

impl ClimateScenario {
    /// Years past the end of the table reuse the last entry.
    pub fn year(&self, year: u32) -> &ScenarioYear {
        assert!(!self.years.is_empty(), "scenario '{}' has no years", self.id);
        let idx = (year.max(1) as usize - 1).min(self.years.len() - 1);
        &self.years[idx]
    }

    /// Thirty years of Central-Valley-like weather drifting warmer:
    /// hotter summers, more heatwaves, fewer winter chill hours.
    pub fn gradual_warming() -> Self {
        let years = (1..=30)
            .map(|year| {
                let t = f64::from(year - 1) / 29.0;
                ScenarioYear {
                    year,
                    chill_hours: 800.0 - 300.0 * t,
                    spring: SeasonWeather {
                        avg_high: 72.0 + 2.0 * t,
                        avg_low: 48.0 + 1.5 * t,
                        temp_variance: 8.0,
                        precip_probability: 0.15,
                        avg_precip: 0.4,
                        avg_et0: 0.18,
                        heatwave_probability: 0.05 + 0.10 * t,
                        frost_probability: 0.10 - 0.05 * t,
                    },
                    summer: SeasonWeather {
                        avg_high: 92.0 + 4.0 * t,
                        avg_low: 60.0 + 3.0 * t,
                        temp_variance: 6.0,
                        precip_probability: 0.02,
                        avg_precip: 0.2,
                        avg_et0: 0.28 + 0.03 * t,
                        heatwave_probability: 0.30 + 0.40 * t,
                        frost_probability: 0.0,
                    },
                    fall: SeasonWeather {
                        avg_high: 75.0 + 2.0 * t,
                        avg_low: 50.0 + 1.5 * t,
                        temp_variance: 8.0,
                        precip_probability: 0.10,
                        avg_precip: 0.4,
                        avg_et0: 0.14,
                        heatwave_probability: 0.05 + 0.10 * t,
                        frost_probability: 0.05,
                    },
                    winter: SeasonWeather {
                        avg_high: 56.0 + 1.5 * t,
                        avg_low: 38.0 + 1.5 * t,
                        temp_variance: 7.0,
                        precip_probability: 0.30 - 0.05 * t,
                        avg_precip: 0.5,
                        avg_et0: 0.05,
                        heatwave_probability: 0.0,
                        frost_probability: 0.50 - 0.20 * t,
                    },
                }
            })
            .collect();

        Self {
            id: "gradual-warming".into(),
            name: "Gradual Warming".into(),
            years,
        }
    }
}

// ── Economy constants ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomyConfig {
    pub starting_cash:           f64,
    pub irrigation_cost:         f64,
    pub irrigation_inches:       f64,
    pub removal_cost:            f64,
    pub annual_overhead:         f64,
    pub loan_interest_rate:      f64,
    pub max_loans:               u32,
    pub min_loan:                f64,
    pub loan_buffer:             f64,
    pub victory_year:            u32,
    pub starting_nitrogen:       f64,
    pub starting_organic_matter: f64,
    pub starting_moisture:       f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_cash:           50_000.0,
            irrigation_cost:         40.0,
            irrigation_inches:       1.0,
            removal_cost:            500.0,
            annual_overhead:         2_000.0,
            loan_interest_rate:      0.07,
            max_loans:               1,
            min_loan:                10_000.0,
            loan_buffer:             5_000.0,
            victory_year:            30,
            starting_nitrogen:       100.0,
            starting_organic_matter: 2.0,
            starting_moisture:       1.2,
        }
    }
}

// ── Loader ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct CropsFile {
    crops: Vec<CropConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct CoverCropsFile {
    cover_crops: Vec<CoverCropConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct StoryletsFile {
    storylets: Vec<Storylet>,
}

/// Content tables plus economy constants.
///
/// Lookups by id are total: an unknown id is a content bug and panics.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub crops:       BTreeMap<String, CropConfig>,
    pub cover_crops: BTreeMap<String, CoverCropConfig>,
    /// Array order is the evaluation order and the selection tie-break.
    pub storylets:   Vec<Storylet>,
    pub scenario:    ClimateScenario,
    pub economy:     EconomyConfig,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))
}

impl GameConfig {
    /// Load from a content directory.
    /// In tests, use GameConfig::standard().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let crops: CropsFile = read_json(&format!("{data_dir}/crops.json"))?;
        let cover: CoverCropsFile = read_json(&format!("{data_dir}/cover_crops.json"))?;
        let storylets: StoryletsFile = read_json(&format!("{data_dir}/storylets.json"))?;
        let scenario: ClimateScenario = read_json(&format!("{data_dir}/scenario.json"))?;
        let economy: EconomyConfig = read_json(&format!("{data_dir}/economy.json"))?;

        let config = Self {
            crops: crops.crops.into_iter().map(|c| (c.id.clone(), c)).collect(),
            cover_crops: cover.cover_crops.into_iter().map(|c| (c.id.clone(), c)).collect(),
            storylets: storylets.storylets,
            scenario,
            economy,
        };
        log::info!(
            "content loaded from {data_dir}: {} crops, {} cover crops, {} storylets, scenario '{}'",
            config.crops.len(),
            config.cover_crops.len(),
            config.storylets.len(),
            config.scenario.id
        );
        Ok(config)
    }

    /// Write every table in the layout `load` reads.
    pub fn write_dir(&self, data_dir: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let crops: Vec<&CropConfig> = self.crops.values().collect();
        let cover: Vec<&CoverCropConfig> = self.cover_crops.values().collect();
        std::fs::write(
            format!("{data_dir}/crops.json"),
            serde_json::to_string_pretty(&serde_json::json!({ "crops": crops }))?,
        )?;
        std::fs::write(
            format!("{data_dir}/cover_crops.json"),
            serde_json::to_string_pretty(&serde_json::json!({ "cover_crops": cover }))?,
        )?;
        std::fs::write(
            format!("{data_dir}/storylets.json"),
            serde_json::to_string_pretty(&serde_json::json!({ "storylets": self.storylets }))?,
        )?;
        std::fs::write(
            format!("{data_dir}/scenario.json"),
            serde_json::to_string_pretty(&self.scenario)?,
        )?;
        std::fs::write(
            format!("{data_dir}/economy.json"),
            serde_json::to_string_pretty(&self.economy)?,
        )?;
        Ok(())
    }

    pub fn crop(&self, id: &str) -> &CropConfig {
        self.crops
            .get(id)
            .unwrap_or_else(|| panic!("unknown crop id '{id}'"))
    }

    pub fn cover_crop(&self, id: &str) -> &CoverCropConfig {
        self.cover_crops
            .get(id)
            .unwrap_or_else(|| panic!("unknown cover crop id '{id}'"))
    }

    pub fn storylet(&self, id: &str) -> &Storylet {
        self.storylets
            .iter()
            .find(|s| s.id == id)
            .unwrap_or_else(|| panic!("unknown storylet id '{id}'"))
    }

    /// The built-in content set.
    pub fn standard() -> Self {
        let crops = standard_crops()
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        let cover_crops = standard_cover_crops()
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        Self {
            crops,
            cover_crops,
            storylets: standard_storylets(),
            scenario: ClimateScenario::gradual_warming(),
            economy: EconomyConfig::default(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn annual(
    id: &str,
    name: &str,
    costs: (f64, f64),
    yield_per_acre: f64,
    yield_unit: &str,
    price_per_unit: f64,
    gdd: (f64, f64),
    window: (u32, u32),
    nitrogen_demand: f64,
    kc: [f64; 4],
) -> CropConfig {
    CropConfig {
        id: id.into(),
        name: name.into(),
        seed_cost: costs.0,
        labor_cost: costs.1,
        yield_per_acre,
        yield_unit: yield_unit.into(),
        price_per_unit,
        gdd_base_temp: gdd.0,
        gdd_to_maturity: gdd.1,
        planting_window: PlantingWindow { start_month: window.0, end_month: window.1 },
        water_stress_threshold: 0.25,
        nitrogen_demand,
        kc: StageCoefficients {
            seedling: kc[0],
            vegetative: kc[1],
            flowering: kc[2],
            mature: kc[3],
        },
        perennial: None,
    }
}

fn standard_crops() -> Vec<CropConfig> {
    let mut almonds = annual(
        "almonds", "Almonds", (1_200.0, 700.0), 2_000.0, "lbs", 2.8,
        (50.0, 3_000.0), (12, 3), 120.0, [0.5, 0.85, 1.05, 0.9],
    );
    almonds.water_stress_threshold = 0.3;
    almonds.perennial = Some(PerennialConfig {
        years_to_establish: 3,
        evergreen: false,
        dormant_kc: 0.25,
        chill_hours_required: 700.0,
        yield_curve: YieldCurve { ramp_up_years: 4, peak_years: 12, decline_years: 8, floor: 0.5 },
    });

    let mut pistachios = annual(
        "pistachios", "Pistachios", (1_500.0, 800.0), 2_500.0, "lbs", 3.2,
        (50.0, 3_300.0), (12, 3), 110.0, [0.45, 0.8, 1.1, 0.9],
    );
    pistachios.water_stress_threshold = 0.2;
    pistachios.perennial = Some(PerennialConfig {
        years_to_establish: 5,
        evergreen: false,
        dormant_kc: 0.2,
        chill_hours_required: 900.0,
        yield_curve: YieldCurve { ramp_up_years: 5, peak_years: 15, decline_years: 10, floor: 0.55 },
    });

    let mut citrus = annual(
        "citrus", "Navel Oranges", (1_000.0, 900.0), 12.0, "tons", 450.0,
        (55.0, 2_600.0), (2, 5), 100.0, [0.5, 0.7, 0.75, 0.7],
    );
    citrus.perennial = Some(PerennialConfig {
        years_to_establish: 3,
        evergreen: true,
        dormant_kc: 0.6,
        chill_hours_required: 0.0,
        yield_curve: YieldCurve { ramp_up_years: 3, peak_years: 20, decline_years: 10, floor: 0.6 },
    });

    vec![
        annual(
            "silage-corn", "Silage Corn", (100.0, 180.0), 25.0, "tons", 55.0,
            (50.0, 2_400.0), (3, 6), 180.0, [0.4, 0.8, 1.15, 0.9],
        ),
        annual(
            "processing-tomatoes", "Processing Tomatoes", (450.0, 600.0), 40.0, "tons", 80.0,
            (50.0, 2_000.0), (3, 5), 150.0, [0.45, 0.75, 1.1, 0.85],
        ),
        annual(
            "sorghum", "Sorghum", (60.0, 120.0), 20.0, "tons", 40.0,
            (50.0, 2_200.0), (4, 6), 90.0, [0.35, 0.7, 1.0, 0.75],
        ),
        annual(
            "winter-wheat", "Winter Wheat", (80.0, 110.0), 3.0, "tons", 250.0,
            (32.0, 3_000.0), (10, 12), 100.0, [0.4, 0.7, 1.1, 0.6],
        ),
        almonds,
        pistachios,
        citrus,
    ]
}

fn standard_cover_crops() -> Vec<CoverCropConfig> {
    vec![
        CoverCropConfig {
            id: "legume-vetch".into(),
            name: "Hairy Vetch".into(),
            seed_cost: 60.0,
            nitrogen_fixation: 50.0,
            organic_matter_bonus: 0.08,
            et_coefficient: 0.5,
            winter_et_coefficient: 0.15,
        },
        CoverCropConfig {
            id: "cereal-rye".into(),
            name: "Cereal Rye".into(),
            seed_cost: 45.0,
            nitrogen_fixation: 10.0,
            organic_matter_bonus: 0.15,
            et_coefficient: 0.5,
            winter_et_coefficient: 0.12,
        },
        CoverCropConfig {
            id: "clover-mix".into(),
            name: "Clover Mix".into(),
            seed_cost: 70.0,
            nitrogen_fixation: 40.0,
            organic_matter_bonus: 0.1,
            et_coefficient: 0.55,
            winter_et_coefficient: 0.18,
        },
    ]
}

fn choice(id: &str, label: &str, cost: Option<f64>, effects: Vec<Effect>) -> Choice {
    Choice {
        id: id.into(),
        label: label.into(),
        cost,
        effects,
    }
}

fn standard_storylets() -> Vec<Storylet> {
    vec![
        Storylet {
            id: "bank-letter".into(),
            kind: StoryletKind::Advisor,
            title: "A Letter from the Bank".into(),
            description: "Your loan officer has noticed the account is running thin.".into(),
            preconditions: vec![Condition::CashBelow { amount: 5_000.0 }],
            priority: 100,
            cooldown_days: 365,
            max_occurrences: None,
            foreshadowing: None,
            choices: vec![choice("acknowledge", "Noted.", None, vec![])],
        },
        Storylet {
            id: "water-district-restriction".into(),
            kind: StoryletKind::Event,
            title: "Water District Curtailment".into(),
            description: "The district is cutting surface-water deliveries for the rest of the month.".into(),
            preconditions: vec![
                Condition::SeasonIs { seasons: vec![Season::Summer] },
                Condition::YearAtLeast { year: 2 },
                Condition::Random { probability: 0.03 },
            ],
            priority: 60,
            cooldown_days: 120,
            max_occurrences: None,
            foreshadowing: Some(ForeshadowConfig {
                signal: "Reservoir levels are being discussed at the district board meeting.".into(),
                days_before_event: 7,
                reliability: 0.8,
            }),
            choices: vec![
                choice(
                    "comply",
                    "Comply with the curtailment.",
                    None,
                    vec![Effect::WateringRestriction { duration_days: 30 }],
                ),
                choice(
                    "buy-rights",
                    "Buy groundwater rights from a neighbor.",
                    Some(3_000.0),
                    vec![Effect::ModifyCash { amount: -3_000.0 }],
                ),
            ],
        },
        Storylet {
            id: "heat-advisory".into(),
            kind: StoryletKind::Advisor,
            title: "Extension Office: Heat Advisory".into(),
            description: "Soils are drying fast. Consider irrigating before the afternoon heat.".into(),
            preconditions: vec![
                Condition::SeasonIs { seasons: vec![Season::Summer] },
                Condition::AvgMoistureBelow { inches: 0.8 },
                Condition::Random { probability: 0.05 },
            ],
            priority: 40,
            cooldown_days: 30,
            max_occurrences: None,
            foreshadowing: None,
            choices: vec![choice("acknowledge", "Thanks for the heads-up.", None, vec![])],
        },
        Storylet {
            id: "commodity-price-spike".into(),
            kind: StoryletKind::Event,
            title: "Commodity Prices Jump".into(),
            description: "A poor harvest overseas has buyers paying a premium.".into(),
            preconditions: vec![
                Condition::YearAtLeast { year: 2 },
                Condition::Random { probability: 0.01 },
            ],
            priority: 30,
            cooldown_days: 180,
            max_occurrences: None,
            foreshadowing: None,
            choices: vec![choice(
                "sell-forward",
                "Lock in the better prices.",
                None,
                vec![Effect::PriceModifier { multiplier: 1.25, duration_days: 60 }],
            )],
        },
        Storylet {
            id: "soil-health-workshop".into(),
            kind: StoryletKind::Advisor,
            title: "Soil Health Workshop".into(),
            description: "The county is hosting a workshop on building organic matter.".into(),
            preconditions: vec![
                Condition::AvgOrganicMatterBelow { percent: 1.8 },
                Condition::FlagNotSet { flag: "attended_soil_workshop".into() },
            ],
            priority: 50,
            cooldown_days: 0,
            max_occurrences: Some(1),
            foreshadowing: None,
            choices: vec![
                choice(
                    "attend",
                    "Attend and try their compost program.",
                    Some(200.0),
                    vec![
                        Effect::ModifyCash { amount: -200.0 },
                        Effect::ModifyOrganicMatter { amount: 0.1 },
                        Effect::SetFlag { flag: "attended_soil_workshop".into(), value: true },
                    ],
                ),
                choice("skip", "Too busy this year.", None, vec![]),
            ],
        },
        Storylet {
            id: "drip-irrigation-offer".into(),
            kind: StoryletKind::Event,
            title: "Drip Irrigation Cost-Share".into(),
            description: "A conservation program will split the cost of a drip system.".into(),
            preconditions: vec![
                Condition::YearAtLeast { year: 3 },
                Condition::FlagNotSet { flag: "drip_installed".into() },
                Condition::Random { probability: 0.01 },
            ],
            priority: 45,
            cooldown_days: 365,
            max_occurrences: None,
            foreshadowing: None,
            choices: vec![
                choice(
                    "install",
                    "Install drip lines.",
                    Some(8_000.0),
                    vec![
                        Effect::ModifyCash { amount: -8_000.0 },
                        Effect::IrrigationCostModifier { multiplier: 0.6, duration_days: 3_650 },
                        Effect::SetFlag { flag: "drip_installed".into(), value: true },
                    ],
                ),
                choice("decline", "Not this year.", None, vec![]),
            ],
        },
        Storylet {
            id: "wildfire-smoke".into(),
            kind: StoryletKind::Event,
            title: "Wildfire Smoke".into(),
            description: "Smoke from fires in the foothills is blanketing the valley.".into(),
            preconditions: vec![
                Condition::SeasonIs { seasons: vec![Season::Summer, Season::Fall] },
                Condition::YearAtLeast { year: 5 },
                Condition::Random { probability: 0.01 },
            ],
            priority: 55,
            cooldown_days: 200,
            max_occurrences: None,
            foreshadowing: Some(ForeshadowConfig {
                signal: "Red-flag warnings are posted for the foothills.".into(),
                days_before_event: 5,
                reliability: 0.5,
            }),
            choices: vec![choice(
                "endure",
                "Wait it out.",
                None,
                vec![Effect::YieldModifier { multiplier: 0.85, duration_days: 60 }],
            )],
        },
        Storylet {
            id: "cover-crop-grant".into(),
            kind: StoryletKind::Advisor,
            title: "Cover Crop Grant".into(),
            description: "The conservation district pays a small stipend for cover cropping.".into(),
            preconditions: vec![
                Condition::SeasonIs { seasons: vec![Season::Fall] },
                Condition::HasEmptyCell,
                Condition::Random { probability: 0.02 },
            ],
            priority: 35,
            cooldown_days: 365,
            max_occurrences: Some(5),
            foreshadowing: None,
            choices: vec![choice(
                "accept",
                "Sign up.",
                None,
                vec![
                    Effect::ModifyCash { amount: 500.0 },
                    Effect::Notify { message: "Grant deposited. Get those cover crops in.".into() },
                ],
            )],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_content_is_consistent() {
        let config = GameConfig::standard();
        assert_eq!(config.crop("silage-corn").seed_cost, 100.0);
        assert_eq!(config.crop("almonds").perennial.as_ref().unwrap().chill_hours_required, 700.0);
        assert!(config.crop("citrus").is_evergreen());
        assert_eq!(config.scenario.years.len(), 30);
        for storylet in &config.storylets {
            assert!(!storylet.choices.is_empty(), "{} has no choices", storylet.id);
        }
    }

    #[test]
    #[should_panic(expected = "unknown crop id")]
    fn unknown_crop_panics() {
        GameConfig::standard().crop("kudzu");
    }

    #[test]
    fn scenario_years_past_end_reuse_last() {
        let scenario = ClimateScenario::gradual_warming();
        assert_eq!(scenario.year(31).year, 30);
        assert_eq!(scenario.year(1).year, 1);
    }
}
