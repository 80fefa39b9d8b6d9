//! Single-plot command rules.

use grange_core::{
    auto_pause::AutoPauseReason,
    clock::{CalendarDate, Season, SimSpeed},
    command::Command,
    config::GameConfig,
    crop_subsystem::GrowthStage,
    effect_subsystem::{ActiveEffect, EffectAxis},
    engine::SimEngine,
};

fn engine() -> SimEngine {
    SimEngine::new(GameConfig::standard(), 11)
}

fn move_to(engine: &mut SimEngine, month: u32, year: u32) {
    engine.state.day = CalendarDate {
        day_of_month: 1,
        month,
        season: Season::from_month(month),
        year,
        day_of_year: 0,
    }
    .to_day();
}

fn plant(row: usize, col: usize, crop_id: &str) -> Command {
    Command::Plant { row, col, crop_id: crop_id.into() }
}

/// Plant one plot of silage corn, let it grow, harvest it.
#[test]
fn silage_corn_plant_grow_harvest() {
    let mut engine = engine();
    assert_eq!(engine.state.economy.cash, 50_000.0);

    let result = engine.process_command(&plant(0, 0, "silage-corn"));
    assert!(result.success);
    assert_eq!(result.cost, 100.0);
    assert_eq!(engine.state.economy.cash, 49_900.0);

    // Grow until the harvest-ready pause names our plot.
    let mut ready = false;
    for _ in 0..400 {
        if engine.state.auto_pause_queue.iter().any(|p| p.reason == AutoPauseReason::HarvestReady) {
            ready = true;
            break;
        }
        if !engine.state.auto_pause_queue.is_empty() {
            engine.process_command(&Command::DismissAutoPause);
            continue;
        }
        if engine.state.speed.is_paused() {
            engine.process_command(&Command::SetSpeed { speed: SimSpeed::Normal });
        }
        engine.tick();
    }
    assert!(ready, "corn never became harvestable");
    assert_eq!(engine.state.date().year, 1, "corn should mature within its first season");

    let cash_before = engine.state.economy.cash;
    let result = engine.process_command(&Command::Harvest { row: 0, col: 0 });
    assert!(result.success, "harvest failed: {:?}", result.reason);
    assert!(result.revenue > 0.0);
    assert_eq!(result.cost, 180.0);
    assert!(
        (engine.state.economy.cash - (cash_before + result.revenue - 180.0)).abs() < 1e-9,
        "cash must move by revenue minus labor"
    );
    assert!(engine.state.cell(0, 0).unwrap().crop.is_none(), "annuals leave the plot");
}

#[test]
fn ideal_harvest_pays_full_yield() {
    let mut engine = engine();
    engine.process_command(&plant(2, 3, "silage-corn"));
    engine.state.cell_mut(2, 3).unwrap().crop.as_mut().unwrap().growth_stage = GrowthStage::Harvestable;

    let result = engine.process_command(&Command::Harvest { row: 2, col: 3 });
    assert!(result.success);
    assert_eq!(result.revenue, 25.0 * 55.0);
    assert_eq!(engine.state.economy.cash, 49_900.0 + 1_375.0 - 180.0);
}

#[test]
fn plant_rejects_occupied_plot_and_missing_cash() {
    let mut engine = engine();
    assert!(engine.process_command(&plant(0, 0, "silage-corn")).success);
    let again = engine.process_command(&plant(0, 0, "sorghum"));
    assert!(!again.success);
    assert!(again.reason.is_some());

    engine.state.economy.cash = 50.0;
    let before = engine.state.clone();
    assert!(!engine.process_command(&plant(1, 1, "silage-corn")).success);
    assert_eq!(engine.state, before, "failed command must not mutate state");
}

#[test]
fn planting_window_wraps_year_end() {
    let mut engine = engine();
    move_to(&mut engine, 1, 2);
    assert!(engine.process_command(&plant(0, 0, "almonds")).success, "Dec..Mar window includes January");
    move_to(&mut engine, 7, 2);
    assert!(!engine.process_command(&plant(0, 1, "almonds")).success);
}

#[test]
fn harvest_requires_a_ready_crop() {
    let mut engine = engine();
    assert!(!engine.process_command(&Command::Harvest { row: 0, col: 0 }).success);
    engine.process_command(&plant(0, 0, "silage-corn"));
    assert!(!engine.process_command(&Command::Harvest { row: 0, col: 0 }).success);
}

#[test]
fn water_costs_scale_with_irrigation_modifier() {
    let mut engine = engine();
    engine.process_command(&plant(0, 0, "silage-corn"));
    engine.state.active_effects.push(ActiveEffect {
        axis: EffectAxis::IrrigationCost,
        multiplier: 2.0,
        expires_on_day: engine.state.day + 10,
        source: "test".into(),
    });

    engine.state.economy.cash = 70.0;
    let result = engine.process_command(&Command::Water { row: 0, col: 0 });
    assert!(!result.success, "$80 watering must not pass with $70");

    engine.state.economy.cash = 100.0;
    let result = engine.process_command(&Command::Water { row: 0, col: 0 });
    assert!(result.success);
    assert_eq!(result.cost, 80.0);
    assert_eq!(engine.state.economy.cash, 20.0);
}

#[test]
fn water_rejected_on_empty_plot_or_under_restriction() {
    let mut engine = engine();
    assert!(!engine.process_command(&Command::Water { row: 4, col: 4 }).success);

    engine.process_command(&plant(4, 4, "silage-corn"));
    engine.state.watering_restricted = true;
    let result = engine.process_command(&Command::Water { row: 4, col: 4 });
    assert!(!result.success);
}

#[test]
fn watering_tops_up_to_capacity() {
    let mut engine = engine();
    engine.process_command(&plant(0, 0, "silage-corn"));
    engine.state.cell_mut(0, 0).unwrap().soil.moisture = 0.2;
    assert!(engine.process_command(&Command::Water { row: 0, col: 0 }).success);
    let soil = &engine.state.cell(0, 0).unwrap().soil;
    assert!((soil.moisture - 1.2).abs() < 1e-9);

    assert!(engine.process_command(&Command::Water { row: 0, col: 0 }).success);
    let soil = &engine.state.cell(0, 0).unwrap().soil;
    assert_eq!(soil.moisture, soil.moisture_capacity);
}

#[test]
fn cover_crop_rules() {
    let mut engine = engine();
    let rye = |row, col| Command::SetCoverCrop { row, col, cover_crop_id: "cereal-rye".into() };

    assert!(!engine.process_command(&rye(0, 0)).success, "spring is the wrong season");

    engine.process_command(&plant(1, 0, "silage-corn"));
    engine.process_command(&plant(2, 0, "almonds"));
    move_to(&mut engine, 2, 1);
    engine.process_command(&plant(3, 0, "citrus"));
    move_to(&mut engine, 10, 1);

    assert!(engine.process_command(&rye(0, 0)).success, "empty plot in fall");
    assert!(!engine.process_command(&rye(0, 0)).success, "already covered");
    assert!(!engine.process_command(&rye(1, 0)).success, "annual crop");
    assert!(engine.process_command(&rye(2, 0)).success, "deciduous, not dormant");
    assert!(!engine.process_command(&rye(3, 0)).success, "evergreen");

    engine.state.cell_mut(2, 1).unwrap().crop = engine.state.cell(2, 0).unwrap().crop.clone();
    engine.state.cell_mut(2, 1).unwrap().crop.as_mut().unwrap().is_dormant = true;
    assert!(!engine.process_command(&rye(2, 1)).success, "dormant orchard");
}

#[test]
fn remove_perennial_rules() {
    let mut engine = engine();
    assert!(!engine.process_command(&Command::RemovePerennial { row: 0, col: 0 }).success);

    engine.process_command(&plant(0, 0, "silage-corn"));
    assert!(!engine.process_command(&Command::RemovePerennial { row: 0, col: 0 }).success);

    engine.process_command(&plant(0, 1, "almonds"));
    engine.state.cell_mut(0, 1).unwrap().cover_crop = Some("clover-mix".into());
    let cash = engine.state.economy.cash;
    let result = engine.process_command(&Command::RemovePerennial { row: 0, col: 1 });
    assert!(result.success);
    assert_eq!(result.cost, 500.0);
    assert_eq!(engine.state.economy.cash, cash - 500.0);
    let cell = engine.state.cell(0, 1).unwrap();
    assert!(cell.crop.is_none());
    assert_eq!(cell.cover_crop.as_deref(), Some("clover-mix"), "cover crop stays");
}

#[test]
fn commands_refused_after_game_over() {
    let mut engine = engine();
    engine.state.game_over = true;
    assert!(!engine.process_command(&plant(0, 0, "silage-corn")).success);
    assert!(!engine.process_command(&Command::SetSpeed { speed: SimSpeed::Normal }).success);
    assert!(!engine.process_command(&Command::TakeLoan).success, "no loan on offer");
}

#[test]
#[should_panic(expected = "unknown crop id")]
fn unknown_crop_is_fatal() {
    let mut engine = engine();
    engine.process_command(&plant(0, 0, "kudzu"));
}

#[test]
fn planting_works_in_a_standing_cover_crop() {
    let mut engine = engine();
    move_to(&mut engine, 10, 1);
    let sown = engine.process_command(&Command::SetCoverCrop { row: 6, col: 6, cover_crop_id: "legume-vetch".into() });
    assert!(sown.success);

    move_to(&mut engine, 4, 2);
    let nitrogen = engine.state.cell(6, 6).unwrap().soil.nitrogen;
    assert!(engine.process_command(&plant(6, 6, "silage-corn")).success);
    let cell = engine.state.cell(6, 6).unwrap();
    assert!(cell.cover_crop.is_none());
    assert!((cell.soil.nitrogen - (nitrogen + 50.0)).abs() < 1e-9);
}
