//! Command processor: validates one player command and applies it.
//!
//! RULE: Validate first, mutate second. A rejected command leaves the
//!       GameState untouched.
//! RULE: Field-wide bulk actions commit whole rows only. When the field
//!       cannot be fully funded the command fails with a PartialOffer for
//!       the largest affordable top-to-bottom row prefix; the caller
//!       confirms it by re-issuing the command with `limit_rows`.
//! RULE: Row and column bulk actions are all-or-nothing, no offer.

use crate::{
    auto_pause::{add_auto_pause, remove_reasons, AutoPauseReason},
    clock::{month_in_window, Season, SimSpeed},
    command::{BulkScope, Command, CommandResult, PartialOffer},
    config::GameConfig,
    crop_subsystem::{compute_harvest, CropInstance},
    effect_subsystem::{apply_effects, modifier, EffectAxis},
    event::{SimEvent, DISMISSED_CHOICE},
    soil_subsystem::incorporate_cover_crop,
    state::{Cell, GameOverReason, GameState},
    storylet_subsystem::record_occurrence,
    types::{GRID_COLS, GRID_ROWS},
};

/// Ok and Err both carry the result; Err short-circuits with `?`.
type Outcome = Result<CommandResult, CommandResult>;

fn reject<T>(reason: impl Into<String>) -> Result<T, CommandResult> {
    Err(CommandResult::fail(reason))
}

/// Apply `command` to `state`. Never panics on player error; unknown
/// content ids are data bugs and do panic.
pub fn process_command(state: &mut GameState, config: &GameConfig, command: &Command) -> CommandResult {
    let outcome = dispatch(state, config, command);
    let result = match outcome {
        Ok(result) | Err(result) => result,
    };
    match &result.reason {
        None => log::debug!(
            "day={} command: {} ok (cells={}, cost={:.2}, revenue={:.2})",
            state.day,
            command.name(),
            result.cells_affected,
            result.cost,
            result.revenue
        ),
        Some(reason) => log::warn!("day={} command: {} rejected: {reason}", state.day, command.name()),
    }
    result
}

fn dispatch(state: &mut GameState, config: &GameConfig, command: &Command) -> Outcome {
    if state.game_over && !matches!(command, Command::TakeLoan | Command::DismissAutoPause) {
        return reject("The game is over.");
    }

    match command {
        Command::Plant { row, col, crop_id } => plant(state, config, *row, *col, crop_id),
        Command::Harvest { row, col } => harvest(state, config, *row, *col),
        Command::Water { row, col } => water(state, config, *row, *col),
        Command::SetCoverCrop { row, col, cover_crop_id } => {
            set_cover_crop(state, config, *row, *col, cover_crop_id)
        }
        Command::RemovePerennial { row, col } => remove_perennial(state, config, *row, *col),
        Command::BulkPlant { scope, crop_id, limit_rows } => {
            bulk_plant(state, config, *scope, crop_id, *limit_rows)
        }
        Command::BulkHarvest { scope } => bulk_harvest(state, config, *scope),
        Command::BulkWater { scope, limit_rows } => bulk_water(state, config, *scope, *limit_rows),
        Command::BulkCoverCrop { scope, cover_crop_id, limit_rows } => {
            bulk_cover_crop(state, config, *scope, cover_crop_id, *limit_rows)
        }
        Command::SetSpeed { speed } => set_speed(state, *speed),
        Command::RespondToEvent { choice_id } => respond_to_event(state, config, choice_id),
        Command::TakeLoan => take_loan(state, config),
        Command::DismissAutoPause => dismiss_auto_pause(state),
    }
}

// ── Validators ─────────────────────────────────────────────────────

fn cell_at(state: &GameState, row: usize, col: usize) -> Result<&Cell, CommandResult> {
    match state.cell(row, col) {
        Some(cell) => Ok(cell),
        None => reject(format!("Plot ({row}, {col}) is outside the field.")),
    }
}

fn require_cash(state: &GameState, cost: f64) -> Result<(), CommandResult> {
    if state.economy.can_afford(cost) {
        Ok(())
    } else {
        reject(format!(
            "Insufficient funds: need ${cost:.2}, have ${:.2}.",
            state.economy.cash
        ))
    }
}

fn check_planting_window(state: &GameState, config: &GameConfig, crop_id: &str) -> Result<(), CommandResult> {
    let def = config.crop(crop_id);
    let month = state.date().month;
    let window = &def.planting_window;
    if month_in_window(month, window.start_month, window.end_month) {
        Ok(())
    } else {
        reject(format!(
            "{} can only be planted in months {}-{}.",
            def.name, window.start_month, window.end_month
        ))
    }
}

fn check_harvestable(cell: &Cell, config: &GameConfig) -> Result<(), CommandResult> {
    let Some(crop) = &cell.crop else {
        return reject(format!("Plot ({}, {}) has nothing to harvest.", cell.row, cell.col));
    };
    if config.crop(&crop.crop_id).is_perennial() && crop.harvested_this_season {
        return reject(format!("Plot ({}, {}) was already harvested this season.", cell.row, cell.col));
    }
    if !crop.growth_stage.is_harvestable() {
        return reject(format!("The crop at ({}, {}) is not ready to harvest.", cell.row, cell.col));
    }
    Ok(())
}

/// Whether a cover crop may go in on this cell. Season is checked by
/// the caller.
fn cover_crop_eligible(cell: &Cell, config: &GameConfig) -> Result<(), CommandResult> {
    if cell.cover_crop.is_some() {
        return reject(format!("Plot ({}, {}) already has a cover crop.", cell.row, cell.col));
    }
    match &cell.crop {
        None => Ok(()),
        Some(crop) => {
            let def = config.crop(&crop.crop_id);
            if def.is_evergreen() {
                reject(format!("{} keeps its canopy all year; no cover crop underneath.", def.name))
            } else if !def.is_perennial() {
                reject(format!("Plot ({}, {}) holds an annual crop.", cell.row, cell.col))
            } else if crop.is_dormant {
                reject(format!("The {} at ({}, {}) is already dormant.", def.name, cell.row, cell.col))
            } else {
                Ok(())
            }
        }
    }
}

fn require_fall(state: &GameState) -> Result<(), CommandResult> {
    if state.date().season == Season::Fall {
        Ok(())
    } else {
        reject("Cover crops can only be sown in fall.")
    }
}

fn require_no_restriction(state: &GameState) -> Result<(), CommandResult> {
    if state.watering_restricted {
        reject("Watering is restricted by the water district.")
    } else {
        Ok(())
    }
}

fn irrigation_cost(state: &GameState, config: &GameConfig) -> f64 {
    config.economy.irrigation_cost * modifier(state, EffectAxis::IrrigationCost)
}

// ── Mutators (no validation) ───────────────────────────────────────

fn do_plant(state: &mut GameState, config: &GameConfig, row: usize, col: usize, crop_id: &str) {
    let def = config.crop(crop_id);
    let day = state.day;
    state.economy.record_expense(def.seed_cost);
    let Some(cell) = state.cell_mut(row, col) else {
        return;
    };
    // A standing cover crop is worked in before seeding.
    let incorporated = incorporate_cover_crop(cell, config);
    cell.crop = Some(CropInstance::new(def, day));
    if let Some(event) = incorporated {
        state.notify(event);
    }
}

/// Returns (gross revenue, labor cost).
fn do_harvest(state: &mut GameState, config: &GameConfig, row: usize, col: usize) -> (f64, f64) {
    let yield_mod = modifier(state, EffectAxis::Yield);
    let price_mod = modifier(state, EffectAxis::Price);
    let today = state.day;
    let Some(cell) = state.cell_mut(row, col) else {
        return (0.0, 0.0);
    };
    let harvest = compute_harvest(cell, config, today, yield_mod, price_mod);
    let perennial = cell
        .crop
        .as_ref()
        .is_some_and(|c| config.crop(&c.crop_id).is_perennial());
    if perennial {
        if let Some(crop) = cell.crop.as_mut() {
            crop.finish_season();
        }
    } else {
        cell.crop = None;
    }
    log::debug!(
        "day={today} harvest: ({row}, {col}) {:.1} units for ${:.2}",
        harvest.units,
        harvest.gross_revenue
    );
    state.economy.record_revenue(harvest.gross_revenue);
    state.economy.record_expense(harvest.labor_cost);
    (harvest.gross_revenue, harvest.labor_cost)
}

fn do_water(state: &mut GameState, config: &GameConfig, row: usize, col: usize, cost: f64) {
    state.economy.record_expense(cost);
    if let Some(cell) = state.cell_mut(row, col) {
        cell.soil.add_moisture(config.economy.irrigation_inches);
    }
}

fn do_cover_crop(state: &mut GameState, config: &GameConfig, row: usize, col: usize, cover_crop_id: &str) {
    state.economy.record_expense(config.cover_crop(cover_crop_id).seed_cost);
    if let Some(cell) = state.cell_mut(row, col) {
        cell.cover_crop = Some(cover_crop_id.to_string());
    }
}

fn crop_name(cell: &Cell) -> &str {
    cell.crop.as_ref().map_or("nothing", |c| c.crop_id.as_str())
}

// ── Single-plot commands ───────────────────────────────────────────

fn plant(state: &mut GameState, config: &GameConfig, row: usize, col: usize, crop_id: &str) -> Outcome {
    let def = config.crop(crop_id);
    if !cell_at(state, row, col)?.is_empty() {
        return reject(format!("Plot ({row}, {col}) is already planted."));
    }
    check_planting_window(state, config, crop_id)?;
    require_cash(state, def.seed_cost)?;

    do_plant(state, config, row, col, crop_id);
    Ok(CommandResult::ok().with_cost(def.seed_cost).with_cells(1))
}

fn harvest(state: &mut GameState, config: &GameConfig, row: usize, col: usize) -> Outcome {
    check_harvestable(cell_at(state, row, col)?, config)?;
    let (revenue, cost) = do_harvest(state, config, row, col);
    Ok(CommandResult::ok().with_revenue(revenue).with_cost(cost).with_cells(1))
}

fn water(state: &mut GameState, config: &GameConfig, row: usize, col: usize) -> Outcome {
    require_no_restriction(state)?;
    if cell_at(state, row, col)?.is_empty() {
        return reject(format!("Plot ({row}, {col}) has no crop to water."));
    }
    let cost = irrigation_cost(state, config);
    require_cash(state, cost)?;

    do_water(state, config, row, col, cost);
    Ok(CommandResult::ok().with_cost(cost).with_cells(1))
}

fn set_cover_crop(
    state: &mut GameState,
    config: &GameConfig,
    row: usize,
    col: usize,
    cover_crop_id: &str,
) -> Outcome {
    let cost = config.cover_crop(cover_crop_id).seed_cost;
    require_fall(state)?;
    cover_crop_eligible(cell_at(state, row, col)?, config)?;
    require_cash(state, cost)?;

    do_cover_crop(state, config, row, col, cover_crop_id);
    Ok(CommandResult::ok().with_cost(cost).with_cells(1))
}

fn remove_perennial(state: &mut GameState, config: &GameConfig, row: usize, col: usize) -> Outcome {
    let Some(crop) = &cell_at(state, row, col)?.crop else {
        return reject(format!("Plot ({row}, {col}) is empty."));
    };
    if !config.crop(&crop.crop_id).is_perennial() {
        return reject("Annual crops are harvested, not removed.");
    }
    let cost = config.economy.removal_cost;
    require_cash(state, cost)?;

    state.economy.record_expense(cost);
    let day = state.day;
    if let Some(cell) = state.cell_mut(row, col) {
        log::info!("day={day} command: removed {} at ({row}, {col})", crop_name(cell));
        cell.crop = None;
    }
    Ok(CommandResult::ok().with_cost(cost).with_cells(1))
}

// ── Bulk planning ──────────────────────────────────────────────────

/// One row's worth of eligible cells.
#[derive(Debug)]
struct RowUnit {
    cells: Vec<(usize, usize)>,
    cost:  f64,
}

impl RowUnit {
    fn new(cells: Vec<(usize, usize)>, unit_cost: f64) -> Self {
        let cost = cells.len() as f64 * unit_cost;
        Self { cells, cost }
    }
}

/// Group the eligible cells of the whole field by row, skipping rows
/// with nothing eligible.
fn field_rows(state: &GameState, unit_cost: f64, eligible: impl Fn(&Cell) -> bool) -> Vec<RowUnit> {
    state
        .grid
        .iter()
        .map(|row| {
            row.iter()
                .filter(|&c| eligible(c))
                .map(|c| (c.row, c.col))
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .map(|cells| RowUnit::new(cells, unit_cost))
        .collect()
}

/// Decide which rows a field-wide action commits.
fn plan_rows(units: Vec<RowUnit>, cash: f64, limit_rows: Option<usize>) -> Result<Vec<RowUnit>, CommandResult> {
    if units.is_empty() {
        return reject("No eligible plots in the field.");
    }

    if let Some(limit) = limit_rows {
        if limit == 0 || limit > units.len() {
            return reject(format!("Cannot commit {limit} rows; {} are eligible.", units.len()));
        }
        let chosen: Vec<RowUnit> = units.into_iter().take(limit).collect();
        let cost: f64 = chosen.iter().map(|u| u.cost).sum();
        if cash < cost {
            return reject(format!("Insufficient funds for {limit} rows: need ${cost:.2}, have ${cash:.2}."));
        }
        return Ok(chosen);
    }

    let total: f64 = units.iter().map(|u| u.cost).sum();
    if cash >= total {
        return Ok(units);
    }

    let mut offer = PartialOffer { affordable_rows: 0, affordable_plots: 0, total_cost: 0.0 };
    for unit in &units {
        if offer.total_cost + unit.cost > cash {
            break;
        }
        offer.affordable_rows += 1;
        offer.affordable_plots += unit.cells.len();
        offer.total_cost += unit.cost;
    }

    let reason = format!("Insufficient funds: the full field costs ${total:.2}, you have ${cash:.2}.");
    if offer.affordable_rows == 0 {
        return reject(reason);
    }
    Err(CommandResult::fail(reason).with_offer(offer))
}

/// Cells covered by a row or column scope. `All` is handled by the
/// row planner instead.
fn line_cells(scope: BulkScope) -> Result<Vec<(usize, usize)>, CommandResult> {
    match scope {
        BulkScope::Row { row } if row < GRID_ROWS => Ok((0..GRID_COLS).map(|c| (row, c)).collect()),
        BulkScope::Col { col } if col < GRID_COLS => Ok((0..GRID_ROWS).map(|r| (r, col)).collect()),
        BulkScope::Row { row } => reject(format!("Row {row} is outside the field.")),
        BulkScope::Col { col } => reject(format!("Column {col} is outside the field.")),
        BulkScope::All => Ok(all_cells()),
    }
}

fn all_cells() -> Vec<(usize, usize)> {
    (0..GRID_ROWS)
        .flat_map(|r| (0..GRID_COLS).map(move |c| (r, c)))
        .collect()
}

/// Resolve a bulk action's target cells and total cost.
fn plan_bulk(
    state: &GameState,
    scope: BulkScope,
    limit_rows: Option<usize>,
    unit_cost: f64,
    eligible: impl Fn(&Cell) -> bool,
) -> Result<(Vec<(usize, usize)>, f64), CommandResult> {
    if scope == BulkScope::All {
        let rows = plan_rows(field_rows(state, unit_cost, eligible), state.economy.cash, limit_rows)?;
        let cost = rows.iter().map(|u| u.cost).sum();
        let cells = rows.into_iter().flat_map(|u| u.cells).collect();
        return Ok((cells, cost));
    }

    if limit_rows.is_some() {
        return reject("A row limit only applies to field-wide actions.");
    }
    let cells: Vec<(usize, usize)> = line_cells(scope)?
        .into_iter()
        .filter(|&(r, c)| state.cell(r, c).is_some_and(&eligible))
        .collect();
    if cells.is_empty() {
        return reject("No eligible plots in that line.");
    }
    let cost = cells.len() as f64 * unit_cost;
    require_cash(state, cost)?;
    Ok((cells, cost))
}

// ── Bulk commands ──────────────────────────────────────────────────

fn bulk_plant(
    state: &mut GameState,
    config: &GameConfig,
    scope: BulkScope,
    crop_id: &str,
    limit_rows: Option<usize>,
) -> Outcome {
    let def = config.crop(crop_id);
    check_planting_window(state, config, crop_id)?;

    let (cells, cost) = if scope == BulkScope::All {
        // Only rows that are completely empty count.
        let units: Vec<RowUnit> = state
            .grid
            .iter()
            .filter(|row| row.iter().all(Cell::is_empty))
            .map(|row| RowUnit::new(row.iter().map(|c| (c.row, c.col)).collect(), def.seed_cost))
            .collect();
        if units.is_empty() {
            return reject("No fully empty rows to plant.");
        }
        let rows = plan_rows(units, state.economy.cash, limit_rows)?;
        let cost: f64 = rows.iter().map(|u| u.cost).sum();
        (rows.into_iter().flat_map(|u| u.cells).collect::<Vec<_>>(), cost)
    } else {
        plan_bulk(state, scope, limit_rows, def.seed_cost, Cell::is_empty)?
    };

    for &(r, c) in &cells {
        do_plant(state, config, r, c, crop_id);
    }
    Ok(CommandResult::ok().with_cost(cost).with_cells(cells.len()))
}

fn bulk_harvest(state: &mut GameState, config: &GameConfig, scope: BulkScope) -> Outcome {
    let cells: Vec<(usize, usize)> = line_cells(scope)?
        .into_iter()
        .filter(|&(r, c)| {
            state
                .cell(r, c)
                .is_some_and(|cell| check_harvestable(cell, config).is_ok())
        })
        .collect();
    if cells.is_empty() {
        return reject("Nothing is ready to harvest.");
    }

    let (mut revenue, mut cost) = (0.0, 0.0);
    for &(r, c) in &cells {
        let (rev, labor) = do_harvest(state, config, r, c);
        revenue += rev;
        cost += labor;
    }
    Ok(CommandResult::ok().with_revenue(revenue).with_cost(cost).with_cells(cells.len()))
}

fn bulk_water(state: &mut GameState, config: &GameConfig, scope: BulkScope, limit_rows: Option<usize>) -> Outcome {
    require_no_restriction(state)?;
    let unit_cost = irrigation_cost(state, config);
    let (cells, cost) = plan_bulk(state, scope, limit_rows, unit_cost, |c| !c.is_empty())?;

    for &(r, c) in &cells {
        do_water(state, config, r, c, unit_cost);
    }
    Ok(CommandResult::ok().with_cost(cost).with_cells(cells.len()))
}

fn bulk_cover_crop(
    state: &mut GameState,
    config: &GameConfig,
    scope: BulkScope,
    cover_crop_id: &str,
    limit_rows: Option<usize>,
) -> Outcome {
    let unit_cost = config.cover_crop(cover_crop_id).seed_cost;
    require_fall(state)?;
    let (cells, cost) = plan_bulk(state, scope, limit_rows, unit_cost, |c| {
        cover_crop_eligible(c, config).is_ok()
    })?;

    for &(r, c) in &cells {
        do_cover_crop(state, config, r, c, cover_crop_id);
    }
    Ok(CommandResult::ok().with_cost(cost).with_cells(cells.len()))
}

// ── Clock, events, loans ───────────────────────────────────────────

fn set_speed(state: &mut GameState, speed: SimSpeed) -> Outcome {
    if !speed.is_paused() && !state.auto_pause_queue.is_empty() {
        return reject("Resolve the pending notices before resuming.");
    }
    state.speed = speed;
    Ok(CommandResult::ok())
}

fn respond_to_event(state: &mut GameState, config: &GameConfig, choice_id: &str) -> Outcome {
    let Some(active) = state.active_event.clone() else {
        return reject("No event is awaiting a response.");
    };
    let storylet = config.storylet(&active.storylet_id);
    let Some(choice) = storylet.choice(choice_id) else {
        return reject(format!("'{choice_id}' is not an option for {}.", storylet.title));
    };
    require_cash(state, choice.cost.unwrap_or(0.0))?;

    let revenue_before = state.economy.yearly_revenue;
    let expenses_before = state.economy.yearly_expenses;
    let events = apply_effects(state, &choice.effects, &storylet.id);
    let revenue = state.economy.yearly_revenue - revenue_before;
    let cost = state.economy.yearly_expenses - expenses_before;
    for event in events {
        state.notify(event);
    }
    record_occurrence(state, &storylet.id, active.fired_on_day, choice_id);
    state.active_event = None;
    remove_reasons(state, &[AutoPauseReason::Event, AutoPauseReason::Advisor]);
    Ok(CommandResult::ok().with_cost(cost).with_revenue(revenue))
}

fn take_loan(state: &mut GameState, config: &GameConfig) -> Outcome {
    let Some(amount) = state.pending_loan_offer else {
        return reject("The bank has not offered a loan.");
    };
    state.economy.receive_loan(amount);
    state.pending_loan_offer = None;
    // Past the final year the loan only squares the books.
    if state.date().year > config.economy.victory_year {
        state.game_over_reason = Some(GameOverReason::Victory);
    } else {
        state.game_over = false;
        state.game_over_reason = None;
    }
    remove_reasons(state, &[AutoPauseReason::LoanOffer]);
    state.notify(SimEvent::LoanTaken { amount });
    Ok(CommandResult::ok().with_revenue(amount))
}

fn dismiss_auto_pause(state: &mut GameState) -> Outcome {
    if state.auto_pause_queue.is_empty() {
        return reject("Nothing to dismiss.");
    }
    let head = state.auto_pause_queue.remove(0);

    match head.reason {
        AutoPauseReason::Event | AutoPauseReason::Advisor => {
            if let Some(active) = state.active_event.take() {
                record_occurrence(state, &active.storylet_id, active.fired_on_day, DISMISSED_CHOICE);
            }
        }
        AutoPauseReason::YearEnd => {
            state.year_end_summary_pending = false;
        }
        AutoPauseReason::LoanOffer => {
            state.pending_loan_offer = None;
            state.game_over = true;
            state.game_over_reason = Some(GameOverReason::Bankruptcy);
            let cash = state.economy.cash;
            state.notify(SimEvent::Bankrupt { cash });
            add_auto_pause(
                state,
                AutoPauseReason::Bankruptcy,
                "The farm is bankrupt.",
                None,
            );
        }
        AutoPauseReason::HarvestReady
        | AutoPauseReason::WaterStress
        | AutoPauseReason::Bankruptcy
        | AutoPauseReason::Year30 => {}
    }
    Ok(CommandResult::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::CalendarDate;

    fn state_on(month: u32) -> (GameState, GameConfig) {
        let config = GameConfig::standard();
        let mut state = GameState::new(&config, 3);
        state.day = CalendarDate { day_of_month: 1, month, season: Season::from_month(month), year: 1, day_of_year: 0 }
            .to_day();
        (state, config)
    }

    #[test]
    fn plant_outside_window_is_rejected_without_mutation() {
        let (mut state, config) = state_on(9);
        let before = state.clone();
        let result = process_command(
            &mut state,
            &config,
            &Command::Plant { row: 0, col: 0, crop_id: "silage-corn".into() },
        );
        assert!(!result.success);
        assert_eq!(state, before);
    }

    #[test]
    fn out_of_range_plot_is_rejected() {
        let (mut state, config) = state_on(4);
        let result = process_command(&mut state, &config, &Command::Water { row: 8, col: 0 });
        assert!(!result.success);
    }

    #[test]
    fn plan_rows_offers_affordable_prefix() {
        let units = vec![
            RowUnit::new(vec![(0, 0), (0, 1)], 100.0),
            RowUnit::new(vec![(1, 0), (1, 1)], 100.0),
            RowUnit::new(vec![(2, 0)], 100.0),
        ];
        let err = plan_rows(units, 450.0, None).unwrap_err();
        let offer = err.partial_offer.expect("offer");
        assert_eq!(offer.affordable_rows, 2);
        assert_eq!(offer.affordable_plots, 4);
        assert_eq!(offer.total_cost, 400.0);
    }

    #[test]
    fn plan_rows_without_any_affordable_row_has_no_offer() {
        let units = vec![RowUnit::new(vec![(0, 0), (0, 1)], 100.0)];
        let err = plan_rows(units, 150.0, None).unwrap_err();
        assert!(err.partial_offer.is_none());
    }

    #[test]
    fn set_speed_blocked_by_pending_pause() {
        let (mut state, config) = state_on(4);
        add_auto_pause(&mut state, AutoPauseReason::YearEnd, "year", None);
        let result = process_command(&mut state, &config, &Command::SetSpeed { speed: SimSpeed::Normal });
        assert!(!result.success);
        let result = process_command(&mut state, &config, &Command::SetSpeed { speed: SimSpeed::Paused });
        assert!(result.success);
    }
}
