//! sim-runner: headless simulation runner for Grange.
//!
//! Usage:
//!   sim-runner --seed 12345 --days 3650 --db run.db
//!   sim-runner --seed 12345 --ipc-mode
//!   sim-runner --export-content ./data
//!   sim-runner --db run.db --run-id run-... --resume-day 400 --days 365
//!
//! Headless mode plays a simple autopilot: plant silage corn in season,
//! harvest and water when asked, accept the loan, pick the first
//! affordable choice for every event.

use anyhow::{bail, Result};
use grange_core::{
    auto_pause::AutoPauseReason,
    clock::SimSpeed,
    command::{BulkScope, Command, CommandResult},
    config::GameConfig,
    engine::{block_reason, BlockReason, SimEngine, TickOutcome},
    snapshot::SNAPSHOT_INTERVAL,
    state::GameState,
    store::SimStore,
    types::RunId,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

const AUTOPILOT_CROP: &str = "silage-corn";

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick { count: u32 },
    Command { command: Command },
    Save,
    Quit,
}

#[derive(serde::Serialize)]
struct IpcReply<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    result:  Option<CommandResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked: Option<BlockReason>,
    state:   &'a GameState,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 365u32);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");

    if let Some(dir) = string_arg(&args, "--export-content") {
        GameConfig::standard().write_dir(dir)?;
        println!("Wrote standard content to {dir}");
        return Ok(());
    }

    let config = if Path::new(data_dir).is_dir() {
        GameConfig::load(data_dir)?
    } else {
        log::info!("no content at {data_dir}; using built-in content");
        GameConfig::standard()
    };

    let store = SimStore::open(db)?;
    store.migrate()?;

    let (run_id, mut engine) = match (string_arg(&args, "--run-id"), string_arg(&args, "--resume-day")) {
        (Some(run_id), Some(day)) => {
            let day: u32 = day.parse()?;
            let Some(run_seed) = store.run_seed(run_id)? else {
                bail!("no run named {run_id} in {db}");
            };
            let state = store.load_state(run_id, day)?;
            log::info!("resumed {run_id} (seed {run_seed}) at day {}", state.day);
            (run_id.to_string(), SimEngine::from_state(config, state))
        }
        (None, Some(_)) => bail!("--resume-day needs --run-id"),
        _ => {
            let run_id: RunId = format!("run-{seed}-{}", uuid::Uuid::new_v4());
            store.insert_run(&run_id, seed, &config.scenario.id, env!("CARGO_PKG_VERSION"))?;
            let engine = SimEngine::new(config, seed);
            store.save_snapshot(&run_id, &engine.state)?;
            (run_id, engine)
        }
    };

    if ipc_mode {
        run_ipc_loop(&mut engine, &store, &run_id)?;
    } else {
        println!("Grange sim-runner");
        println!("  seed:      {}", engine.state.seed);
        println!("  days:      {days}");
        println!("  db:        {db}");
        println!("  run_id:    {run_id}");
        println!();
        run_autopilot(&mut engine, &store, &run_id, days)?;
        print_summary(&engine, &run_id);
    }

    Ok(())
}

/// Tick once and persist what happened.
fn step(engine: &mut SimEngine, store: &SimStore, run_id: &str) -> Result<Option<BlockReason>> {
    match engine.tick() {
        TickOutcome::Advanced { day, events } => {
            store.append_events(run_id, day, &events)?;
            if day % SNAPSHOT_INTERVAL == 0 {
                store.save_snapshot(run_id, &engine.state)?;
            }
            Ok(None)
        }
        TickOutcome::Blocked(reason) => Ok(Some(reason)),
    }
}

fn run_autopilot(engine: &mut SimEngine, store: &SimStore, run_id: &str, days: u32) -> Result<()> {
    let target = engine.state.day + days;
    // Each pass either ticks or clears one obstacle; the bound stops a
    // policy that can never clear its queue.
    let mut passes = 0u32;
    while engine.state.day < target && passes < days.saturating_mul(20) {
        passes += 1;
        plant_if_in_season(engine);

        match block_reason(&engine.state) {
            None => {
                step(engine, store, run_id)?;
            }
            Some(BlockReason::Paused) => {
                engine.process_command(&Command::SetSpeed { speed: SimSpeed::Fastest });
            }
            Some(BlockReason::AutoPause) => resolve_head(engine),
            Some(BlockReason::GameOver) => {
                if engine.state.pending_loan_offer.is_some() {
                    resolve_head(engine);
                } else {
                    break;
                }
            }
        }
    }
    store.save_snapshot(run_id, &engine.state)?;
    Ok(())
}

/// Submit a field-wide command, confirming any partial offer.
fn bulk_with_confirm(engine: &mut SimEngine, command: Command) -> CommandResult {
    let result = engine.process_command(&command);
    let Some(offer) = result.partial_offer else {
        return result;
    };
    let limited = match command {
        Command::BulkPlant { scope, crop_id, .. } => {
            Command::BulkPlant { scope, crop_id, limit_rows: Some(offer.affordable_rows) }
        }
        Command::BulkWater { scope, .. } => Command::BulkWater { scope, limit_rows: Some(offer.affordable_rows) },
        other => other,
    };
    engine.process_command(&limited)
}

fn plant_if_in_season(engine: &mut SimEngine) {
    if engine.state.game_over || engine.state.cells().all(|c| !c.is_empty()) {
        return;
    }
    let window = &engine.config.crop(AUTOPILOT_CROP).planting_window;
    let month = engine.state.date().month;
    if grange_core::clock::month_in_window(month, window.start_month, window.end_month) {
        bulk_with_confirm(
            engine,
            Command::BulkPlant { scope: BulkScope::All, crop_id: AUTOPILOT_CROP.into(), limit_rows: None },
        );
    }
}

fn resolve_head(engine: &mut SimEngine) {
    let Some(head) = engine.state.auto_pause_queue.first().cloned() else {
        return;
    };
    match head.reason {
        AutoPauseReason::LoanOffer => {
            engine.process_command(&Command::TakeLoan);
        }
        AutoPauseReason::Event | AutoPauseReason::Advisor => {
            let choice = engine.state.active_event.as_ref().and_then(|active| {
                let cash = engine.state.economy.cash;
                engine
                    .config
                    .storylet(&active.storylet_id)
                    .choices
                    .iter()
                    .find(|c| c.cost.unwrap_or(0.0) <= cash)
                    .map(|c| c.id.clone())
            });
            let responded = choice.is_some_and(|choice_id| {
                engine.process_command(&Command::RespondToEvent { choice_id }).success
            });
            if !responded {
                engine.process_command(&Command::DismissAutoPause);
            }
        }
        AutoPauseReason::HarvestReady => {
            engine.process_command(&Command::BulkHarvest { scope: BulkScope::All });
            engine.process_command(&Command::DismissAutoPause);
        }
        AutoPauseReason::WaterStress => {
            bulk_with_confirm(engine, Command::BulkWater { scope: BulkScope::All, limit_rows: None });
            engine.process_command(&Command::DismissAutoPause);
        }
        AutoPauseReason::YearEnd | AutoPauseReason::Bankruptcy | AutoPauseReason::Year30 => {
            println!("  {}", head.message);
            engine.process_command(&Command::DismissAutoPause);
        }
    }
}

fn run_ipc_loop(engine: &mut SimEngine, store: &SimStore, run_id: &str) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("ipc: unreadable request: {e}");
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let (result, blocked) = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => (None, None),
            IpcCommand::Tick { count } => {
                let mut blocked = None;
                for _ in 0..count {
                    blocked = step(engine, store, run_id)?;
                    if blocked.is_some() {
                        break;
                    }
                }
                (None, blocked)
            }
            IpcCommand::Command { command } => (Some(engine.process_command(&command)), None),
            IpcCommand::Save => {
                store.save_snapshot(run_id, &engine.state)?;
                (None, None)
            }
        };

        let reply = IpcReply { result, blocked, state: &engine.state };
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(engine: &SimEngine, run_id: &str) {
    let state = &engine.state;
    let date = state.date();
    let planted = state.cells().filter(|c| !c.is_empty()).count();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:       {run_id}");
    println!("  date:         {} {}, year {}", date.season.label(), date.day_of_month, date.year);
    println!("  cash:         ${:.0}", state.economy.cash);
    println!("  debt:         ${:.0}", state.economy.debt);
    println!("  planted:      {planted}/64");
    println!("  events fired: {}", state.event_log.len());
    match state.game_over_reason {
        Some(reason) if state.game_over => println!("  game over:    {reason:?}"),
        _ => println!("  game over:    no"),
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
