//! Auto-pause reasons raised by the tick loop, their ordering and
//! how dismissing each one resolves.

use grange_core::{
    auto_pause::{AutoPauseReason, PausePayload},
    clock::{Season, SimSpeed},
    command::{BulkScope, Command},
    config::GameConfig,
    economics_subsystem::YearSummary,
    engine::{BlockReason, SimEngine, TickOutcome},
    event::SimEvent,
    state::GameOverReason,
};

const DEC_31_YEAR_1: u32 = 364;

fn dec_31(year: u32) -> u32 {
    (year - 1) * 365 + DEC_31_YEAR_1
}

fn quiet_engine(seed: u64) -> SimEngine {
    let mut config = GameConfig::standard();
    config.storylets.clear();
    let mut engine = SimEngine::new(config, seed);
    engine.state.speed = SimSpeed::Normal;
    engine
}

fn tick(engine: &mut SimEngine) -> Vec<SimEvent> {
    engine.state.speed = SimSpeed::Normal;
    match engine.tick() {
        TickOutcome::Advanced { events, .. } => events,
        TickOutcome::Blocked(reason) => panic!("tick blocked: {reason:?}"),
    }
}

fn queue(engine: &SimEngine) -> Vec<AutoPauseReason> {
    engine.state.auto_pause_queue.iter().map(|p| p.reason).collect()
}

#[test]
fn year_end_closes_the_books() {
    let mut engine = quiet_engine(41);
    engine.state.economy.record_revenue(1_000.0);
    engine.state.economy.record_expense(300.0);
    engine.state.day = dec_31(1);

    tick(&mut engine);
    assert_eq!(engine.state.date().year, 2);
    assert_eq!(queue(&engine), vec![AutoPauseReason::YearEnd]);
    assert!(engine.state.year_end_summary_pending);
    assert_eq!(engine.state.speed, SimSpeed::Paused);

    let expected = YearSummary {
        year:     1,
        revenue:  1_000.0,
        expenses: 2_300.0,
        net:      -1_300.0,
        cash:     48_700.0,
        debt:     0.0,
    };
    assert_eq!(
        engine.state.auto_pause_queue[0].payload,
        Some(PausePayload::YearSummary { summary: expected })
    );
    assert_eq!(engine.state.economy.cash, 48_700.0);
    assert_eq!(engine.state.economy.yearly_revenue, 0.0);
    assert_eq!(engine.state.economy.yearly_expenses, 0.0);

    assert!(engine.process_command(&Command::DismissAutoPause).success);
    assert!(!engine.state.year_end_summary_pending);
    assert!(engine.process_command(&Command::SetSpeed { speed: SimSpeed::Fast }).success);
}

#[test]
fn queued_pause_blocks_resume_and_tick() {
    let mut engine = quiet_engine(42);
    engine.state.day = dec_31(1);
    tick(&mut engine);

    let resume = engine.process_command(&Command::SetSpeed { speed: SimSpeed::Normal });
    assert!(!resume.success);
    engine.state.speed = SimSpeed::Normal;
    assert_eq!(engine.tick(), TickOutcome::Blocked(BlockReason::AutoPause));
}

#[test]
fn water_stress_pauses_once_per_season() {
    let mut engine = quiet_engine(43);
    let planted = engine.process_command(&Command::BulkPlant {
        scope: BulkScope::All,
        crop_id: "silage-corn".into(),
        limit_rows: None,
    });
    assert!(planted.success);

    let mut stress_pauses: Vec<(u32, Season)> = Vec::new();
    for _ in 0..150 {
        while !engine.state.auto_pause_queue.is_empty() {
            engine.process_command(&Command::DismissAutoPause);
        }
        for cell in engine.state.cells_mut() {
            cell.soil.moisture = 0.0;
        }
        let events = tick(&mut engine);
        if events.iter().any(|e| matches!(e, SimEvent::WaterStress { .. })) {
            let date = engine.state.date();
            stress_pauses.push((date.year, date.season));
        }
    }

    let mut unique = stress_pauses.clone();
    unique.dedup();
    assert_eq!(unique, stress_pauses, "more than one water-stress pause in a season");
    assert!(stress_pauses.contains(&(1, Season::Spring)));
    assert!(stress_pauses.contains(&(1, Season::Summer)));
}

#[test]
fn bankruptcy_outranks_year_end() {
    let mut engine = quiet_engine(44);
    engine.state.day = dec_31(5);
    engine.state.economy.cash = -100.0;
    engine.state.economy.loans_received = 1;

    let events = tick(&mut engine);
    assert_eq!(queue(&engine), vec![AutoPauseReason::Bankruptcy, AutoPauseReason::YearEnd]);
    assert!(events.iter().any(|e| matches!(e, SimEvent::Bankrupt { .. })));
    assert!(engine.state.game_over);
    assert_eq!(engine.state.game_over_reason, Some(GameOverReason::Bankruptcy));
    assert!(engine.state.pending_loan_offer.is_none());
}

#[test]
fn first_insolvency_offers_a_loan() {
    let mut engine = quiet_engine(45);
    engine.state.economy.cash = -12_345.0;

    tick(&mut engine);
    assert_eq!(engine.state.pending_loan_offer, Some(18_000.0));
    assert_eq!(queue(&engine), vec![AutoPauseReason::LoanOffer]);
    assert_eq!(
        engine.state.auto_pause_queue[0].payload,
        Some(PausePayload::LoanOffer { amount: 18_000.0 })
    );
    assert!(engine.state.game_over);
    assert!(!engine.process_command(&Command::BulkHarvest { scope: BulkScope::All }).success);

    let taken = engine.process_command(&Command::TakeLoan);
    assert!(taken.success);
    assert_eq!(engine.state.economy.cash, 5_655.0);
    assert_eq!(engine.state.economy.debt, 18_000.0);
    assert_eq!(engine.state.economy.loans_received, 1);
    assert!(!engine.state.game_over);
    assert!(engine.state.game_over_reason.is_none());
    assert!(engine.state.auto_pause_queue.is_empty());

    tick(&mut engine);
}

#[test]
fn small_deficit_gets_the_minimum_loan() {
    let mut engine = quiet_engine(46);
    engine.state.economy.cash = -10.0;
    tick(&mut engine);
    assert_eq!(engine.state.pending_loan_offer, Some(10_000.0));
}

#[test]
fn declining_the_loan_is_final() {
    let mut engine = quiet_engine(47);
    engine.state.economy.cash = -500.0;
    tick(&mut engine);

    assert!(engine.process_command(&Command::DismissAutoPause).success);
    assert!(engine.state.pending_loan_offer.is_none());
    assert!(engine.state.game_over);
    assert_eq!(queue(&engine), vec![AutoPauseReason::Bankruptcy]);
    assert!(!engine.process_command(&Command::TakeLoan).success);
    assert_eq!(engine.tick(), TickOutcome::Blocked(BlockReason::GameOver));
}

#[test]
fn surviving_thirty_years_wins() {
    let mut engine = quiet_engine(48);
    engine.state.day = dec_31(30);

    let events = tick(&mut engine);
    assert!(events.contains(&SimEvent::Victory { year: 30 }));
    assert_eq!(queue(&engine), vec![AutoPauseReason::Year30, AutoPauseReason::YearEnd]);
    assert!(engine.state.game_over);
    assert_eq!(engine.state.game_over_reason, Some(GameOverReason::Victory));
    assert_eq!(engine.tick(), TickOutcome::Blocked(BlockReason::GameOver));

    engine.process_command(&Command::DismissAutoPause);
    engine.process_command(&Command::DismissAutoPause);
    assert!(engine.state.auto_pause_queue.is_empty());
    assert_eq!(engine.tick(), TickOutcome::Blocked(BlockReason::GameOver));
}

#[test]
fn bankruptcy_at_the_final_rollover_is_not_a_victory() {
    let mut engine = quiet_engine(50);
    engine.state.day = dec_31(30);
    engine.state.economy.cash = -5_000.0;
    engine.state.economy.loans_received = 1;

    let events = tick(&mut engine);
    assert_eq!(
        queue(&engine),
        vec![AutoPauseReason::Bankruptcy, AutoPauseReason::Year30, AutoPauseReason::YearEnd]
    );
    assert!(events.contains(&SimEvent::Bankrupt { cash: -7_000.0 }));
    assert!(events.contains(&SimEvent::Victory { year: 30 }));
    assert!(engine.state.game_over);
    assert_eq!(engine.state.game_over_reason, Some(GameOverReason::Bankruptcy));
    assert_eq!(engine.tick(), TickOutcome::Blocked(BlockReason::GameOver));
}

#[test]
fn loan_taken_at_the_final_rollover_still_wins() {
    let mut engine = quiet_engine(51);
    engine.state.day = dec_31(30);
    engine.state.economy.cash = -500.0;

    tick(&mut engine);
    assert_eq!(
        queue(&engine),
        vec![AutoPauseReason::Year30, AutoPauseReason::LoanOffer, AutoPauseReason::YearEnd]
    );
    assert_eq!(engine.state.game_over_reason, Some(GameOverReason::Bankruptcy));

    assert!(engine.process_command(&Command::TakeLoan).success);
    assert_eq!(engine.state.economy.cash, 7_500.0);
    assert!(engine.state.game_over);
    assert_eq!(engine.state.game_over_reason, Some(GameOverReason::Victory));
    assert_eq!(queue(&engine), vec![AutoPauseReason::Year30, AutoPauseReason::YearEnd]);
}

#[test]
fn every_tick_event_becomes_a_notification() {
    let mut engine = quiet_engine(49);
    engine.state.day = dec_31(1);
    let events = tick(&mut engine);
    assert!(!events.is_empty());
    let notified: Vec<&SimEvent> = engine.state.notifications.iter().map(|n| &n.event).collect();
    for event in &events {
        assert!(notified.contains(&event), "{event:?} was not notified");
    }
}
