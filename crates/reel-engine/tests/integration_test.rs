//! End-to-end play scenarios with forced reel outcomes

use reel_engine::{
    EngineStatus, MachineConfig, MachineError, Payline, PayoutEvaluator, PayTable, SourceConfig,
    SpinEngine, SpinEvent, SpinPhase, SpinRejected, SymbolId, TimingConfig,
};

const CHERRY: SymbolId = SymbolId(0);
const LEMON: SymbolId = SymbolId(1);
const STAR: SymbolId = SymbolId(3);
const SEVEN: SymbolId = SymbolId(4);

/// Classic machine whose reels each carry a single repeated symbol
fn forced(codes: [&str; 5]) -> MachineConfig {
    let mut config = MachineConfig::classic_strips();
    config.source = SourceConfig::Strips {
        strips: codes.iter().map(|c| c.repeat(3)).collect(),
    };
    config.timing = TimingConfig::studio();
    config
}

fn finish(engine: &mut SpinEngine) {
    while engine.advance_tick().is_some_and(|o| o.still_spinning) {}
    engine.settle();
}

#[test]
fn test_three_cherries_pay_bet_times_multiplier() {
    let mut engine = SpinEngine::with_seed(&forced(["C", "C", "C", "L", "C"]), 1).unwrap();
    let result = engine.spin_to_completion(2, 1).unwrap();

    assert_eq!(result.wins.len(), 1);
    let win = &result.wins[0];
    assert_eq!(win.symbol, CHERRY);
    assert_eq!(win.run_length, 3);
    assert_eq!(win.multiplier, 3);
    assert_eq!(win.amount_won, 6);
    assert_eq!(engine.current_bankroll(), 200 - 2 + 6);
    assert_eq!(engine.highlighted_lines(), &[1]);
    assert_eq!(engine.status().to_string(), "WIN! +6 (1 line(s))");
}

#[test]
fn test_mismatch_on_first_reel_never_pays() {
    let mut engine = SpinEngine::with_seed(&forced(["L", "C", "C", "C", "C"]), 1).unwrap();
    let result = engine.spin_to_completion(2, 9).unwrap();

    assert!(!result.is_win());
    assert_eq!(result.total_won, 0);
    assert_eq!(engine.current_bankroll(), 200 - 18);
    assert_eq!(engine.status(), EngineStatus::NoWin);
    assert!(engine.highlighted_lines().is_empty());
}

#[test]
fn test_every_active_line_pays_independently() {
    let mut engine = SpinEngine::with_seed(&forced(["7", "7", "7", "7", "7"]), 1).unwrap();
    let result = engine.spin_to_completion(1, 9).unwrap();

    assert_eq!(result.wins.len(), 9);
    assert_eq!(result.total_won, 9 * 250);
    let indices: Vec<usize> = result.wins.iter().map(|w| w.line_index).collect();
    assert_eq!(indices, (1..=9).collect::<Vec<_>>());
}

#[test]
fn test_two_lines_win_in_catalog_order() {
    let evaluator = PayoutEvaluator::new(PayTable::classic());
    let cells = vec![
        vec![STAR, STAR, STAR, STAR, STAR],
        vec![SEVEN, SEVEN, SEVEN, CHERRY, LEMON],
        vec![LEMON, CHERRY, LEMON, CHERRY, LEMON],
    ];
    let paylines = vec![Payline::straight(1, 0, 5), Payline::straight(2, 1, 5)];

    let result = evaluator.evaluate(&cells, &paylines, 2);

    assert_eq!(result.total_won, 210);
    let amounts: Vec<(usize, u64)> = result.wins.iter().map(|w| (w.line_index, w.amount_won)).collect();
    assert_eq!(amounts, vec![(1, 160), (2, 50)]);
}

#[test]
fn test_insufficient_funds_mutates_nothing() {
    let mut config = MachineConfig::classic_strips();
    config.defaults.bankroll = 5;
    let mut engine = SpinEngine::with_seed(&config, 4).unwrap();
    let rx = engine.subscribe();
    let before = engine.snapshot();

    let rejected = engine.request_spin(2, 5);

    assert_eq!(
        rejected,
        Err(SpinRejected::InsufficientFunds { stake: 10, bankroll: 5 })
    );
    assert_eq!(engine.current_bankroll(), 5);
    assert_eq!(engine.snapshot(), before);
    assert_eq!(engine.phase(), SpinPhase::Idle);
    assert_eq!(engine.spin_count(), 0);
    assert!(engine.advance_tick().is_none());
    assert!(matches!(rx.try_recv(), Ok(SpinEvent::Rejected { .. })));
}

#[test]
fn test_stake_equal_to_bankroll_is_accepted() {
    let mut config = MachineConfig::classic_strips();
    config.defaults.bankroll = 10;
    config.source = SourceConfig::Strips {
        strips: ["L", "C", "C", "C", "C"].iter().map(|c| c.repeat(3)).collect(),
    };
    let mut engine = SpinEngine::with_seed(&config, 4).unwrap();

    engine.spin_to_completion(2, 5).unwrap();

    assert_eq!(engine.current_bankroll(), 0);
    assert_eq!(engine.status().to_string(), "Out of credits! Press Reset.");
    assert!(engine.spin_to_completion(1, 1).is_err());

    engine.reset().unwrap();
    assert_eq!(engine.current_bankroll(), 10);
}

#[test]
fn test_spin_terminates_after_last_stop_tick() {
    for timing in [
        TimingConfig::normal(),
        TimingConfig::turbo(),
        TimingConfig::studio(),
        TimingConfig::classic_weighted(),
    ] {
        let mut config = MachineConfig::classic_strips();
        config.timing = timing.clone();
        let mut engine = SpinEngine::with_seed(&config, 8).unwrap();
        engine.request_spin(1, 1).unwrap();

        let mut calls = 0;
        while let Some(outcome) = engine.advance_tick() {
            calls += 1;
            if !outcome.still_spinning {
                break;
            }
        }
        let last_stop = *timing.stop_ticks(5).last().unwrap();
        assert_eq!(calls, last_stop + 1);
        assert_eq!(engine.phase(), SpinPhase::Settled);
    }
}

#[test]
fn test_requests_are_clamped() {
    let mut engine = SpinEngine::with_seed(&MachineConfig::classic_strips(), 2).unwrap();

    let low = engine.request_spin(0, 0).unwrap();
    assert_eq!((low.bet_per_line, low.active_lines, low.stake), (1, 1, 1));
    finish(&mut engine);

    let high = engine.request_spin(1_000, 1_000).unwrap();
    assert_eq!((high.bet_per_line, high.active_lines, high.stake), (20, 9, 180));
}

#[test]
fn test_weighted_machine_plays() {
    let mut engine = SpinEngine::with_seed(&MachineConfig::classic_weighted(), 21).unwrap();
    let mut total_stake = 0;
    let mut total_won = 0;
    for _ in 0..10 {
        let result = engine.spin_to_completion(1, 5).unwrap();
        total_stake += result.stake;
        total_won += result.total_won;
    }
    assert_eq!(engine.current_bankroll(), 200 - total_stake + total_won);
    assert_eq!(engine.spin_count(), 10);
}

#[test]
fn test_config_with_empty_strip_is_refused() {
    let mut config = forced(["C", "C", "C", "C", "C"]);
    if let SourceConfig::Strips { strips } = &mut config.source {
        strips[4] = String::new();
    }
    assert!(matches!(
        SpinEngine::new(&config),
        Err(MachineError::InvalidConfiguration(_))
    ));
}
