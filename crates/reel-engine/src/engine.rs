//! Spin engine: bet handling and the tick-driven spin state machine

use std::collections::BTreeMap;
use std::fmt;

use crossbeam_channel::Receiver;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::{Machine, MachineConfig};
use crate::error::{MachineResult, SpinRejected};
use crate::events::{EventBus, SpinEvent};
use crate::grid::{GridSnapshot, GridState};
use crate::paytable::Payline;
use crate::session::{FinalStops, ReelAction, SpinSession};
use crate::source::SymbolSource;
use crate::spin::SpinResult;
use crate::symbols::{SymbolId, SymbolSet};
use crate::timing::TimingConfig;

/// Where the engine is in the spin cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpinPhase {
    /// Accepting spin requests
    Idle,
    /// Reels turning; `advance_tick` drives them
    Spinning,
    /// All reels stopped; waiting for `settle`
    Settled,
}

/// Returned when a spin is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinTicket {
    pub spin_id: u64,
    pub bet_per_line: u64,
    pub active_lines: usize,
    pub stake: u64,
    /// Number of `advance_tick` calls until the spin settles
    pub total_ticks: u32,
}

/// Result of one `advance_tick`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// Tick index just processed (0-based)
    pub tick: u32,
    /// False once every reel has stopped
    pub still_spinning: bool,
    /// Reels that snapped to their final stop on this tick
    pub stopped_this_tick: Vec<usize>,
    /// Grid after this tick
    pub snapshot: GridSnapshot,
}

/// Player's current bet choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetSelection {
    pub bet_per_line: u64,
    pub active_lines: usize,
}

/// Status line for front-ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    Ready,
    Spinning,
    Win { total: u64, lines: usize },
    NoWin,
    NotEnoughCredits,
    OutOfCredits,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "Press SPIN to play!"),
            Self::Spinning => write!(f, "Spinning..."),
            Self::Win { total, lines } => write!(f, "WIN! +{} ({} line(s))", total, lines),
            Self::NoWin => write!(f, "No win, try again!"),
            Self::NotEnoughCredits => write!(f, "Not enough credits for that bet!"),
            Self::OutOfCredits => write!(f, "Out of credits! Press Reset."),
        }
    }
}

/// Slot machine spin engine
///
/// Owns the bankroll, the grid and the in-flight spin. Time is external:
/// callers (a timer, an event loop, a test) call [`advance_tick`] until it
/// reports the reels have stopped, then [`settle`].
///
/// [`advance_tick`]: SpinEngine::advance_tick
/// [`settle`]: SpinEngine::settle
pub struct SpinEngine {
    /// Validated configuration
    machine: Machine,
    /// Visible grid
    grid: GridState,
    /// Random number generator
    rng: StdRng,
    bankroll: u64,
    selection: BetSelection,
    phase: SpinPhase,
    /// Present only while a spin is in flight
    session: Option<SpinSession>,
    /// Winning line indices of the last settled spin
    highlights: Vec<usize>,
    status: EngineStatus,
    spin_count: u64,
    events: EventBus,
}

impl SpinEngine {
    /// Create an engine seeded from the OS
    pub fn new(config: &MachineConfig) -> MachineResult<Self> {
        Ok(Self::from_machine(config.build()?, StdRng::from_os_rng()))
    }

    /// Create with a fixed seed for reproducible play
    pub fn with_seed(config: &MachineConfig, seed: u64) -> MachineResult<Self> {
        Ok(Self::from_machine(config.build()?, StdRng::seed_from_u64(seed)))
    }

    /// Create from a machine produced by [`MachineConfig::build`]
    pub(crate) fn from_machine(machine: Machine, mut rng: StdRng) -> Self {
        let first = machine.symbols.ids().first().copied().unwrap_or(SymbolId(0));
        let mut grid = GridState::new(machine.grid.rows as usize, machine.grid.reels as usize, first);
        grid.randomize_full(&machine.source, &mut rng);
        let defaults = machine.defaults;

        Self {
            machine,
            grid,
            rng,
            bankroll: defaults.bankroll,
            selection: BetSelection {
                bet_per_line: defaults.bet_per_line,
                active_lines: defaults.active_lines,
            },
            phase: SpinPhase::Idle,
            session: None,
            highlights: Vec::new(),
            status: EngineStatus::Ready,
            spin_count: 0,
            events: EventBus::new(),
        }
    }

    /// Seed RNG for reproducible results
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Subscribe to spin events
    pub fn subscribe(&mut self) -> Receiver<SpinEvent> {
        self.events.subscribe()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════

    pub fn current_bankroll(&self) -> u64 {
        self.bankroll
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn is_spinning(&self) -> bool {
        self.phase != SpinPhase::Idle
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn selection(&self) -> BetSelection {
        self.selection
    }

    pub fn spin_count(&self) -> u64 {
        self.spin_count
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.machine.symbols
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.machine.timing
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// In-flight spin state, if any
    pub fn session(&self) -> Option<&SpinSession> {
        self.session.as_ref()
    }

    pub fn snapshot(&self) -> GridSnapshot {
        self.grid.snapshot()
    }

    /// Line indices that won on the last settled spin
    pub fn highlighted_lines(&self) -> &[usize] {
        &self.highlights
    }

    /// The full payline catalog
    pub fn all_paylines(&self) -> &[Payline] {
        &self.machine.paylines
    }

    /// The first `lines` paylines, count clamped to the catalog
    pub fn active_paylines(&self, lines: usize) -> &[Payline] {
        &self.machine.paylines[..self.clamp_lines(lines)]
    }

    pub fn paytable_for(&self, symbol: SymbolId) -> Option<&BTreeMap<u8, u32>> {
        self.machine.evaluator.paytable().entries_for(symbol)
    }

    pub fn clamp_bet(&self, bet_per_line: u64) -> u64 {
        self.machine.bets.clamp(bet_per_line)
    }

    pub fn clamp_lines(&self, lines: usize) -> usize {
        lines.clamp(1, self.machine.paylines.len())
    }

    /// Stake for a bet after clamping both inputs
    pub fn total_bet_for(&self, bet_per_line: u64, active_lines: usize) -> u64 {
        self.clamp_bet(bet_per_line)
            .saturating_mul(self.clamp_lines(active_lines) as u64)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // BET SELECTION
    // ═══════════════════════════════════════════════════════════════════════

    /// Raise bet per line by one. Ignored while spinning.
    pub fn bet_up(&mut self) -> u64 {
        if !self.is_spinning() {
            self.selection.bet_per_line = self.clamp_bet(self.selection.bet_per_line.saturating_add(1));
        }
        self.selection.bet_per_line
    }

    /// Lower bet per line by one. Ignored while spinning.
    pub fn bet_down(&mut self) -> u64 {
        if !self.is_spinning() {
            self.selection.bet_per_line =
                self.clamp_bet(self.selection.bet_per_line.saturating_sub(1));
        }
        self.selection.bet_per_line
    }

    /// Choose how many lines play. Ignored while spinning.
    pub fn set_active_lines(&mut self, lines: usize) -> usize {
        if !self.is_spinning() {
            self.selection.active_lines = self.clamp_lines(lines);
        }
        self.selection.active_lines
    }

    /// Swap animation timing between spins. Invalid timing is refused and
    /// the current timing kept.
    pub fn set_timing(&mut self, timing: TimingConfig) -> MachineResult<()> {
        if self.is_spinning() {
            return Err(SpinRejected::SpinInProgress.into());
        }
        timing.validate(self.grid.reels())?;
        self.machine.timing = timing;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SPIN EXECUTION
    // ═══════════════════════════════════════════════════════════════════════

    /// Spin with the stored bet selection
    pub fn request_spin_with_selection(&mut self) -> Result<SpinTicket, SpinRejected> {
        let BetSelection { bet_per_line, active_lines } = self.selection;
        self.request_spin(bet_per_line, active_lines)
    }

    /// Start a spin.
    ///
    /// Bet and line count are clamped and become the stored selection. The
    /// stake is debited immediately and every reel's final stop is drawn
    /// here, before any tick runs.
    pub fn request_spin(
        &mut self,
        bet_per_line: u64,
        active_lines: usize,
    ) -> Result<SpinTicket, SpinRejected> {
        if self.is_spinning() {
            log::debug!("spin request ignored: spin already in progress");
            self.events.publish(SpinEvent::rejected(SpinRejected::SpinInProgress));
            return Err(SpinRejected::SpinInProgress);
        }

        let bet_per_line = self.clamp_bet(bet_per_line);
        let active_lines = self.clamp_lines(active_lines);
        let stake = bet_per_line.saturating_mul(active_lines as u64);

        if self.bankroll < stake {
            let rejected = SpinRejected::InsufficientFunds {
                stake,
                bankroll: self.bankroll,
            };
            log::warn!("spin rejected: {}", rejected);
            self.status = EngineStatus::NotEnoughCredits;
            self.events.publish(SpinEvent::rejected(rejected));
            return Err(rejected);
        }

        self.bankroll -= stake;
        self.selection = BetSelection { bet_per_line, active_lines };
        self.highlights.clear();
        self.status = EngineStatus::Spinning;
        self.spin_count += 1;

        let reels = self.grid.reels();
        let final_stops = match &self.machine.source {
            SymbolSource::Strips(_) => FinalStops::Offsets(
                (0..reels)
                    .map(|reel| self.machine.source.random_stop_for(reel, &mut self.rng))
                    .collect(),
            ),
            SymbolSource::Weighted(_) => {
                let rows = self.grid.rows();
                FinalStops::Columns(
                    (0..reels)
                        .filter_map(|_| self.machine.source.draw_column(rows, &mut self.rng))
                        .collect(),
                )
            }
        };

        let session = SpinSession::new(
            &self.machine.timing,
            reels,
            final_stops,
            bet_per_line,
            active_lines,
        );
        let ticket = SpinTicket {
            spin_id: self.spin_count,
            bet_per_line,
            active_lines,
            stake,
            total_ticks: session.last_tick().saturating_add(1),
        };
        self.session = Some(session);
        self.phase = SpinPhase::Spinning;

        log::debug!(
            "spin {} started: bet {} x {} lines = {}, bankroll now {}",
            ticket.spin_id,
            bet_per_line,
            active_lines,
            stake,
            self.bankroll
        );
        self.events.publish(SpinEvent::SpinStarted {
            spin_id: ticket.spin_id,
            bet_per_line,
            active_lines,
            stake,
            bankroll: self.bankroll,
        });

        Ok(ticket)
    }

    /// Run one animation tick. `None` unless a spin is spinning.
    ///
    /// Reels before their stop tick advance by their speed, a reel on its
    /// stop tick snaps to its pre-chosen stop, later reels are untouched.
    /// The grid is re-rendered every tick.
    pub fn advance_tick(&mut self) -> Option<TickOutcome> {
        if self.phase != SpinPhase::Spinning {
            return None;
        }
        let session = self.session.as_mut()?;
        let source = &self.machine.source;
        let mut stopped = Vec::new();

        for reel in 0..self.grid.reels() {
            match session.action(reel) {
                ReelAction::Advance => match source {
                    SymbolSource::Strips(_) => {
                        let len = source.strip_len(reel).unwrap_or(1);
                        let step = session.speed(reel) % len;
                        let offset = (self.grid.offsets()[reel] % len + step) % len;
                        self.grid.set_offset(reel, offset);
                    }
                    SymbolSource::Weighted(_) => {
                        if let Some(column) = source.draw_column(self.grid.rows(), &mut self.rng) {
                            self.grid.set_column(reel, &column);
                        }
                    }
                },
                ReelAction::Snap => {
                    match session.final_stops() {
                        FinalStops::Offsets(offsets) => {
                            self.grid.set_offset(reel, offsets[reel]);
                        }
                        FinalStops::Columns(columns) => {
                            self.grid.set_column(reel, &columns[reel]);
                        }
                    }
                    stopped.push(reel);
                }
                ReelAction::Hold => {}
            }
        }

        if source.is_strip_mode() {
            self.grid.rerender(source);
        }

        let tick = session.tick();
        let still_spinning = !session.all_stopped();
        if still_spinning {
            session.next_tick();
        } else {
            self.phase = SpinPhase::Settled;
        }

        let snapshot = self.grid.snapshot();
        log::trace!("tick {} stopped {:?} spinning {}", tick, stopped, still_spinning);

        self.events.publish(SpinEvent::Tick {
            spin_id: self.spin_count,
            tick,
            snapshot: snapshot.clone(),
        });
        for &reel in &stopped {
            self.events.publish(SpinEvent::ReelStopped {
                spin_id: self.spin_count,
                reel_index: reel,
                symbols: self.grid.column(reel),
            });
        }

        Some(TickOutcome {
            tick,
            still_spinning,
            stopped_this_tick: stopped,
            snapshot,
        })
    }

    /// Evaluate the settled grid, credit the win and return to idle.
    /// `None` unless every reel has stopped.
    pub fn settle(&mut self) -> Option<SpinResult> {
        if self.phase != SpinPhase::Settled {
            return None;
        }
        let session = self.session.take()?;

        let paylines = &self.machine.paylines[..session.active_lines()];
        let mut result =
            self.machine
                .evaluator
                .evaluate(self.grid.cells(), paylines, session.bet_per_line());
        result.stake = session.stake();

        self.bankroll = self.bankroll.saturating_add(result.total_won);
        self.highlights = result.wins.iter().map(|w| w.line_index).collect();
        self.status = if result.is_win() {
            EngineStatus::Win {
                total: result.total_won,
                lines: result.wins.len(),
            }
        } else {
            EngineStatus::NoWin
        };
        if self.bankroll == 0 {
            self.status = EngineStatus::OutOfCredits;
        }
        self.phase = SpinPhase::Idle;

        log::debug!(
            "spin {} settled: won {} on {} line(s), bankroll {}",
            self.spin_count,
            result.total_won,
            result.wins.len(),
            self.bankroll
        );
        self.events.publish(SpinEvent::Settled {
            spin_id: self.spin_count,
            result: result.clone(),
            bankroll: self.bankroll,
        });

        Some(result)
    }

    /// Request, tick until stopped and settle, with no delays.
    pub fn spin_to_completion(
        &mut self,
        bet_per_line: u64,
        active_lines: usize,
    ) -> Result<SpinResult, SpinRejected> {
        self.request_spin(bet_per_line, active_lines)?;
        while let Some(outcome) = self.advance_tick() {
            if !outcome.still_spinning {
                break;
            }
        }
        Ok(self.settle().unwrap_or_default())
    }

    /// Restore default bankroll, bet and lines and randomize the grid.
    pub fn reset(&mut self) -> Result<GridSnapshot, SpinRejected> {
        if self.is_spinning() {
            return Err(SpinRejected::SpinInProgress);
        }
        let defaults = self.machine.defaults;
        self.bankroll = defaults.bankroll;
        self.selection = BetSelection {
            bet_per_line: defaults.bet_per_line,
            active_lines: defaults.active_lines,
        };
        self.highlights.clear();
        self.grid.randomize_full(&self.machine.source, &mut self.rng);
        self.status = EngineStatus::Ready;

        let snapshot = self.grid.snapshot();
        log::info!("engine reset: bankroll {}", self.bankroll);
        self.events.publish(SpinEvent::Reset {
            bankroll: self.bankroll,
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MachineError;

    fn engine() -> SpinEngine {
        SpinEngine::with_seed(&MachineConfig::classic_strips(), 12345).unwrap()
    }

    #[test]
    fn test_engine_creation() {
        let engine = engine();
        assert_eq!(engine.current_bankroll(), 200);
        assert_eq!(engine.phase(), SpinPhase::Idle);
        assert_eq!(engine.status().to_string(), "Press SPIN to play!");
        assert_eq!(engine.all_paylines().len(), 9);
    }

    #[test]
    fn test_request_debits_stake() {
        let mut engine = engine();
        let ticket = engine.request_spin(2, 5).unwrap();
        assert_eq!(ticket.stake, 10);
        assert_eq!(ticket.total_ticks, 35);
        assert_eq!(engine.current_bankroll(), 190);
        assert_eq!(engine.phase(), SpinPhase::Spinning);
    }

    #[test]
    fn test_reentrant_request_rejected() {
        let mut engine = engine();
        engine.request_spin(2, 5).unwrap();
        let before = engine.current_bankroll();
        assert_eq!(engine.request_spin(2, 5), Err(SpinRejected::SpinInProgress));
        assert_eq!(engine.current_bankroll(), before);
    }

    #[test]
    fn test_tick_count_matches_stop_ticks() {
        let mut engine = engine();
        let ticket = engine.request_spin(1, 1).unwrap();
        let mut ticks = 0;
        while let Some(outcome) = engine.advance_tick() {
            ticks += 1;
            if !outcome.still_spinning {
                break;
            }
        }
        assert_eq!(ticks, ticket.total_ticks);
        assert_eq!(engine.phase(), SpinPhase::Settled);
        assert!(engine.advance_tick().is_none());
    }

    #[test]
    fn test_settled_grid_matches_final_stops() {
        let mut engine = engine();
        engine.request_spin(1, 1).unwrap();
        let Some(FinalStops::Offsets(finals)) = engine.session().map(|s| s.final_stops().clone())
        else {
            panic!("strip mode should pre-choose offsets");
        };
        while engine.advance_tick().is_some_and(|o| o.still_spinning) {}
        assert_eq!(engine.snapshot().offsets, finals);
    }

    #[test]
    fn test_reels_stop_left_to_right() {
        let mut engine = engine();
        engine.request_spin(1, 1).unwrap();
        let mut order = Vec::new();
        while let Some(outcome) = engine.advance_tick() {
            order.extend(outcome.stopped_this_tick);
            if !outcome.still_spinning {
                break;
            }
        }
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_settle_credits_and_returns_idle() {
        let mut engine = engine();
        let result = engine.spin_to_completion(2, 9).unwrap();
        assert_eq!(engine.phase(), SpinPhase::Idle);
        assert_eq!(engine.current_bankroll(), 200 - 18 + result.total_won);
        assert_eq!(engine.highlighted_lines().len(), result.wins.len());
        assert!(engine.settle().is_none());
    }

    #[test]
    fn test_bet_controls_clamp() {
        let mut engine = engine();
        for _ in 0..30 {
            engine.bet_up();
        }
        assert_eq!(engine.selection().bet_per_line, 20);
        for _ in 0..30 {
            engine.bet_down();
        }
        assert_eq!(engine.selection().bet_per_line, 1);
        assert_eq!(engine.set_active_lines(0), 1);
        assert_eq!(engine.set_active_lines(100), 9);
    }

    #[test]
    fn test_bet_controls_ignored_while_spinning() {
        let mut engine = engine();
        engine.request_spin(2, 5).unwrap();
        assert_eq!(engine.bet_up(), 2);
        assert_eq!(engine.set_active_lines(1), 5);
        assert!(engine.set_timing(TimingConfig::turbo()).is_err());
    }

    #[test]
    fn test_invalid_timing_refused_and_kept() {
        let mut engine = engine();
        let broken = TimingConfig {
            stop_tick_gap: 0,
            reel_speeds: vec![0],
            ..TimingConfig::normal()
        };
        assert!(matches!(
            engine.set_timing(broken),
            Err(MachineError::InvalidConfiguration(_))
        ));
        assert_eq!(engine.timing(), &TimingConfig::normal());
        assert_eq!(engine.timing().stop_ticks(5), vec![22, 25, 28, 31, 34]);

        assert!(engine.set_timing(TimingConfig::turbo()).is_ok());
        assert_eq!(engine.timing(), &TimingConfig::turbo());
    }

    #[test]
    fn test_construction_validates_config() {
        let mut config = MachineConfig::classic_strips();
        config.paylines.clear();
        assert!(matches!(
            SpinEngine::new(&config),
            Err(MachineError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            SpinEngine::with_seed(&config, 1),
            Err(MachineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut engine = engine();
        engine.spin_to_completion(20, 9).unwrap();
        engine.bet_down();
        let snapshot = engine.reset().unwrap();
        assert_eq!(engine.current_bankroll(), 200);
        assert_eq!(engine.selection(), BetSelection { bet_per_line: 2, active_lines: 5 });
        assert_eq!(snapshot, engine.snapshot());
        assert_eq!(engine.status(), EngineStatus::Ready);
    }

    #[test]
    fn test_reset_refused_while_spinning() {
        let mut engine = engine();
        engine.request_spin(2, 5).unwrap();
        assert_eq!(engine.reset(), Err(SpinRejected::SpinInProgress));
    }

    #[test]
    fn test_total_bet_for_clamps() {
        let engine = engine();
        assert_eq!(engine.total_bet_for(2, 5), 10);
        assert_eq!(engine.total_bet_for(0, 0), 1);
        assert_eq!(engine.total_bet_for(999, 999), 180);
    }

    #[test]
    fn test_weighted_mode_spin() {
        let mut engine = SpinEngine::with_seed(&MachineConfig::classic_weighted(), 9).unwrap();
        let ticket = engine.request_spin(1, 9).unwrap();
        assert_eq!(ticket.total_ticks, 19);
        let Some(FinalStops::Columns(columns)) = engine.session().map(|s| s.final_stops().clone())
        else {
            panic!("weighted mode should pre-draw columns");
        };
        while engine.advance_tick().is_some_and(|o| o.still_spinning) {}
        for (reel, column) in columns.iter().enumerate() {
            assert_eq!(&engine.snapshot().cells.iter().map(|r| r[reel]).collect::<Vec<_>>(), column);
        }
        assert!(engine.settle().is_some());
    }

    #[test]
    fn test_events_published() {
        let mut engine = engine();
        let rx = engine.subscribe();
        engine.spin_to_completion(1, 1).unwrap();

        let names: Vec<&str> = rx.try_iter().map(|e| e.type_name()).collect();
        assert_eq!(names.first(), Some(&"SPIN_STARTED"));
        assert_eq!(names.last(), Some(&"SETTLED"));
        assert_eq!(names.iter().filter(|n| **n == "REEL_STOPPED").count(), 5);
        assert_eq!(names.iter().filter(|n| **n == "TICK").count(), 35);
    }
}
