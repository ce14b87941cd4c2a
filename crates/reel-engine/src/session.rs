//! Per-spin transient state

use crate::symbols::SymbolId;
use crate::timing::TimingConfig;

/// Destination of each reel, fixed before the first tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalStops {
    /// Strip mode: final stop offset per reel
    Offsets(Vec<usize>),
    /// Weighted mode: final visible column per reel
    Columns(Vec<Vec<SymbolId>>),
}

/// What a reel should do on a given tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReelAction {
    /// Keep turning by the reel's speed
    Advance,
    /// Snap to the pre-chosen final stop
    Snap,
    /// Already settled, leave untouched
    Hold,
}

/// Mutable state of one spin. Created at spin start, dropped at settle.
#[derive(Debug, Clone)]
pub struct SpinSession {
    tick: u32,
    stop_ticks: Vec<u32>,
    speeds: Vec<usize>,
    final_stops: FinalStops,
    bet_per_line: u64,
    active_lines: usize,
    stake: u64,
}

impl SpinSession {
    pub fn new(
        timing: &TimingConfig,
        reels: usize,
        final_stops: FinalStops,
        bet_per_line: u64,
        active_lines: usize,
    ) -> Self {
        Self {
            tick: 0,
            stop_ticks: timing.stop_ticks(reels),
            speeds: (0..reels).map(|r| timing.speed_for(r)).collect(),
            final_stops,
            bet_per_line,
            active_lines,
            stake: bet_per_line.saturating_mul(active_lines as u64),
        }
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn stop_ticks(&self) -> &[u32] {
        &self.stop_ticks
    }

    pub fn speed(&self, reel: usize) -> usize {
        self.speeds.get(reel).copied().unwrap_or(1)
    }

    pub fn final_stops(&self) -> &FinalStops {
        &self.final_stops
    }

    pub fn bet_per_line(&self) -> u64 {
        self.bet_per_line
    }

    pub fn active_lines(&self) -> usize {
        self.active_lines
    }

    pub fn stake(&self) -> u64 {
        self.stake
    }

    /// Action for `reel` at the current tick
    pub fn action(&self, reel: usize) -> ReelAction {
        match self.stop_ticks.get(reel) {
            Some(&stop) if self.tick < stop => ReelAction::Advance,
            Some(&stop) if self.tick == stop => ReelAction::Snap,
            _ => ReelAction::Hold,
        }
    }

    /// True once `reel` has reached its stop tick
    pub fn is_stopped(&self, reel: usize) -> bool {
        self.stop_ticks.get(reel).is_none_or(|&stop| self.tick >= stop)
    }

    /// True once every reel has reached or passed its stop tick
    pub fn all_stopped(&self) -> bool {
        self.stop_ticks.iter().all(|&stop| self.tick >= stop)
    }

    /// Highest tick index a spin can reach
    pub fn last_tick(&self) -> u32 {
        self.stop_ticks.iter().copied().max().unwrap_or(0)
    }

    pub(crate) fn next_tick(&mut self) {
        self.tick += 1;
    }
}
