//! Spin results

use serde::{Deserialize, Serialize};

use crate::symbols::SymbolId;

/// A win on a single payline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinEntry {
    /// Payline catalog position (1-based)
    pub line_index: usize,
    /// Row per reel for this payline
    pub payline: Vec<u8>,
    /// Winning symbol
    pub symbol: SymbolId,
    /// Matching symbols counted from reel 0
    pub run_length: u8,
    /// Paytable multiplier for `symbol` × `run_length`
    pub multiplier: u32,
    /// bet_per_line × multiplier
    pub amount_won: u64,
    /// Every symbol on the line, reel 0 first
    pub line_symbols: Vec<SymbolId>,
}

impl WinEntry {
    /// (reel, row) cells that make up the winning run
    pub fn winning_cells(&self) -> Vec<(usize, usize)> {
        self.payline
            .iter()
            .take(self.run_length as usize)
            .enumerate()
            .map(|(reel, &row)| (reel, row as usize))
            .collect()
    }
}

/// Outcome of one completed spin
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpinResult {
    /// Winning lines in catalog order
    pub wins: Vec<WinEntry>,
    /// Sum of all `amount_won`
    pub total_won: u64,
    /// Bet per line used for this spin
    pub bet_per_line: u64,
    /// Number of active paylines
    pub active_lines: usize,
    /// Total stake debited at spin start
    pub stake: u64,
}

impl SpinResult {
    pub fn no_win(bet_per_line: u64, active_lines: usize) -> Self {
        Self {
            wins: Vec::new(),
            total_won: 0,
            bet_per_line,
            active_lines,
            stake: bet_per_line.saturating_mul(active_lines as u64),
        }
    }

    /// Check if this is a winning spin
    pub fn is_win(&self) -> bool {
        self.total_won > 0
    }

    /// Get win count
    pub fn win_count(&self) -> usize {
        self.wins.len()
    }

    /// Net credit change for the spin (win minus stake)
    pub fn net(&self) -> i64 {
        let won = i64::try_from(self.total_won).unwrap_or(i64::MAX);
        let stake = i64::try_from(self.stake).unwrap_or(i64::MAX);
        won.saturating_sub(stake)
    }

    /// Largest single line win
    pub fn best_win(&self) -> Option<&WinEntry> {
        self.wins.iter().max_by_key(|w| w.amount_won)
    }
}
