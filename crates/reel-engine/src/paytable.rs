//! Paylines, paytable and win evaluation

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{MachineError, MachineResult};
use crate::spin::{SpinResult, WinEntry};
use crate::symbols::{SymbolId, SymbolSet};

/// Shortest run that can pay
pub const MIN_WINNING_RUN: u8 = 3;

/// A payline definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payline {
    /// Catalog position (1-based)
    pub index: usize,
    /// Row for each reel (e.g., [1, 0, 0, 0, 1])
    pub rows: Vec<u8>,
}

impl Payline {
    pub fn new(index: usize, rows: Vec<u8>) -> Self {
        Self { index, rows }
    }

    /// Create a straight line (same row across all reels)
    pub fn straight(index: usize, row: u8, reel_count: usize) -> Self {
        Self::new(index, vec![row; reel_count])
    }
}

/// The nine lines of the classic 5×3 machine, in catalog order.
pub fn classic_paylines() -> Vec<Payline> {
    let shapes: [[u8; 5]; 9] = [
        [1, 1, 1, 1, 1], // middle
        [0, 0, 0, 0, 0], // top
        [2, 2, 2, 2, 2], // bottom
        [0, 1, 2, 1, 0], // V
        [2, 1, 0, 1, 2], // inverted V
        [0, 0, 1, 0, 0], // top dip
        [2, 2, 1, 2, 2], // bottom bump
        [1, 0, 0, 0, 1], // top run, middle ends
        [1, 2, 2, 2, 1], // bottom run, middle ends
    ];
    shapes
        .iter()
        .enumerate()
        .map(|(i, rows)| Payline::new(i + 1, rows.to_vec()))
        .collect()
}

/// Validate a payline catalog against the grid shape.
pub fn validate_paylines(paylines: &[Payline], reels: usize, rows: usize) -> MachineResult<()> {
    if paylines.is_empty() {
        return Err(MachineError::invalid("payline catalog is empty"));
    }
    for line in paylines {
        if line.rows.len() != reels {
            return Err(MachineError::invalid(format!(
                "payline {} has {} entries for {} reels",
                line.index,
                line.rows.len(),
                reels
            )));
        }
        if let Some(&row) = line.rows.iter().find(|&&r| r as usize >= rows) {
            return Err(MachineError::invalid(format!(
                "payline {} uses row {} but the grid has {} rows",
                line.index, row, rows
            )));
        }
    }
    Ok(())
}

/// Symbol → run length → multiplier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayTable {
    pays: HashMap<SymbolId, BTreeMap<u8, u32>>,
}

impl PayTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The classic per-line paytable for 3/4/5 of a kind.
    pub fn classic() -> Self {
        let mut table = Self::new();
        table.insert(SymbolId(0), &[(3, 3), (4, 8), (5, 20)]);
        table.insert(SymbolId(1), &[(3, 4), (4, 10), (5, 25)]);
        table.insert(SymbolId(2), &[(3, 6), (4, 15), (5, 40)]);
        table.insert(SymbolId(3), &[(3, 10), (4, 25), (5, 80)]);
        table.insert(SymbolId(4), &[(3, 25), (4, 80), (5, 250)]);
        table
    }

    /// Set (or replace) the pays for a symbol
    pub fn insert(&mut self, symbol: SymbolId, pays: &[(u8, u32)]) {
        self.pays.insert(symbol, pays.iter().copied().collect());
    }

    /// Multiplier for a symbol/run pair, 0 if absent
    pub fn multiplier(&self, symbol: SymbolId, run_length: u8) -> u32 {
        self.pays
            .get(&symbol)
            .and_then(|p| p.get(&run_length))
            .copied()
            .unwrap_or(0)
    }

    /// All pays for one symbol
    pub fn entries_for(&self, symbol: SymbolId) -> Option<&BTreeMap<u8, u32>> {
        self.pays.get(&symbol)
    }

    /// Symbols that have at least one pay entry
    pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.pays.keys().copied()
    }

    /// The `n` best-paying symbols for a run length, highest multiplier first.
    /// Ties are broken by symbol definition order.
    pub fn top_wins(&self, set: &SymbolSet, run_length: u8, n: usize) -> Vec<(SymbolId, u32)> {
        let mut wins: Vec<(usize, SymbolId, u32)> = set
            .ids()
            .into_iter()
            .enumerate()
            .map(|(order, id)| (order, id, self.multiplier(id, run_length)))
            .filter(|(_, _, m)| *m > 0)
            .collect();
        wins.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
        wins.into_iter().take(n).map(|(_, id, m)| (id, m)).collect()
    }

    /// Check symbols exist and run lengths fit the reel count.
    ///
    /// Decreasing multipliers are allowed but logged.
    pub fn validate(&self, reels: usize, set: &SymbolSet) -> MachineResult<()> {
        for (symbol, pays) in &self.pays {
            if set.get(*symbol).is_none() {
                return Err(MachineError::invalid(format!(
                    "paytable references unknown symbol {}",
                    symbol
                )));
            }
            for &run in pays.keys() {
                if run < MIN_WINNING_RUN || run as usize > reels {
                    return Err(MachineError::invalid(format!(
                        "paytable run length {} for symbol {} outside {}..={}",
                        run, symbol, MIN_WINNING_RUN, reels
                    )));
                }
            }
            let decreasing = pays.values().zip(pays.values().skip(1)).any(|(a, b)| b < a);
            if decreasing {
                log::warn!("paytable multipliers for symbol {} decrease with run length", symbol);
            }
        }
        Ok(())
    }
}

/// Evaluates settled grids against active paylines.
///
/// Pure: the same grid, lines and bet always give the same result.
#[derive(Debug, Clone)]
pub struct PayoutEvaluator {
    paytable: PayTable,
}

impl PayoutEvaluator {
    pub fn new(paytable: PayTable) -> Self {
        Self { paytable }
    }

    pub fn paytable(&self) -> &PayTable {
        &self.paytable
    }

    /// Evaluate a row-major grid (`cells[row][reel]`).
    pub fn evaluate(
        &self,
        cells: &[Vec<SymbolId>],
        paylines: &[Payline],
        bet_per_line: u64,
    ) -> SpinResult {
        let mut result = SpinResult::no_win(bet_per_line, paylines.len());

        for payline in paylines {
            if let Some(win) = self.evaluate_line(cells, payline, bet_per_line) {
                result.total_won = result.total_won.saturating_add(win.amount_won);
                result.wins.push(win);
            }
        }

        result
    }

    fn evaluate_line(
        &self,
        cells: &[Vec<SymbolId>],
        payline: &Payline,
        bet_per_line: u64,
    ) -> Option<WinEntry> {
        let line_symbols = line_symbols(cells, &payline.rows)?;
        let run_length = run_length(&line_symbols);
        if run_length < MIN_WINNING_RUN {
            return None;
        }

        let symbol = line_symbols[0];
        let multiplier = self.paytable.multiplier(symbol, run_length);
        if multiplier == 0 {
            return None;
        }

        Some(WinEntry {
            line_index: payline.index,
            payline: payline.rows.clone(),
            symbol,
            run_length,
            multiplier,
            amount_won: bet_per_line.saturating_mul(multiplier as u64),
            line_symbols,
        })
    }
}

/// Symbols along a payline, `None` if a row is off the grid.
pub fn line_symbols(cells: &[Vec<SymbolId>], rows: &[u8]) -> Option<Vec<SymbolId>> {
    rows.iter()
        .enumerate()
        .map(|(reel, &row)| cells.get(row as usize).and_then(|r| r.get(reel)).copied())
        .collect()
}

/// Length of the run of symbols equal to the first one.
pub fn run_length(symbols: &[SymbolId]) -> u8 {
    let Some(first) = symbols.first() else {
        return 0;
    };
    symbols.iter().take_while(|&s| s == first).count() as u8
}
