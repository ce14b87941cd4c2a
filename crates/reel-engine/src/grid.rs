//! Visible symbol grid

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::source::SymbolSource;
use crate::symbols::{SymbolId, SymbolSet};

/// Rows × reels symbol matrix plus, in strip mode, the stop offset of each reel.
///
/// Cells are row-major: `cells[row][reel]`, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    rows: usize,
    reels: usize,
    cells: Vec<Vec<SymbolId>>,
    offsets: Vec<usize>,
}

impl GridState {
    pub fn new(rows: usize, reels: usize, fill: SymbolId) -> Self {
        Self {
            rows,
            reels,
            cells: vec![vec![fill; reels]; rows],
            offsets: vec![0; reels],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn reels(&self) -> usize {
        self.reels
    }

    pub fn cells(&self) -> &[Vec<SymbolId>] {
        &self.cells
    }

    /// Current stop offset per reel (all zero in weighted mode)
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn at(&self, row: usize, reel: usize) -> Option<SymbolId> {
        self.cells.get(row).and_then(|r| r.get(reel)).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[SymbolId]> {
        self.cells.get(row).map(Vec::as_slice)
    }

    pub fn column(&self, reel: usize) -> Vec<SymbolId> {
        self.cells.iter().filter_map(|r| r.get(reel).copied()).collect()
    }

    /// Render every reel from strip offsets. Deterministic given the offsets.
    /// Offsets are stored reduced modulo their strip length. No-op in weighted mode.
    pub fn render_from_offsets(&mut self, offsets: &[usize], source: &SymbolSource) {
        for reel in 0..self.reels {
            let Some(len) = source.strip_len(reel) else {
                continue;
            };
            let offset = offsets.get(reel).copied().unwrap_or(0) % len;
            self.offsets[reel] = offset;
            for row in 0..self.rows {
                if let Some(symbol) = source.sample(reel, offset, row) {
                    self.cells[row][reel] = symbol;
                }
            }
        }
    }

    /// Re-render from the offsets already stored
    pub fn rerender(&mut self, source: &SymbolSource) {
        let offsets = self.offsets.clone();
        self.render_from_offsets(&offsets, source);
    }

    /// Set one offset without rendering
    pub fn set_offset(&mut self, reel: usize, offset: usize) {
        if let Some(slot) = self.offsets.get_mut(reel) {
            *slot = offset;
        }
    }

    /// Overwrite one reel's visible symbols (weighted mode)
    pub fn set_column(&mut self, reel: usize, symbols: &[SymbolId]) {
        for (row, &symbol) in symbols.iter().enumerate().take(self.rows) {
            if let Some(cell) = self.cells[row].get_mut(reel) {
                *cell = symbol;
            }
        }
    }

    /// New random grid: a uniform stop per reel in strip mode, or
    /// independent draws for every cell in weighted mode.
    pub fn randomize_full<R: Rng + ?Sized>(&mut self, source: &SymbolSource, rng: &mut R) {
        match source {
            SymbolSource::Strips(_) => {
                let offsets: Vec<usize> = (0..self.reels)
                    .map(|reel| source.random_stop_for(reel, rng))
                    .collect();
                self.render_from_offsets(&offsets, source);
            }
            SymbolSource::Weighted(_) => {
                for reel in 0..self.reels {
                    if let Some(column) = source.draw_column(self.rows, rng) {
                        self.set_column(reel, &column);
                    }
                }
            }
        }
    }

    /// Read-only copy for front-ends
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            cells: self.cells.clone(),
            offsets: self.offsets.clone(),
        }
    }
}

/// Owned copy of the grid after a tick, reset or settle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// `cells[row][reel]`
    pub cells: Vec<Vec<SymbolId>>,
    /// Stop offset per reel
    pub offsets: Vec<usize>,
}

impl GridSnapshot {
    pub fn at(&self, row: usize, reel: usize) -> Option<SymbolId> {
        self.cells.get(row).and_then(|r| r.get(reel)).copied()
    }

    /// Rows top to bottom using symbol glyphs, cells separated by spaces.
    pub fn render(&self, set: &SymbolSet) -> String {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&id| set.glyph(id))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for GridSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = row.iter().map(|s| s.0.to_string()).collect();
            write!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
