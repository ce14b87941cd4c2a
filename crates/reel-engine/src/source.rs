//! Symbol sources: independent weighted draws or circular reel strips

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::error::{MachineError, MachineResult};
use crate::symbols::{ReelStrip, SymbolId, SymbolSet};

/// Draws symbols with probability proportional to their weight.
/// Calls are independent; nothing is remembered between them.
#[derive(Debug, Clone)]
pub struct WeightedDraw {
    ids: Vec<SymbolId>,
    weights: Vec<u32>,
    index: WeightedIndex<u32>,
}

impl WeightedDraw {
    pub fn new(ids: Vec<SymbolId>, weights: Vec<u32>) -> MachineResult<Self> {
        if ids.is_empty() {
            return Err(MachineError::invalid("weighted draw needs at least one symbol"));
        }
        if ids.len() != weights.len() {
            return Err(MachineError::invalid(format!(
                "{} symbols but {} weights",
                ids.len(),
                weights.len()
            )));
        }
        if let Some(pos) = weights.iter().position(|&w| w == 0) {
            return Err(MachineError::invalid(format!(
                "symbol {} has zero weight",
                ids[pos]
            )));
        }
        let index = WeightedIndex::new(weights.iter().copied())
            .map_err(|e| MachineError::invalid(format!("bad weights: {e}")))?;
        Ok(Self { ids, weights, index })
    }

    pub fn from_set(set: &SymbolSet) -> MachineResult<Self> {
        Self::new(set.ids(), set.weights())
    }

    /// Draw one symbol
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> SymbolId {
        self.ids[self.index.sample(rng)]
    }

    /// Selection probability of a symbol, 0.0 if unknown
    pub fn probability(&self, id: SymbolId) -> f64 {
        let total: u64 = self.weights.iter().map(|&w| w as u64).sum();
        self.ids
            .iter()
            .zip(&self.weights)
            .filter(|(s, _)| **s == id)
            .map(|(_, &w)| w as f64 / total as f64)
            .sum()
    }
}

/// `strip[(offset + row) mod len]`. Pure; no randomness at call time.
///
/// # Panics
/// If the strip is empty. Strips held by a [`SymbolSource`] never are.
pub fn strip_sample(strip: &ReelStrip, offset: usize, row: usize) -> SymbolId {
    let len = strip.symbols.len();
    strip.symbols[(offset % len + row % len) % len]
}

/// Uniform stop offset in `[0, strip_len)`.
pub fn random_stop<R: Rng + ?Sized>(strip_len: usize, rng: &mut R) -> usize {
    rng.random_range(0..strip_len.max(1))
}

/// Where grid symbols come from. Chosen once at configuration time.
#[derive(Debug, Clone)]
pub enum SymbolSource {
    /// Each cell drawn independently
    Weighted(WeightedDraw),
    /// One circular strip per reel, sampled through a stop offset
    Strips(Vec<ReelStrip>),
}

impl SymbolSource {
    /// Build a strip source, rejecting empty strips and a reel count mismatch.
    pub fn strips(strips: Vec<ReelStrip>, reels: usize) -> MachineResult<Self> {
        if strips.len() != reels {
            return Err(MachineError::invalid(format!(
                "{} reel strips for {} reels",
                strips.len(),
                reels
            )));
        }
        if let Some(strip) = strips.iter().find(|s| s.is_empty()) {
            return Err(MachineError::invalid(format!(
                "reel strip {} is empty",
                strip.reel_index
            )));
        }
        Ok(Self::Strips(strips))
    }

    pub fn is_strip_mode(&self) -> bool {
        matches!(self, Self::Strips(_))
    }

    /// Strip length for a reel (strip mode only)
    pub fn strip_len(&self, reel: usize) -> Option<usize> {
        match self {
            Self::Strips(strips) => strips.get(reel).map(ReelStrip::len),
            Self::Weighted(_) => None,
        }
    }

    /// Sample the strip of `reel` (strip mode only)
    pub fn sample(&self, reel: usize, offset: usize, row: usize) -> Option<SymbolId> {
        match self {
            Self::Strips(strips) => strips.get(reel).map(|s| strip_sample(s, offset, row)),
            Self::Weighted(_) => None,
        }
    }

    /// Uniform random stop for a reel; 0 in weighted mode.
    pub fn random_stop_for<R: Rng + ?Sized>(&self, reel: usize, rng: &mut R) -> usize {
        self.strip_len(reel).map(|len| random_stop(len, rng)).unwrap_or(0)
    }

    /// Independently drawn column of `rows` symbols (weighted mode only)
    pub fn draw_column<R: Rng + ?Sized>(&self, rows: usize, rng: &mut R) -> Option<Vec<SymbolId>> {
        match self {
            Self::Weighted(draw) => Some((0..rows).map(|_| draw.draw(rng)).collect()),
            Self::Strips(_) => None,
        }
    }
}
