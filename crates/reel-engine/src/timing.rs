//! Spin animation timing profiles
//!
//! All values are presentation feel constants. Nothing here affects the
//! outcome of a spin, only how long the reels visibly turn.

use serde::{Deserialize, Serialize};

use crate::error::{MachineError, MachineResult};

/// Timing profile for the spin animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingProfile {
    /// Normal gameplay timing
    #[default]
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// Studio mode (no delay, short spins, for tests and batch play)
    Studio,
    /// Anything hand-tuned or scaled
    Custom,
}

/// Tick-based timing configuration.
///
/// Reel `i` stops at tick `base_stop_tick + i * stop_tick_gap`, so reels
/// settle left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Delay between animation ticks (ms)
    pub tick_interval_ms: u64,

    /// Tick at which reel 0 stops
    pub base_stop_tick: u32,

    /// Ticks between consecutive reel stops (> 0)
    pub stop_tick_gap: u32,

    /// Strip positions advanced per tick, per reel. Reels past the end of
    /// the list reuse the last entry.
    pub reel_speeds: Vec<usize>,
}

impl TimingConfig {
    /// Normal gameplay timing for strip mode
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            tick_interval_ms: 45,
            base_stop_tick: 22,
            stop_tick_gap: 3,
            reel_speeds: vec![3, 4, 5, 4, 3],
        }
    }

    /// Timing of the classic weighted-draw machine
    pub fn classic_weighted() -> Self {
        Self {
            profile: TimingProfile::Custom,
            tick_interval_ms: 60,
            base_stop_tick: 10,
            stop_tick_gap: 2,
            reel_speeds: vec![1],
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            tick_interval_ms: 30,
            base_stop_tick: 8,
            stop_tick_gap: 1,
            reel_speeds: vec![5, 6, 7, 6, 5],
        }
    }

    /// Studio mode
    pub fn studio() -> Self {
        Self {
            profile: TimingProfile::Studio,
            tick_interval_ms: 0,
            base_stop_tick: 2,
            stop_tick_gap: 1,
            reel_speeds: vec![1],
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Studio => Self::studio(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale tick durations by factor (< 1.0 = faster). Tick counts are unchanged.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            profile: TimingProfile::Custom,
            tick_interval_ms: (self.tick_interval_ms as f64 * factor.max(0.0)).round() as u64,
            ..self.clone()
        }
    }

    /// Stop tick per reel, strictly increasing for a validated config.
    /// Saturates at `u32::MAX`; `validate` rejects configs that get there.
    pub fn stop_ticks(&self, reels: usize) -> Vec<u32> {
        (0..reels as u32)
            .map(|i| {
                self.base_stop_tick
                    .saturating_add(i.saturating_mul(self.stop_tick_gap))
            })
            .collect()
    }

    /// Last stop tick plus one, `None` if it does not fit in a `u32`
    fn checked_total_ticks(&self, reels: usize) -> Option<u32> {
        let last = u32::try_from(reels.saturating_sub(1)).ok()?;
        self.base_stop_tick
            .checked_add(last.checked_mul(self.stop_tick_gap)?)?
            .checked_add(1)
    }

    /// Offset increment per tick for a reel
    pub fn speed_for(&self, reel: usize) -> usize {
        self.reel_speeds
            .get(reel)
            .or_else(|| self.reel_speeds.last())
            .copied()
            .unwrap_or(1)
    }

    /// Number of `advance_tick` calls a spin takes (last stop tick + 1)
    pub fn total_ticks(&self, reels: usize) -> u32 {
        self.stop_ticks(reels)
            .last()
            .map(|&t| t.saturating_add(1))
            .unwrap_or(1)
    }

    /// Wall-clock length of a spin (ms)
    pub fn spin_duration_ms(&self, reels: usize) -> u64 {
        (self.total_ticks(reels).saturating_sub(1) as u64).saturating_mul(self.tick_interval_ms)
    }

    /// Check the timing can drive `reels` reels
    pub fn validate(&self, reels: usize) -> MachineResult<()> {
        if self.stop_tick_gap == 0 {
            return Err(MachineError::invalid("stop_tick_gap must be positive"));
        }
        if self.reel_speeds.is_empty() {
            return Err(MachineError::invalid("reel_speeds is empty"));
        }
        if self.reel_speeds.contains(&0) {
            return Err(MachineError::invalid("reel speeds must be positive"));
        }
        if self.checked_total_ticks(reels).is_none() {
            return Err(MachineError::invalid(format!(
                "stop ticks overflow: base {} + gap {} over {} reels",
                self.base_stop_tick, self.stop_tick_gap, reels
            )));
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}
