//! Tick pacing
//!
//! The engine has no clock. A [`TickScheduler`] decides how long to wait
//! between ticks, so the same spin loop runs in real time for a front-end
//! and instantly under test.

use std::thread;
use std::time::Duration;

use crate::engine::{SpinEngine, TickOutcome};
use crate::spin::SpinResult;

/// Waits between animation ticks
pub trait TickScheduler {
    fn wait(&mut self, interval: Duration);
}

/// Sleeps the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeScheduler;

impl TickScheduler for RealTimeScheduler {
    fn wait(&mut self, interval: Duration) {
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
}

/// Never waits; remembers what it was asked to wait
#[derive(Debug, Clone, Default)]
pub struct ImmediateScheduler {
    waits: Vec<Duration>,
}

impl ImmediateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    /// Sum of all requested waits
    pub fn total_waited(&self) -> Duration {
        self.waits.iter().sum()
    }
}

impl TickScheduler for ImmediateScheduler {
    fn wait(&mut self, interval: Duration) {
        self.waits.push(interval);
    }
}

/// Drive an accepted spin to settlement.
///
/// Ticks the engine, calling `on_tick` after each one and waiting one tick
/// interval between ticks. Returns `None` if no spin was in flight.
pub fn run_spin<S, F>(engine: &mut SpinEngine, scheduler: &mut S, mut on_tick: F) -> Option<SpinResult>
where
    S: TickScheduler + ?Sized,
    F: FnMut(&TickOutcome),
{
    let interval = Duration::from_millis(engine.timing().tick_interval_ms);
    while let Some(outcome) = engine.advance_tick() {
        on_tick(&outcome);
        if !outcome.still_spinning {
            break;
        }
        scheduler.wait(interval);
    }
    engine.settle()
}
