//! Thread-shareable engine handle
//!
//! The lock is taken once per tick and released while waiting, so a
//! front-end thread can read the grid or bankroll mid-spin.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Receiver;
use parking_lot::{Mutex, MutexGuard};

use crate::engine::{SpinEngine, SpinTicket};
use crate::error::SpinRejected;
use crate::events::SpinEvent;
use crate::grid::GridSnapshot;
use crate::scheduler::{RealTimeScheduler, TickScheduler};
use crate::spin::SpinResult;

#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<SpinEngine>>,
}

impl SharedEngine {
    pub fn new(engine: SpinEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Exclusive access. Keep the guard short-lived while a spin runs.
    pub fn lock(&self) -> MutexGuard<'_, SpinEngine> {
        self.inner.lock()
    }

    pub fn subscribe(&self) -> Receiver<SpinEvent> {
        self.inner.lock().subscribe()
    }

    pub fn current_bankroll(&self) -> u64 {
        self.inner.lock().current_bankroll()
    }

    pub fn snapshot(&self) -> GridSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn is_spinning(&self) -> bool {
        self.inner.lock().is_spinning()
    }

    /// Accept a spin on the calling thread, then tick it to settlement on a
    /// worker thread in real time. The lock is released between ticks.
    pub fn spawn_spin(
        &self,
        bet_per_line: u64,
        active_lines: usize,
    ) -> Result<(SpinTicket, JoinHandle<Option<SpinResult>>), SpinRejected> {
        let (ticket, interval) = {
            let mut engine = self.inner.lock();
            let ticket = engine.request_spin(bet_per_line, active_lines)?;
            (ticket, Duration::from_millis(engine.timing().tick_interval_ms))
        };

        let inner = Arc::clone(&self.inner);
        let handle = thread::spawn(move || {
            let mut scheduler = RealTimeScheduler;
            loop {
                let outcome = inner.lock().advance_tick();
                match outcome {
                    Some(o) if o.still_spinning => scheduler.wait(interval),
                    _ => break,
                }
            }
            inner.lock().settle()
        });

        Ok((ticket, handle))
    }
}
