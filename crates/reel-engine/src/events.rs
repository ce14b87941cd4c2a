//! One-way spin notifications for front-ends
//!
//! The engine never calls into presentation code. Front-ends subscribe and
//! receive owned events over a channel.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::SpinRejected;
use crate::grid::GridSnapshot;
use crate::spin::SpinResult;
use crate::symbols::SymbolId;

/// Something that happened during play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpinEvent {
    /// Stake debited, reels turning
    SpinStarted {
        spin_id: u64,
        bet_per_line: u64,
        active_lines: usize,
        stake: u64,
        bankroll: u64,
    },
    /// Grid after an animation tick
    Tick {
        spin_id: u64,
        tick: u32,
        snapshot: GridSnapshot,
    },
    /// A reel reached its final position
    ReelStopped {
        spin_id: u64,
        reel_index: usize,
        symbols: Vec<SymbolId>,
    },
    /// Payout evaluated and credited
    Settled {
        spin_id: u64,
        result: SpinResult,
        bankroll: u64,
    },
    /// A spin request was refused
    Rejected { reason: String },
    /// Defaults restored and grid re-randomized
    Reset { bankroll: u64, snapshot: GridSnapshot },
}

impl SpinEvent {
    pub fn rejected(reason: SpinRejected) -> Self {
        Self::Rejected {
            reason: reason.to_string(),
        }
    }

    /// Get event type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SpinStarted { .. } => "SPIN_STARTED",
            Self::Tick { .. } => "TICK",
            Self::ReelStopped { .. } => "REEL_STOPPED",
            Self::Settled { .. } => "SETTLED",
            Self::Rejected { .. } => "REJECTED",
            Self::Reset { .. } => "RESET",
        }
    }
}

/// Events buffered per subscriber before new ones are dropped
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Fan-out of events to any number of subscribers
#[derive(Debug)]
pub struct EventBus {
    subscribers: Vec<Sender<SpinEvent>>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus whose subscribers each buffer at most `capacity` events (min 1)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// New receiver for all future events.
    ///
    /// Each receiver buffers up to [`capacity`](Self::capacity) events. While
    /// its buffer is full, further events for it are dropped and the
    /// subscription stays open. Drain regularly.
    pub fn subscribe(&mut self) -> Receiver<SpinEvent> {
        let (tx, rx) = bounded(self.capacity);
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver to every live subscriber without blocking. Dropped receivers
    /// are forgotten.
    pub fn publish(&mut self, event: SpinEvent) {
        if self.subscribers.is_empty() {
            return;
        }
        self.subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                debug!("subscriber lagging, dropped {}", dropped.type_name());
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.publish(SpinEvent::rejected(SpinRejected::SpinInProgress));

        assert_eq!(a.try_recv().unwrap().type_name(), "REJECTED");
        assert_eq!(b.try_recv().unwrap().type_name(), "REJECTED");
    }

    #[test]
    fn test_dropped_subscriber_pruned() {
        let mut bus = EventBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        bus.publish(SpinEvent::rejected(SpinRejected::SpinInProgress));

        assert_eq!(bus.subscriber_count(), 1);
        assert!(keep.try_recv().is_ok());
    }

    #[test]
    fn test_full_subscriber_drops_events_and_stays_subscribed() {
        let mut bus = EventBus::with_capacity(2);
        let rx = bus.subscribe();
        for _ in 0..5 {
            bus.publish(SpinEvent::rejected(SpinRejected::SpinInProgress));
        }

        assert_eq!(rx.try_iter().count(), 2);
        assert_eq!(bus.subscriber_count(), 1);

        let refused = SpinRejected::InsufficientFunds { stake: 10, bankroll: 4 };
        bus.publish(SpinEvent::rejected(refused));
        assert_eq!(rx.try_recv().unwrap(), SpinEvent::rejected(refused));
    }

    #[test]
    fn test_capacity_defaults_and_floor() {
        let bus = EventBus::new();
        assert_eq!(bus.capacity(), DEFAULT_EVENT_CAPACITY);
        assert_eq!(EventBus::with_capacity(0).capacity(), 1);
    }
}
