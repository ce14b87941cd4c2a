//! # reel-engine — Tick-Driven Slot Machine Engine
//!
//! A 5×3 (or any reels × rows) payline slot machine with a presentation-agnostic
//! core. The engine owns the bankroll, the grid and the spin state machine;
//! front-ends drive it one tick at a time and subscribe to events.
//!
//! ## Features
//!
//! - **Symbol Sources**: Independent weighted draw or circular reel strips
//! - **Cascading Stops**: Reels settle left to right on configured ticks
//! - **Payline Evaluation**: Left-anchored runs of 3+ paid from the paytable
//! - **Config Files**: Whole machines described in JSON or YAML
//! - **Timing Profiles**: Normal, Turbo, Studio (instant) timing modes
//!
//! ## Architecture
//!
//! ```text
//! MachineConfig ──build()──> Machine
//!                               │
//!     SpinEngine ───────────────┤
//!         │                     ├── SymbolSource (weighted | strips)
//!         │                     ├── PayoutEvaluator (PayTable)
//!         │                     ├── Vec<Payline>
//!         │                     └── TimingConfig
//!         │
//!         ├── request_spin ──> SpinSession (final stops chosen)
//!         ├── advance_tick ──> GridState ──> TickOutcome
//!         └── settle ────────> SpinResult
//!                 │
//!                 v
//!             EventBus → Receiver<SpinEvent>
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod grid;
pub mod paytable;
pub mod scheduler;
pub mod session;
pub mod shared;
pub mod source;
pub mod spin;
pub mod symbols;
pub mod timing;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use grid::*;
pub use paytable::*;
pub use scheduler::*;
pub use session::*;
pub use shared::*;
pub use source::*;
pub use spin::*;
pub use symbols::*;
pub use timing::*;
