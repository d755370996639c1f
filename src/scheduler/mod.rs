//! Poll cadence.
//!
//! # State Machine
//! ```text
//! Idle → Aggregating → Publishing → Idle → ...
//!   any state --shutdown--> Terminated (after the current cycle)
//! ```
//!
//! # Design Decisions
//! - One cycle at a time; the next tick waits for the current cycle
//! - Publication is fire-and-forget: sinks apply their own drop policy

pub mod poller;

pub use poller::{Poller, SchedulerState, Sinks};
