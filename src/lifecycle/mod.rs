//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Metrics → Aggregator → Bind listener → Spawn tasks
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Tasks finish current work → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - Build info is created once and passed explicitly

pub mod build_info;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use build_info::BuildInfo;
pub use shutdown::Shutdown;
pub use startup::{run, run_until, StartupError};
