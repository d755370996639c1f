//! Durable output of snapshots.
//!
//! # Data Flow
//! ```text
//! poller
//!     → watch slot (newest snapshot, never blocks)
//!     → file.rs (write on first arrival, then every interval)
//!     → <path> (rendered YAML, atomic rename)
//! ```

pub mod file;

pub use file::{snapshot_slot, FileSink, PersistError, SnapshotReceiver, SnapshotSender};
