//! Periodic, atomic persistence of the latest snapshot.
//!
//! # Responsibilities
//! - Receive snapshots through a single-slot channel (newest wins)
//! - Write the first snapshot as soon as it arrives
//! - Rewrite the latest snapshot on every interval tick
//! - Write atomically: temp file in the same directory, fsync, rename
//!
//! # Design Decisions
//! - The producer never blocks: `watch` overwrites an unconsumed value
//! - Re-writing an unchanged snapshot restores a deleted or truncated file
//! - Failures are logged and retried on the next tick

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, watch};
use tokio::time::{self, MissedTickBehavior};

use crate::dynamic::{render_yaml, RenderError, UnifiedConfiguration};
use crate::observability::metrics;

/// Producer side of the file sink's single slot.
pub type SnapshotSender = watch::Sender<Option<Arc<UnifiedConfiguration>>>;

/// Consumer side of the file sink's single slot.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<UnifiedConfiguration>>>;

/// Create an empty slot.
pub fn snapshot_slot() -> (SnapshotSender, SnapshotReceiver) {
    watch::channel(None)
}

/// Errors while persisting a snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes the aggregated configuration to a file on a fixed interval.
pub struct FileSink {
    path: PathBuf,
    interval: Duration,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
        }
    }

    /// Run until `shutdown` fires.
    pub async fn run(self, mut updates: SnapshotReceiver, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            path = %self.path.display(),
            interval = ?self.interval,
            "File sink starting"
        );

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut current: Option<Arc<UnifiedConfiguration>> = None;
        let mut updates_open = true;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("File sink received shutdown signal, exiting loop");
                    break;
                }
                changed = updates.changed(), if updates_open && current.is_none() => {
                    if changed.is_err() {
                        updates_open = false;
                        continue;
                    }
                    let first = updates.borrow_and_update().clone();
                    if let Some(snapshot) = first {
                        self.write_logged(&snapshot).await;
                        current = Some(snapshot);
                    }
                }
                _ = ticker.tick() => {
                    let latest = updates.borrow_and_update().clone();
                    if latest.is_some() {
                        current = latest;
                    }
                    if let Some(snapshot) = &current {
                        self.write_logged(snapshot).await;
                    }
                }
            }
        }
    }

    async fn write_logged(&self, snapshot: &UnifiedConfiguration) {
        match self.write(snapshot).await {
            Ok(()) => metrics::record_file_write(true),
            Err(e) => {
                metrics::record_file_write(false);
                tracing::error!(path = %self.path.display(), error = %e, "Failed to write config");
            }
        }
    }

    /// Atomically replace the output file with `snapshot`.
    pub async fn write(&self, snapshot: &UnifiedConfiguration) -> Result<(), PersistError> {
        let rendered = render_yaml(snapshot)?;

        let dir = self.directory();
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| PersistError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        let tmp_path = self.temp_path();
        if let Err(e) = write_synced(&tmp_path, rendered.as_bytes()).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(PersistError::Write {
                path: tmp_path,
                source: e,
            });
        }

        if let Err(source) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(PersistError::Rename {
                from: tmp_path,
                to: self.path.clone(),
                source,
            });
        }

        tracing::info!(
            path = %self.path.display(),
            routers = snapshot.routers.len(),
            services = snapshot.services.len(),
            "Wrote configuration to file"
        );
        Ok(())
    }

    fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Hidden sibling of the output file; same directory so rename is atomic.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "traefik-fed".to_string());
        self.directory().join(format!(".{name}.tmp"))
    }
}

async fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    Ok(())
}
