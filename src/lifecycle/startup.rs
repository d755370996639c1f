//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics exporter
//! - Build the aggregator and the enabled sinks
//! - Bind the query listener before any task starts
//! - Run until a termination signal or a fatal server error
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A failing query server tears down the poller and file sink too
//! - Shutdown waits for the in-flight cycle; nothing is aborted

use std::future::Future;

use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};

use crate::aggregator::Aggregator;
use crate::config::FederationConfig;
use crate::http::{HttpServer, ServeError, SnapshotCache};
use crate::lifecycle::{signals, BuildInfo, Shutdown};
use crate::observability::metrics;
use crate::scheduler::{Poller, Sinks};
use crate::sink::{snapshot_slot, FileSink};
use crate::upstream::{build_http_client, UpstreamError, FETCH_TIMEOUT};

/// Errors that stop the process.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(String),

    #[error(transparent)]
    Serving(#[from] ServeError),

    #[error("task failed: {0}")]
    Task(#[from] JoinError),
}

/// Run the federator until SIGINT or SIGTERM.
pub async fn run(config: FederationConfig, build_info: BuildInfo) -> Result<(), StartupError> {
    run_until(config, build_info, signals::wait_for_termination()).await
}

/// Run the federator until `stop` resolves.
pub async fn run_until<F>(
    config: FederationConfig,
    build_info: BuildInfo,
    stop: F,
) -> Result<(), StartupError>
where
    F: Future<Output = ()>,
{
    if config.metrics.enabled {
        let addr = config
            .metrics
            .address
            .parse()
            .map_err(|e: std::net::AddrParseError| StartupError::Metrics(e.to_string()))?;
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let http = build_http_client(FETCH_TIMEOUT).map_err(StartupError::HttpClient)?;
    let aggregator = Aggregator::from_config(&config, http)?;

    let listener = if config.output.http.enabled {
        Some(HttpServer::bind(config.output.http.port).await?)
    } else {
        None
    };

    let shutdown = Shutdown::new();
    let mut sinks = Sinks::default();

    let server_task = listener.map(|listener| {
        let cache = SnapshotCache::new();
        sinks.query = Some(cache.clone());
        let server = HttpServer::new(&config.output.http.path, cache, build_info.clone());
        tokio::spawn(server.run(listener, shutdown.subscribe()))
    });

    let file_task = if config.output.file.enabled {
        let (slot, updates) = snapshot_slot();
        sinks.file = Some(slot);
        let sink = FileSink::new(&config.output.file.path, config.output.file.interval);
        Some(tokio::spawn(sink.run(updates, shutdown.subscribe())))
    } else {
        None
    };

    let poller = Poller::new(aggregator, config.server.poll_interval, sinks);
    let poller_task = tokio::spawn(poller.run(shutdown.subscribe()));

    tracing::info!(
        version = %build_info.version,
        upstreams = config.upstreams.len(),
        http_enabled = config.output.http.enabled,
        file_enabled = config.output.file.enabled,
        "Federator started"
    );

    tokio::pin!(stop);
    let outcome = match server_task {
        Some(mut task) => {
            tokio::select! {
                _ = &mut stop => {
                    tracing::info!("Shutting down");
                    shutdown.trigger();
                    server_outcome(task.await)
                }
                joined = &mut task => {
                    tracing::error!("HTTP server exited, shutting down");
                    shutdown.trigger();
                    server_outcome(joined)
                }
            }
        }
        None => {
            stop.await;
            tracing::info!("Shutting down");
            shutdown.trigger();
            Ok(())
        }
    };

    await_task("poller", poller_task).await;
    if let Some(task) = file_task {
        await_task("file sink", task).await;
    }

    outcome
}

fn server_outcome(joined: Result<Result<(), ServeError>, JoinError>) -> Result<(), StartupError> {
    match joined {
        Ok(result) => result.map_err(StartupError::from),
        Err(e) => Err(StartupError::Task(e)),
    }
}

async fn await_task(name: &'static str, task: JoinHandle<()>) {
    if let Err(e) = task.await {
        tracing::error!(task = name, error = %e, "Task ended abnormally");
    }
}
