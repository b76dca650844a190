//! Process-wide request counters and the debug service that exposes them.
//!
//! [`Metrics`] is created once at startup and handed to the metrics
//! middleware. Every update is mirrored to the `metrics` facade, so when a
//! Prometheus recorder is installed the same numbers show up on `/metrics`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Context;
use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;

/// The live task count is sampled once every this many requests.
pub const SAMPLE_EVERY: u64 = 100;

#[derive(Debug, Default)]
pub struct Metrics {
    requests: AtomicU64,
    errors: AtomicU64,
    tasks: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub tasks: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request and returns the new total.
    pub fn add_request(&self) -> u64 {
        counter!("requests_total").increment(1);
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Counts one failed request and returns the new total.
    pub fn add_error(&self) -> u64 {
        counter!("errors_total").increment(1);
        self.errors.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Records the number of tasks alive on the current tokio runtime.
    pub fn sample_tasks(&self) -> u64 {
        let alive = tokio::runtime::Handle::try_current()
            .map(|handle| handle.metrics().num_alive_tasks() as u64)
            .unwrap_or(0);

        self.tasks.store(alive, Ordering::Relaxed);
        gauge!("tasks_alive").set(alive as f64);
        alive
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            tasks: self.tasks.load(Ordering::Relaxed),
        }
    }
}

/// Installs the global Prometheus recorder with its upkeep task.
///
/// Returns `None` when observability is disabled.
pub fn init_prometheus(enabled: bool) -> anyhow::Result<Option<PrometheusHandle>> {
    if !enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("installing prometheus recorder")?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

#[derive(Serialize)]
struct DebugVars {
    build: String,
    #[serde(flatten)]
    counters: MetricsSnapshot,
}

/// Router for the debug listener: `/debug/vars` and `/metrics`.
pub fn debug_router(
    build: impl Into<String>,
    metrics: Arc<Metrics>,
    prometheus: Option<PrometheusHandle>,
) -> Router {
    let build = build.into();

    Router::new()
        .route(
            "/debug/vars",
            get(move || async move {
                Json(DebugVars {
                    build,
                    counters: metrics.snapshot(),
                })
            }),
        )
        .route(
            "/metrics",
            get(move || async move {
                match prometheus {
                    Some(handle) => handle.render().into_response(),
                    None => (StatusCode::NOT_FOUND, "metrics export disabled").into_response(),
                }
            }),
        )
}
