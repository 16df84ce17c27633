//! Structured session logging and tracing setup.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use crate::error::{WorkerError, WorkerResult};

/// Initialize tracing with colored output for dev, JSON for production.
///
/// Logs go to stderr; stdout carries frame reports.
pub fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("proctor=info"));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

/// Serve Prometheus metrics on `0.0.0.0:port`.
pub fn install_metrics_exporter(port: u16) -> WorkerResult<SocketAddr> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::metrics_failed(e.to_string()))?;
    Ok(addr)
}

/// Session logger stamping every lifecycle line with the session id.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    source: String,
    started_at: DateTime<Utc>,
}

impl SessionLogger {
    /// Create a logger for a new session reading from `source`.
    pub fn new(source: &str) -> Self {
        Self::with_id(&Uuid::new_v4().to_string(), source)
    }

    pub fn with_id(session_id: &str, source: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            source: source.to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn log_start(&self) {
        info!(
            session_id = %self.session_id,
            source = %self.source,
            started_at = %self.started_at.to_rfc3339(),
            "Session started"
        );
    }

    /// Log a change in the displayed alerts.
    pub fn log_alerts(&self, timestamp: f64, alerts: &[String]) {
        if alerts.is_empty() {
            info!(session_id = %self.session_id, timestamp, "Alerts cleared");
        } else {
            info!(
                session_id = %self.session_id,
                timestamp,
                alerts = %alerts.join(", "),
                "Alerts displayed"
            );
        }
    }

    /// Log a skipped input line.
    pub fn log_skipped(&self, line: u64, reason: &str) {
        warn!(
            session_id = %self.session_id,
            line,
            "Skipping frame: {}", reason
        );
    }

    pub fn log_completion(&self, frames: u64, skipped: u64, alerts: u64) {
        let elapsed = Utc::now() - self.started_at;
        info!(
            session_id = %self.session_id,
            source = %self.source,
            frames,
            skipped,
            alerts,
            elapsed_ms = elapsed.num_milliseconds(),
            "Session completed"
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Create a tracing span for this session.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "session",
            session_id = %self.session_id,
            source = %self.source
        )
    }
}
