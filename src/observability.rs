//! Structured logging setup and dispatcher counters.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log format options for structured logging
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Structured JSON output for log aggregators
    Json,
    /// Human-readable format for development
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

/// Logging configuration.
///
/// # Example
///
/// ```rust,no_run
/// use svcbridge::{init_logging, LogFormat, ObservabilityConfig};
///
/// let config = ObservabilityConfig {
///     log_format: LogFormat::Compact,
///     log_level: "debug".to_string(),
/// };
/// let _ = init_logging(&config);
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log output format
    pub log_format: LogFormat,
    /// Log level filter applied to this crate's targets (e.g. "info",
    /// "debug"); `RUST_LOG` overrides it when set
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_format: LogFormat::Compact, log_level: "info".to_string() }
    }
}

fn default_filter_expression(level: &str) -> String {
    format!("warn,svcbridge={level}")
}

/// Install the global tracing subscriber. Fails with a message when one is
/// already set; callers that share a process with other subscribers ignore
/// the error.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter_expression(&config.log_level)));

    match config.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .map_err(|e| format!("Failed to initialize JSON logging: {e}"))?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .try_init()
                .map_err(|e| format!("Failed to initialize pretty logging: {e}"))?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .try_init()
                .map_err(|e| format!("Failed to initialize compact logging: {e}"))?;
        }
    }

    Ok(())
}

/// Point-in-time dispatcher counters for tests and diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherMetrics {
    /// Requests accepted by `submit`.
    pub submitted: u64,
    /// Responses matched to a pending entry and fanned out.
    pub delivered: u64,
    /// Responses dropped because no pending entry matched their id.
    pub dropped_unmatched: u64,
}

/// Counters backing [`DispatcherMetrics`]. Updated with relaxed ordering;
/// exact cross-counter consistency is not needed.
#[derive(Debug, Default)]
pub(crate) struct MetricsCounters {
    pub submitted: AtomicU64,
    pub delivered: AtomicU64,
    pub dropped_unmatched: AtomicU64,
}

impl MetricsCounters {
    pub fn snapshot(&self) -> DispatcherMetrics {
        DispatcherMetrics {
            submitted: self.submitted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped_unmatched: self.dropped_unmatched.load(Ordering::Relaxed),
        }
    }
}
