//! Telemetry for tandem binaries.
//!
//! Provides:
//! - A Prometheus recorder for the `tandem_*` counters
//! - Compact console tracing filtered by `RUST_LOG`
//!
//! # Usage
//!
//! ```ignore
//! use tandem_common::telemetry::{self, TelemetryConfig};
//!
//! telemetry::init(TelemetryConfig::from_env("tandem"));
//! metrics::counter!("tandem_ops_published_total").increment(1);
//! println!("{}", telemetry::render());
//! ```

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line.
    pub service_name: String,
    /// Console log level when `RUST_LOG` is unset.
    pub console_level: Level,
    /// Write logs to stderr so stdout stays free for document output.
    pub stderr: bool,
}

impl TelemetryConfig {
    /// Defaults: DEBUG in debug builds, WARN otherwise, logging to stderr.
    ///
    /// - `RUST_LOG`: standard env filter (optional, overrides console_level)
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::WARN
        };

        Self {
            service_name: service_name.into(),
            console_level,
            stderr: true,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.console_level = level;
        self
    }
}

/// Initialize telemetry (metrics + tracing). Call once at startup.
pub fn init(config: TelemetryConfig) {
    init_metrics();
    init_tracing(&config);
}

/// Install the prometheus recorder as the global `metrics` recorder.
///
/// If another recorder is already installed the handle still renders, just
/// without anything recorded through the facade.
pub fn init_metrics() -> &'static PrometheusHandle {
    PROMETHEUS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("a metrics recorder was already installed");
        }
        handle
    })
}

fn init_tracing(config: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.console_level.as_str().to_lowercase()));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(if config.stderr {
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stderr)
        } else {
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stdout)
        })
        .compact()
        .with_filter(env_filter);

    if tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(service = %config.service_name, "telemetry initialized");
    }
}

/// Get the prometheus handle, installing the recorder on first use.
pub fn handle() -> &'static PrometheusHandle {
    init_metrics()
}

/// Render metrics in prometheus text format.
pub fn render() -> String {
    handle().render()
}

pub use metrics::{counter, gauge, histogram};
