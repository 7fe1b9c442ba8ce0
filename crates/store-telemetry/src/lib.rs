//! # Store Telemetry
//!
//! Log output for applications and tests built on `reactive-store`. The
//! store itself only emits `tracing` events; this crate installs the
//! subscriber that renders them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use store_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `reactive-store` | Service name on the startup event |
//! | `STORE_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `STORE_CONSOLE_OUTPUT` | `true` | Write events to stdout |
//! | `STORE_JSON_LOGS` | `false` | JSON instead of pretty output |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::{env_filter, TracingGuard};

use std::sync::Once;
use thiserror::Error;

#[doc(hidden)]
pub use tracing;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install the global subscriber.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let tracing = tracing_setup::init_tracing(&config, false)?;
    Ok(TelemetryGuard { _tracing: tracing })
}

static TEST_INIT: Once = Once::new();

/// Install a test-writer subscriber once per process. Later calls, and a
/// subscriber installed by someone else, are ignored.
pub fn init_for_tests() {
    TEST_INIT.call_once(|| {
        if let Err(err) = tracing_setup::init_tracing(&TelemetryConfig::for_testing(), true) {
            eprintln!("Test telemetry not installed: {err}");
        }
    });
}

/// Guard that keeps telemetry active.
#[derive(Debug)]
pub struct TelemetryGuard {
    _tracing: TracingGuard,
}

impl TelemetryGuard {
    pub fn service_name(&self) -> &str {
        self._tracing.service_name()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Span around a group of store operations.
///
/// # Example
///
/// ```rust
/// use store_telemetry::store_span;
///
/// let span = store_span!("turn", player = "X");
/// let _entered = span.enter();
/// ```
#[macro_export]
macro_rules! store_span {
    ($name:expr) => {
        $crate::tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        $crate::tracing::info_span!($name, $($field)*)
    };
}
