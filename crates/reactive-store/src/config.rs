//! Store configuration
//!
//! # Example
//!
//! ```
//! use reactive_store::config::StoreConfigBuilder;
//! use reactive_store::DiagnosticMode;
//!
//! let config = StoreConfigBuilder::new()
//!     .mode(DiagnosticMode::DevLite)
//!     .log_dispatches(false)
//!     .build();
//! assert_eq!(config.mode, DiagnosticMode::DevLite);
//! ```

use serde::{Deserialize, Serialize};
use std::env;

use crate::domain::DiagnosticMode;

/// Store configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Initial diagnostic mode (changeable later with a `mode` command)
    pub mode: DiagnosticMode,
    /// Emit per-step `debug!` events while dispatching in dev/devlite mode
    pub log_dispatches: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: DiagnosticMode::Dev,
            log_dispatches: true,
        }
    }
}

impl StoreConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `STORE_DIAGNOSTIC_MODE`: `dev`, `devlite`, anything else is action-only (default: dev)
    /// - `STORE_LOG_DISPATCHES`: Per-step dispatch logging (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mode: env::var("STORE_DIAGNOSTIC_MODE")
                .ok()
                .and_then(|mode| mode.parse().ok())
                .unwrap_or(defaults.mode),
            log_dispatches: env::var("STORE_LOG_DISPATCHES")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.log_dispatches),
        }
    }

    /// Quiet configuration for tests: full history, no per-step logging.
    pub fn for_testing() -> Self {
        Self {
            mode: DiagnosticMode::Dev,
            log_dispatches: false,
        }
    }
}

/// Builder for [`StoreConfig`]
#[derive(Default)]
pub struct StoreConfigBuilder {
    mode: Option<DiagnosticMode>,
    log_dispatches: Option<bool>,
}

impl StoreConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: DiagnosticMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn log_dispatches(mut self, enabled: bool) -> Self {
        self.log_dispatches = Some(enabled);
        self
    }

    /// Every combination is valid, so this cannot fail.
    pub fn build(self) -> StoreConfig {
        let defaults = StoreConfig::default();
        StoreConfig {
            mode: self.mode.unwrap_or(defaults.mode),
            log_dispatches: self.log_dispatches.unwrap_or(defaults.log_dispatches),
        }
    }
}
