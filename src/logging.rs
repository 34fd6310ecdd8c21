// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Logging for the Taichi AOT bindings.
//!
//! Everything the binding emits goes through `tracing` under a small set of
//! targets, so a host application can filter them with `RUST_LOG`:
//!
//! | Target | Content |
//! |--------|---------|
//! | `taichi_aot::ffi` | Every native call (trace), error-channel reports (debug) |
//! | `taichi_aot::loader` | Library discovery and loading |
//! | `taichi_aot::launch` | Kernel and compute-graph launches, argument staging |
//! | `taichi_aot::device` | Arch selection and CPU fallback |
//!
//! The binding never installs a subscriber on its own. Applications that do
//! not configure `tracing` themselves can call [`init_logging`].

use std::sync::Once;

/// Target carrying one trace event per native call.
pub const FFI_TARGET: &str = "taichi_aot::ffi";

/// Subscriber settings for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for every target when `RUST_LOG` is not set.
    pub level: LogLevel,
    /// Separate level for [`FFI_TARGET`]; `None` inherits `level`.
    pub ffi_level: Option<LogLevel>,
    /// Prefix events with a timestamp.
    pub timestamps: bool,
    /// Print the event target (`taichi_aot::launch`, ...).
    pub show_targets: bool,
    /// Print source file and line.
    pub source_location: bool,
    /// Colorize output.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            ffi_level: None,
            timestamps: true,
            show_targets: true,
            source_location: false,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Default settings: warnings and errors only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level for every target.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set a separate level for native-call events.
    #[must_use]
    pub fn with_ffi_level(mut self, level: LogLevel) -> Self {
        self.ffi_level = Some(level);
        self
    }

    /// Toggle the timestamp prefix.
    #[must_use]
    pub fn with_timestamps(mut self, enable: bool) -> Self {
        self.timestamps = enable;
        self
    }

    /// Toggle ANSI colors.
    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.ansi = enable;
        self
    }

    /// Enable or disable file and line output.
    #[must_use]
    pub fn with_source_location(mut self, enable: bool) -> Self {
        self.source_location = enable;
        self
    }

    /// `EnvFilter` directive used when `RUST_LOG` is unset, e.g.
    /// `info,taichi_aot::ffi=warn`.
    #[must_use]
    pub fn filter_directive(&self) -> String {
        match self.ffi_level {
            Some(ffi) => format!("{},{FFI_TARGET}={}", self.level.as_filter_str(), ffi.as_filter_str()),
            None => self.level.as_filter_str().to_string(),
        }
    }

    /// Every native call at trace level, everything else at debug, with
    /// source locations. For chasing a misbehaving deployment.
    #[must_use]
    pub fn ffi_trace() -> Self {
        Self::new()
            .with_level(LogLevel::Debug)
            .with_ffi_level(LogLevel::Trace)
            .with_source_location(true)
    }

    /// Service defaults: info for the binding, native calls silenced below
    /// warn, plain output for log collectors.
    #[must_use]
    pub fn production() -> Self {
        Self {
            show_targets: false,
            ..Self::new()
                .with_level(LogLevel::Info)
                .with_ffi_level(LogLevel::Warn)
                .with_ansi(false)
        }
    }

    /// Compact output for test harnesses.
    #[must_use]
    pub fn testing() -> Self {
        Self {
            show_targets: false,
            ..Self::new().with_timestamps(false).with_ansi(false)
        }
    }
}

/// Verbosity threshold, mirroring `tracing::Level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Failed native calls and leaked staging.
    Error,
    /// CPU fallback and other degraded paths.
    #[default]
    Warn,
    /// Library loading and runtime creation.
    Info,
    /// Staging, launches and error-channel reports.
    Debug,
    /// All messages including per-call FFI trace.
    Trace,
}

impl LogLevel {
    /// Directive spelling understood by `EnvFilter`.
    fn as_filter_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Parse a level name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

static INIT_LOGGING: Once = Once::new();

/// Install a global `tracing` subscriber.
///
/// Only the first call has an effect. `RUST_LOG` takes precedence over
/// [`LogConfig::filter_directive`].
///
/// ## Example
///
/// ```rust
/// use taichi_aot::{init_logging, LogConfig};
///
/// init_logging(&LogConfig::testing());
/// ```
pub fn init_logging(config: &LogConfig) {
    INIT_LOGGING.call_once(|| {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.filter_directive());

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(config.ansi)
            .with_target(config.show_targets)
            .with_file(config.source_location)
            .with_line_number(config.source_location);

        // A subscriber installed by the host application wins.
        if config.timestamps {
            let _ = builder.try_init();
        } else {
            let _ = builder.without_time().try_init();
        }
    });
}

/// Record one native call at trace level.
pub fn log_native_call(symbol: &'static str) {
    tracing::trace!(target: FFI_TARGET, symbol, "native call");
}

/// Record the host-to-device staging of launch arguments.
pub fn log_staging(array_count: usize, total_bytes: usize) {
    tracing::debug!(
        target: "taichi_aot::launch",
        array_count,
        total_bytes,
        "staged ND-array arguments"
    );
}

/// Record a kernel or compute-graph launch.
pub fn log_launch(kind: &'static str, arg_count: usize) {
    tracing::debug!(target: "taichi_aot::launch", kind, arg_count, "launch");
}

pub use tracing::{debug, error, info, trace, warn};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_quiet() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.ffi_level, None);
        assert_eq!(config.filter_directive(), "warn");
    }

    #[test]
    fn test_ffi_level_directive() {
        let config = LogConfig::new()
            .with_level(LogLevel::Info)
            .with_ffi_level(LogLevel::Trace)
            .with_timestamps(false);
        assert_eq!(config.filter_directive(), "info,taichi_aot::ffi=trace");
        assert!(!config.timestamps);
    }

    #[test]
    fn test_presets() {
        let ffi = LogConfig::ffi_trace();
        assert_eq!(ffi.ffi_level, Some(LogLevel::Trace));
        assert!(ffi.source_location);

        let prod = LogConfig::production();
        assert_eq!(prod.filter_directive(), "info,taichi_aot::ffi=warn");
        assert!(!prod.ansi && !prod.show_targets);

        let test = LogConfig::testing();
        assert!(!test.timestamps);
        assert_eq!(test.level, LogLevel::Warn);
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::from_name("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_name("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_name("verbose"), None);
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(&LogConfig::testing());
        init_logging(&LogConfig::ffi_trace());
        log_native_call("ti_wait");
    }
}
