//! Logging configuration for graph-injector
//!
//! Sets up a `tracing-subscriber` for the resolver, proxy and handler logs.
//! Everything the crate emits uses the `graph_injector` target.
//!
//! # Features
//!
//! - `logging` - Emit `tracing` events (default)
//! - `logging-json` - JSON structured output (recommended for production)
//! - `logging-pretty` - Colorful multi-line output (recommended for development)
//!
//! Without `logging-json` or `logging-pretty` the `init*` functions are no-ops
//! and the application is expected to install its own subscriber.
//!
//! # Example
//!
//! ```rust,ignore
//! use graph_injector::logging;
//!
//! // Default format for the enabled feature
//! logging::init();
//!
//! // Only this crate's events, level taken from RUST_LOG when set
//! logging::builder()
//!     .injector_only()
//!     .from_env()
//!     .compact()
//!     .init();
//! ```

use tracing::Level;

/// Target used by every event this crate emits
pub const TARGET: &str = "graph_injector";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (production default)
    #[default]
    Json,
    /// Pretty colorful output (development)
    Pretty,
    /// Compact single-line output
    Compact,
}

/// Builder for logging configuration
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    from_env: bool,
    source_location: bool,
    thread_info: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            from_env: false,
            source_location: false,
            thread_info: false,
        }
    }
}

impl LoggingBuilder {
    /// Create a new logging builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Filter to only show logs from a specific target
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show graph-injector logs
    pub fn injector_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    /// Prefer the `RUST_LOG` directives when the variable is set
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Tag each event with the file and line that emitted it
    pub fn with_source_location(mut self) -> Self {
        self.source_location = true;
        self
    }

    /// Tag each event with the emitting thread's id and name
    pub fn with_thread_info(mut self) -> Self {
        self.thread_info = true;
        self
    }

    /// Use JSON structured logging format
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use pretty colorful logging format
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Use compact single-line logging format
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Filter directive built from level and target, e.g. `graph_injector=debug`
    fn directive(&self) -> String {
        let level = self.level.to_string().to_ascii_lowercase();
        match self.target {
            Some(target) => format!("{target}={level}"),
            None => level,
        }
    }

    /// Install the subscriber as the global default.
    ///
    /// Returns `false` if a global subscriber was already installed, which
    /// leaves that subscriber in place. Requires either `logging-json` or
    /// `logging-pretty`.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn try_init(self) -> bool {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = if self.from_env {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()))
        } else {
            EnvFilter::new(self.directive())
        };

        let layer = fmt::layer()
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_thread_ids(self.thread_info)
            .with_thread_names(self.thread_info)
            .with_target(true);

        let layer = match self.format {
            LogFormat::Json => {
                #[cfg(feature = "logging-json")]
                let layer = layer.json().boxed();
                // Fall back to the default text format if json is not enabled
                #[cfg(not(feature = "logging-json"))]
                let layer = layer.boxed();
                layer
            }
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .is_ok()
    }

    /// Install (no-op when subscriber features not available)
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn try_init(self) -> bool {
        false
    }

    /// Install the subscriber, keeping any subscriber already installed
    pub fn init(self) {
        let _ = self.try_init();
    }
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings
///
/// Uses JSON format if `logging-json` is enabled, otherwise pretty format if
/// `logging-pretty` is enabled, otherwise does nothing.
pub fn init() {
    #[cfg(feature = "logging-json")]
    init_json();

    #[cfg(all(feature = "logging-pretty", not(feature = "logging-json")))]
    init_pretty();
}

/// Initialize JSON structured logging
///
/// # Example output
/// ```json
/// {"timestamp":"2026-01-01T00:00:00.000Z","level":"INFO","fields":{"message":"divide, args=[10, 0]","operation":"divide"},"target":"graph_injector"}
/// ```
pub fn init_json() {
    builder().json().init();
}

/// Initialize pretty colorful logging
///
/// # Example output
/// ```text
///   2026-01-01T00:00:00.000Z DEBUG graph_injector: Deriving type descriptor on first access, service: "app::Client"
/// ```
pub fn init_pretty() {
    builder().pretty().init();
}

/// Initialize logging for graph-injector only (filters other crates)
pub fn init_injector_only() {
    builder().injector_only().init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = LoggingBuilder::default();
        assert_eq!(builder.level, Level::DEBUG);
        assert_eq!(builder.format, LogFormat::Json);
        assert!(builder.target.is_none());
        assert!(!builder.from_env);
        assert_eq!(builder.directive(), "debug");
    }

    #[test]
    fn test_builder_chain() {
        let builder = LoggingBuilder::new()
            .with_level(Level::TRACE)
            .pretty()
            .with_source_location()
            .from_env()
            .injector_only();

        assert_eq!(builder.level, Level::TRACE);
        assert_eq!(builder.format, LogFormat::Pretty);
        assert!(builder.source_location);
        assert!(!builder.thread_info);
        assert!(builder.from_env);
        assert_eq!(builder.target, Some("graph_injector"));
        assert_eq!(builder.directive(), "graph_injector=trace");
    }

    #[test]
    fn test_custom_target_and_level() {
        let builder = builder()
            .with_level(Level::WARN)
            .compact()
            .with_thread_info()
            .with_target_filter("app");
        assert_eq!(builder.format, LogFormat::Compact);
        assert!(builder.thread_info);
        assert_eq!(builder.directive(), "app=warn");
    }
}
