//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Tracing subscriber settings for the `flowdesk` binary.
///
/// `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `"info"` or `"flowdesk_service=debug"`.
    #[serde(default = "default_level")]
    pub level: String,
    /// `"json"` for one object per line, anything else for compact text.
    #[serde(default = "default_format")]
    pub format: String,
    /// Include the emitting module in each line.
    #[serde(default)]
    pub with_target: bool,
}

impl LoggingConfig {
    /// Whether JSON output was requested.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            with_target: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}
