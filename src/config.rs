/*!
 * Configuration
 * Environment-driven knobs with builder overrides
 *
 * Environment variables:
 * - OPTRACK_RULE_FILE: rule property file path
 * - OPTRACK_RULE_RELOAD_MS: rule file reload interval in ms (0 disables)
 * - OPTRACK_DEFAULT_LEVEL: default severity threshold
 * - OPTRACK_DUMP_PATH: default dump destination
 * - OPTRACK_DUMP_PROVIDERS: auto-register built-in dump providers
 * - OPTRACK_DUMP_ON_EXIT: arm the shutdown dump
 */

use crate::core::limits::{DEFAULT_DUMP_PATH, DEFAULT_RELOAD_INTERVAL, DEFAULT_RULE_FILE};
use crate::core::severity::Severity;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const ENV_RULE_FILE: &str = "OPTRACK_RULE_FILE";
pub const ENV_RULE_RELOAD_MS: &str = "OPTRACK_RULE_RELOAD_MS";
pub const ENV_DEFAULT_LEVEL: &str = "OPTRACK_DEFAULT_LEVEL";
pub const ENV_DUMP_PATH: &str = "OPTRACK_DUMP_PATH";
pub const ENV_DUMP_PROVIDERS: &str = "OPTRACK_DUMP_PROVIDERS";
pub const ENV_DUMP_ON_EXIT: &str = "OPTRACK_DUMP_ON_EXIT";

/// Crate-wide configuration. Build from the environment with
/// [`Config::from_env`] or start from `Config::default()` and override
/// fields through the `with_` methods.
#[derive(Debug, Clone)]
pub struct Config {
    /// Rule property file backing the file rule store
    pub rule_file: PathBuf,
    /// Interval between rule file change checks; zero disables reloading
    pub reload_interval: Duration,
    /// Severity threshold applied when no sampling rule covers a source
    pub default_level: Severity,
    /// Default dump destination path
    pub dump_path: PathBuf,
    /// Register the built-in dump providers on service construction
    pub default_dump_providers: bool,
    /// Arm a dump on process shutdown
    pub dump_on_exit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rule_file: PathBuf::from(DEFAULT_RULE_FILE),
            reload_interval: DEFAULT_RELOAD_INTERVAL,
            default_level: Severity::Info,
            dump_path: PathBuf::from(DEFAULT_DUMP_PATH),
            default_dump_providers: false,
            dump_on_exit: false,
        }
    }
}

impl Config {
    /// Read configuration from the environment. Unset variables fall back
    /// to defaults; malformed values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var(ENV_RULE_FILE) {
            config.rule_file = PathBuf::from(path);
        }
        if let Ok(raw) = std::env::var(ENV_RULE_RELOAD_MS) {
            match raw.parse::<u64>() {
                Ok(ms) => config.reload_interval = Duration::from_millis(ms),
                Err(_) => warn!(var = ENV_RULE_RELOAD_MS, value = %raw, "ignoring malformed reload interval"),
            }
        }
        if let Ok(raw) = std::env::var(ENV_DEFAULT_LEVEL) {
            match raw.parse::<Severity>() {
                Ok(level) => config.default_level = level,
                Err(_) => warn!(var = ENV_DEFAULT_LEVEL, value = %raw, "ignoring malformed severity"),
            }
        }
        if let Ok(path) = std::env::var(ENV_DUMP_PATH) {
            config.dump_path = PathBuf::from(path);
        }
        config.default_dump_providers = env_flag(ENV_DUMP_PROVIDERS);
        config.dump_on_exit = env_flag(ENV_DUMP_ON_EXIT);

        config
    }

    pub fn with_rule_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.rule_file = path.into();
        self
    }

    pub fn with_reload_interval(mut self, interval: Duration) -> Self {
        self.reload_interval = interval;
        self
    }

    pub fn with_default_level(mut self, level: Severity) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_dump_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_path = path.into();
        self
    }

    pub fn with_default_dump_providers(mut self, enabled: bool) -> Self {
        self.default_dump_providers = enabled;
        self
    }

    pub fn with_dump_on_exit(mut self, enabled: bool) -> Self {
        self.dump_on_exit = enabled;
        self
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
