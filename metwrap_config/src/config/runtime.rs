// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserPreferences {
    /// Whether `begin_end_incr(...)` expressions are expanded by default
    pub expand_ranges: bool,
}

impl Default for ParserPreferences {
    fn default() -> Self {
        Self {
            expand_ranges: env_flag(env_vars::PARSER_EXPAND_RANGES, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationPreferences {
    /// Whether find-and-replace suggestions are generated for role errors
    pub suggest_edits: bool,

    /// Whether threshold grammar is checked during field validation
    pub check_thresholds: bool,

    /// Whether FCST/OBS level counts are compared during field validation
    pub check_level_counts: bool,
}

impl Default for ValidationPreferences {
    fn default() -> Self {
        Self {
            suggest_edits: env_flag(env_vars::VALIDATION_SUGGEST_EDITS, true),
            check_thresholds: env_flag(env_vars::VALIDATION_CHECK_THRESHOLDS, true),
            check_level_counts: env_flag(env_vars::VALIDATION_CHECK_LEVEL_COUNTS, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging (user preference)
    pub use_structured_logging: bool,

    /// User preferred minimum log level
    pub min_log_level: LogLevel,

    /// Whether to include event context in console messages
    pub include_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env_flag(env_vars::LOGGING_USE_STRUCTURED, false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            include_context: env_flag(env_vars::LOGGING_INCLUDE_CONTEXT, true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel for compatibility
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }

    /// Filter for the `log` facade backend
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub parser: ParserPreferences,
    pub validation: ValidationPreferences,
    pub logging: LoggingPreferences,
}

/// Environment variable names for configuration
pub mod env_vars {
    // Parser
    pub const PARSER_EXPAND_RANGES: &str = "METWRAP_PARSER_EXPAND_RANGES";

    // Validation
    pub const VALIDATION_SUGGEST_EDITS: &str = "METWRAP_VALIDATION_SUGGEST_EDITS";
    pub const VALIDATION_CHECK_THRESHOLDS: &str = "METWRAP_VALIDATION_CHECK_THRESHOLDS";
    pub const VALIDATION_CHECK_LEVEL_COUNTS: &str = "METWRAP_VALIDATION_CHECK_LEVEL_COUNTS";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "METWRAP_LOGGING_USE_STRUCTURED";
    pub const LOGGING_MIN_LEVEL: &str = "METWRAP_LOGGING_MIN_LEVEL";
    pub const LOGGING_INCLUDE_CONTEXT: &str = "METWRAP_LOGGING_INCLUDE_CONTEXT";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("0"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("warning"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("3"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("invalid"), None);
    }

    #[test]
    fn test_level_filter_mapping() {
        assert_eq!(LogLevel::Warning.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Debug.to_level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_env_var_names_exist() {
        assert!(env_vars::PARSER_EXPAND_RANGES.starts_with("METWRAP_"));
        assert!(env_vars::LOGGING_MIN_LEVEL.starts_with("METWRAP_"));
        assert!(env_vars::VALIDATION_SUGGEST_EDITS.starts_with("METWRAP_"));
    }
}
