// Log config

use crate::utils::get_env_bool;

/// Levels and prefix of a logger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    /// Prepended to every line, after the time
    pub prefix: String,

    pub error_enabled: bool,
    pub warning_enabled: bool,
    pub info_enabled: bool,
    pub debug_enabled: bool,
    pub trace_enabled: bool,
}

impl LogConfig {
    /// Reads the levels from the environment
    ///
    /// LOG_ERROR, LOG_WARNING and LOG_INFO default to enabled,
    /// LOG_DEBUG to disabled, LOG_TRACE to the value of LOG_DEBUG
    pub fn from_env() -> LogConfig {
        let debug_enabled = get_env_bool("LOG_DEBUG", false);

        LogConfig {
            prefix: String::new(),
            error_enabled: get_env_bool("LOG_ERROR", true),
            warning_enabled: get_env_bool("LOG_WARNING", true),
            info_enabled: get_env_bool("LOG_INFO", true),
            debug_enabled,
            trace_enabled: get_env_bool("LOG_TRACE", debug_enabled),
        }
    }

    /// Every level off
    pub fn disabled() -> LogConfig {
        LogConfig {
            prefix: String::new(),
            error_enabled: false,
            warning_enabled: false,
            info_enabled: false,
            debug_enabled: false,
            trace_enabled: false,
        }
    }

    /// Same levels, with `prefix` appended to the prefix
    pub fn child_config(&self, prefix: &str) -> LogConfig {
        LogConfig {
            prefix: format!("{}{}", self.prefix, prefix),
            ..self.clone()
        }
    }
}
