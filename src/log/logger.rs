// Logger

use super::config::LogConfig;
use chrono::{DateTime, Local};

/// Logger writing timestamped lines to the standard output
pub struct Logger {
    /// Configuration
    pub config: LogConfig,
}

impl Logger {
    pub fn new(config: LogConfig) -> Logger {
        Logger { config }
    }

    /// Creates a logger with the levels set by the environment
    pub fn new_from_env() -> Logger {
        Logger::new(LogConfig::from_env())
    }

    // Creates new fully disabled logger
    pub fn new_disabled() -> Logger {
        Logger::new(LogConfig::disabled())
    }

    /// Makes child logger, one per session
    pub fn make_child_logger(&self, prefix: &str) -> Logger {
        Logger::new(self.config.child_config(prefix))
    }

    /// Logs a line
    /// With tracing enabled, lines go to stderr so they do not mix with piped output
    pub fn log(&self, line: &str) {
        let time_local: DateTime<Local> = Local::now();
        let time_format = time_local.format("[%Y-%m-%d %H:%M:%S] ");

        if self.config.trace_enabled {
            eprintln!("{}{}{}", time_format, self.config.prefix, line);
        } else {
            println!("{}{}{}", time_format, self.config.prefix, line);
        }
    }

    pub fn log_error(&self, line: &str) {
        crate::log_error!(self, line);
    }

    pub fn log_warning(&self, line: &str) {
        crate::log_warning!(self, line);
    }

    pub fn log_info(&self, line: &str) {
        crate::log_info!(self, line);
    }

    pub fn log_debug(&self, line: &str) {
        crate::log_debug!(self, line);
    }

    pub fn log_trace(&self, line: &str) {
        crate::log_trace!(self, line);
    }
}

// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_logger_prefix() {
        let logger = Logger::new(LogConfig {
            prefix: "[PULL rtmp://localhost/live/cam1] ".to_string(),
            info_enabled: true,
            ..LogConfig::disabled()
        });

        let child = logger.make_child_logger("[RELAY] ");

        assert_eq!(
            child.config.prefix,
            "[PULL rtmp://localhost/live/cam1] [RELAY] "
        );
        assert!(child.config.info_enabled);
        assert!(!child.config.debug_enabled);
        assert!(!Logger::new_disabled().config.error_enabled);
    }

    #[test]
    fn test_levels_from_env() {
        std::env::set_var("LOG_DEBUG", "YES");
        std::env::set_var("LOG_WARNING", "NO");

        let config = LogConfig::from_env();

        std::env::remove_var("LOG_DEBUG");
        std::env::remove_var("LOG_WARNING");

        assert!(config.error_enabled);
        assert!(!config.warning_enabled);
        assert!(config.debug_enabled);
        assert!(config.trace_enabled);
    }
}
