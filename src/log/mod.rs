// Log module

mod config;
mod logger;

pub use config::*;
pub use logger::*;

/// Logs `$msg` with a level tag, if `$enabled` is set in the logger configuration
#[macro_export]
macro_rules! log_at_level {
    ($logger:expr, $enabled:ident, $tag:literal, $msg:expr) => {
        if $logger.config.$enabled {
            $logger.log(&format!(concat!("[", $tag, "] {}"), $msg));
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $msg:expr) => {
        $crate::log_at_level!($logger, error_enabled, "ERROR", $msg)
    };
}

#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $msg:expr) => {
        $crate::log_at_level!($logger, warning_enabled, "WARNING", $msg)
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $msg:expr) => {
        $crate::log_at_level!($logger, info_enabled, "INFO", $msg)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $msg:expr) => {
        $crate::log_at_level!($logger, debug_enabled, "DEBUG", $msg)
    };
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $msg:expr) => {
        $crate::log_at_level!($logger, trace_enabled, "TRACE", $msg)
    };
}
