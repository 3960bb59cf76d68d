//! Logging macros with `format!`-style messages.
//!
//! The message is formatted only when the level is enabled. Fields go in an
//! optional bracketed list before the format string.
//!
//! # Examples
//!
//! ```
//! use spark::{info, warn, Field, Logger, MemorySink};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let logger = Logger::builder().output(sink.clone()).build().unwrap();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! warn!(logger, [Field::int("attempt", 3)], "Retrying {}", "upstream");
//! assert!(sink.contents().contains("Retrying upstream attempt=3"));
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use spark::{Field, Level, Logger};
/// # let logger = Logger::builder().build().unwrap();
/// use spark::log;
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// log!(logger, Level::Warn, [Field::string("path", "/api")], "Slow request");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, [$($field:expr),* $(,)?], $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.enabled(level) {
            logger.log(level, &::std::format!($($arg)+), &[$($field),*]);
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $crate::log!($logger, $level, [], $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use spark::Logger;
/// # let logger = Logger::builder().build().unwrap();
/// use spark::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, [$($field:expr),* $(,)?], $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, [$($field),*], $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, [$($field:expr),* $(,)?], $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, [$($field),*], $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, [$($field:expr),* $(,)?], $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, [$($field),*], $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use spark::Logger;
/// # let logger = Logger::builder().build().unwrap();
/// use spark::{error, Field};
/// let err = std::io::Error::other("connection reset");
/// error!(logger, [Field::err(&err)], "Failed to connect to {}", "db-1");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, [$($field:expr),* $(,)?], $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, [$($field),*], $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a fatal-level message, then run the logger's fatal hook.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, [$($field:expr),* $(,)?], $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, [$($field),*], $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, $($arg)+)
    };
}
