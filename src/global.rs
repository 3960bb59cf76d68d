//! Process-wide default logger
//!
//! The helpers in this module resolve the default logger at call time, so a
//! [`set_default`] is seen by the very next call. Loggers obtained earlier
//! through [`default_logger`] or [`with`] keep the core they were built on.
//!
//! Nothing is flushed automatically at process exit: call [`sync`] before
//! returning from `main`.

use crate::core::{Core, EncoderConfig, Field, Format, Level, Logger, Result, Sink};
use crate::sinks::StderrSink;
use arc_swap::ArcSwap;
use std::sync::{Arc, OnceLock};

static DEFAULT: OnceLock<ArcSwap<Logger>> = OnceLock::new();

fn registry() -> &'static ArcSwap<Logger> {
    DEFAULT.get_or_init(|| ArcSwap::from_pointee(fallback_logger()))
}

/// Info level, console format, stderr
fn fallback_logger() -> Logger {
    let stderr: Arc<dyn Sink> = Arc::new(StderrSink::new());
    let core = Core::new(Format::Console.encoder(EncoderConfig::default()), vec![stderr]);
    Logger::new(Arc::new(core))
}

/// Replace the default logger, returning the previous one
///
/// The previous logger is not flushed; call `sync` on it if it owns
/// buffered sinks.
pub fn set_default(logger: Logger) -> Logger {
    let previous = registry().swap(Arc::new(logger));
    Logger::clone(&previous)
}

/// The current default logger
pub fn default_logger() -> Logger {
    Logger::clone(&registry().load())
}

/// Derive a logger from the current default
pub fn with<I>(fields: I) -> Logger
where
    I: IntoIterator<Item = Field>,
{
    registry().load().with(fields)
}

pub fn enabled(level: Level) -> bool {
    registry().load().enabled(level)
}

#[track_caller]
pub fn log(level: Level, message: &str, fields: &[Field]) {
    registry().load().log(level, message, fields);
}

#[track_caller]
pub fn debug(message: &str, fields: &[Field]) {
    registry().load().debug(message, fields);
}

#[track_caller]
pub fn info(message: &str, fields: &[Field]) {
    registry().load().info(message, fields);
}

#[track_caller]
pub fn warn(message: &str, fields: &[Field]) {
    registry().load().warn(message, fields);
}

#[track_caller]
pub fn error(message: &str, fields: &[Field]) {
    registry().load().error(message, fields);
}

#[track_caller]
pub fn fatal(message: &str, fields: &[Field]) {
    registry().load().fatal(message, fields);
}

/// Flush every sink of the current default logger
pub fn sync() -> Result<()> {
    registry().load().sync()
}
