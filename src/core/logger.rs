//! Logger handle: a shared core plus persistent context fields

use super::{
    engine::Core,
    error::Result,
    field::Field,
    level::Level,
};
use crate::config::LoggerBuilder;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// A cheaply cloneable, immutable logging handle
///
/// Every logger derived through [`Logger::with`] shares the same [`Core`], so
/// a level change on one is seen by all of them. Context fields are owned by
/// the handle: extending a logger never changes its parent or siblings.
///
/// # Example
///
/// ```
/// use spark::{Field, Logger, MemorySink};
/// use std::sync::Arc;
///
/// let sink = Arc::new(MemorySink::new());
/// let logger = Logger::builder().output(sink.clone()).build().unwrap();
///
/// let request = logger.with([Field::string("request_id", "abc123")]);
/// request.info("handled", &[Field::int("status", 200)]);
///
/// assert!(sink.contents().contains("request_id=abc123 status=200"));
/// ```
#[derive(Clone)]
pub struct Logger {
    core: Arc<Core>,
    context: Arc<[Field]>,
}

impl Logger {
    /// Wrap a core with an empty context
    pub fn new(core: Arc<Core>) -> Self {
        Self {
            core,
            context: Vec::<Field>::new().into(),
        }
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Derive a logger whose context is this one's followed by `fields`
    #[must_use]
    pub fn with<I>(&self, fields: I) -> Logger
    where
        I: IntoIterator<Item = Field>,
    {
        let mut context = self.context.to_vec();
        context.extend(fields);
        Self {
            core: Arc::clone(&self.core),
            context: context.into(),
        }
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        self.core.enabled(level)
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: &str, fields: &[Field]) {
        self.core
            .log(level, message, &self.context, fields, Location::caller());
    }

    /// Log with fields computed only when `level` is enabled
    #[track_caller]
    pub fn log_with<F>(&self, level: Level, message: &str, fields: F)
    where
        F: FnOnce() -> Vec<Field>,
    {
        if self.core.enabled(level) {
            let fields = fields();
            self.core
                .log(level, message, &self.context, &fields, Location::caller());
        }
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Level::Debug, message, fields);
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log(Level::Info, message, fields);
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Level::Warn, message, fields);
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.log(Level::Error, message, fields);
    }

    /// Log at `Fatal`, flush every sink, then run the core's fatal hook
    ///
    /// Returns only when the hook is [`FatalHook::Continue`](crate::FatalHook::Continue).
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field]) {
        self.log(Level::Fatal, message, fields);
    }

    /// Flush every sink of the shared core
    pub fn sync(&self) -> Result<()> {
        self.core.sync()
    }

    pub fn level(&self) -> Level {
        self.core.level()
    }

    /// Change the minimum level for every logger sharing this core
    pub fn set_level(&self, level: Level) {
        self.core.set_level(level);
    }

    pub fn context(&self) -> &[Field] {
        &self.context
    }

    pub fn core(&self) -> &Arc<Core> {
        &self.core
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("core", &self.core)
            .field("context", &self.context)
            .finish()
    }
}
