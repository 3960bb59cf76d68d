//! Validated logger construction
//!
//! [`LoggerBuilder`] is the fluent entry point; [`Config`] is the same option
//! set as a plain serde struct, for configuration read from a file.

use crate::core::{
    Core, EncoderConfig, FatalHook, Field, Format, Level, Logger, LoggerError, Result, Sink,
    TimestampFormat,
};
use crate::sinks::{StderrSink, StdoutSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Standard stream a logger writes to when no custom sink is given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputTarget {
    #[default]
    Stderr,
    Stdout,
}

impl OutputTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputTarget::Stderr => "stderr",
            OutputTarget::Stdout => "stdout",
        }
    }

    pub fn sink(&self) -> Arc<dyn Sink> {
        match self {
            OutputTarget::Stderr => Arc::new(StderrSink::new()),
            OutputTarget::Stdout => Arc::new(StdoutSink::new()),
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputTarget {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "stderr" => Ok(OutputTarget::Stderr),
            "stdout" => Ok(OutputTarget::Stdout),
            _ => Err(LoggerError::config(
                "output",
                format!("unknown output '{}' (expected 'stderr' or 'stdout')", s),
            )),
        }
    }
}

impl TryFrom<String> for OutputTarget {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<OutputTarget> for String {
    fn from(target: OutputTarget) -> Self {
        target.as_str().to_string()
    }
}

/// Serializable logger options
///
/// Missing keys take their defaults; unknown keys are rejected.
///
/// # Example
///
/// ```
/// use spark::{Config, Format, Level};
///
/// let config = Config::from_json(r#"{"level": "debug", "format": "json"}"#).unwrap();
/// assert_eq!(config.level, Level::Debug);
/// assert_eq!(config.format, Format::Json);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub level: Level,
    pub format: Format,
    /// Standard stream to write to; stderr when absent and no sink is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputTarget>,
    pub caller: bool,
    pub color: bool,
    pub timestamp_format: TimestampFormat,
    pub fatal_hook: FatalHook,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LoggerError::config("config", e.to_string()))
    }

    /// Debug level, console format, caller capture
    pub fn development() -> Self {
        Self {
            level: Level::Debug,
            format: Format::Console,
            caller: true,
            ..Self::default()
        }
    }

    /// Info level, JSON format, caller capture
    pub fn production() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            caller: true,
            ..Self::default()
        }
    }
}

/// Builder for constructing a [`Logger`] with a fluent API
///
/// Options given by name (`level_name`, `format_name`, `output_name`) are
/// parsed immediately; the first failure is returned from [`build`](Self::build).
///
/// # Example
///
/// ```
/// use spark::{Field, Format, Level, Logger, MemorySink};
/// use std::sync::Arc;
///
/// let sink = Arc::new(MemorySink::new());
/// let logger = Logger::builder()
///     .level(Level::Debug)
///     .format(Format::Json)
///     .output(sink.clone())
///     .fields([Field::string("service", "billing")])
///     .build()
///     .unwrap();
///
/// logger.debug("ready", &[]);
/// assert!(sink.contents().contains("\"service\":\"billing\""));
/// ```
pub struct LoggerBuilder {
    level: Level,
    format: Format,
    outputs: Vec<Arc<dyn Sink>>,
    output_target: Option<OutputTarget>,
    caller: bool,
    color: bool,
    timestamp_format: TimestampFormat,
    error_output: Option<Arc<dyn Sink>>,
    fatal_hook: FatalHook,
    fields: Vec<Field>,
    pending_error: Option<LoggerError>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::from_config(Config::default())
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            level: config.level,
            format: config.format,
            outputs: Vec::new(),
            output_target: config.output,
            caller: config.caller,
            color: config.color,
            timestamp_format: config.timestamp_format,
            error_output: None,
            fatal_hook: config.fatal_hook,
            fields: Vec::new(),
            pending_error: None,
        }
    }

    fn fail(&mut self, err: LoggerError) {
        if self.pending_error.is_none() {
            self.pending_error = Some(err);
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the level by name (`debug`, `info`, `warn`, `error`, `fatal`)
    #[must_use = "builder methods return a new value"]
    pub fn level_name(mut self, name: &str) -> Self {
        match name.parse() {
            Ok(level) => self.level = level,
            Err(message) => self.fail(LoggerError::config("level", message)),
        }
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Set the format by name (`json` or `console`)
    #[must_use = "builder methods return a new value"]
    pub fn format_name(mut self, name: &str) -> Self {
        match name.parse() {
            Ok(format) => self.format = format,
            Err(err) => self.fail(err),
        }
        self
    }

    /// Add a sink; may be called more than once
    ///
    /// Sinks receive records in the order they were added.
    #[must_use = "builder methods return a new value"]
    pub fn output(mut self, sink: Arc<dyn Sink>) -> Self {
        self.outputs.push(sink);
        self
    }

    /// Write to a standard stream, ahead of any sink added with `output`
    #[must_use = "builder methods return a new value"]
    pub fn output_target(mut self, target: OutputTarget) -> Self {
        self.output_target = Some(target);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn output_name(mut self, name: &str) -> Self {
        match name.parse() {
            Ok(target) => self.output_target = Some(target),
            Err(err) => self.fail(err),
        }
        self
    }

    /// Capture the file and line of each log call
    #[must_use = "builder methods return a new value"]
    pub fn caller(mut self, enabled: bool) -> Self {
        self.caller = enabled;
        self
    }

    /// Colour the level column (console format only)
    #[must_use = "builder methods return a new value"]
    pub fn color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Sink for internal failure reports (stderr by default)
    #[must_use = "builder methods return a new value"]
    pub fn error_output(mut self, sink: Arc<dyn Sink>) -> Self {
        self.error_output = Some(sink);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn fatal_hook(mut self, hook: FatalHook) -> Self {
        self.fatal_hook = hook;
        self
    }

    /// Initial context fields carried by every record
    #[must_use = "builder methods return a new value"]
    pub fn fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = Field>,
    {
        self.fields.extend(fields);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.color && self.format == Format::Json {
            return Err(LoggerError::config(
                "color",
                "colored output is only supported by the console format",
            ));
        }
        if self.color && !cfg!(feature = "console") {
            return Err(LoggerError::config(
                "color",
                "colored output requires the 'console' feature",
            ));
        }
        self.timestamp_format.validate()
    }

    pub fn build(mut self) -> Result<Logger> {
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }
        self.validate()?;

        let mut sinks: Vec<Arc<dyn Sink>> = Vec::with_capacity(self.outputs.len() + 1);
        if let Some(target) = self.output_target {
            sinks.push(target.sink());
        }
        sinks.append(&mut self.outputs);
        if sinks.is_empty() {
            sinks.push(Arc::new(StderrSink::new()));
        }

        let encoder = self.format.encoder(EncoderConfig {
            timestamp_format: self.timestamp_format,
            color: self.color,
        });

        let mut core = Core::new(encoder, sinks)
            .with_level(self.level)
            .with_caller(self.caller)
            .with_fatal_hook(self.fatal_hook);
        if let Some(error_output) = self.error_output {
            core = core.with_error_output(error_output);
        }

        Ok(Logger::new(Arc::new(core)).with(self.fields))
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
