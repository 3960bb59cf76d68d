//! # spark
//!
//! A structured logging core: leveled, field-annotated records rendered as
//! JSON lines or human-readable console text and written to one or more
//! sinks.
//!
//! ## Features
//!
//! - **Cheap when disabled**: a disabled call is one lock-free load and a
//!   comparison; nothing is allocated, formatted or captured
//! - **Typed fields**: strings, integers, floats, durations, errors and any
//!   `serde::Serialize` value
//! - **Immutable context**: [`Logger::with`] derives a new logger; parents and
//!   siblings are never affected
//! - **Fault isolation**: a failing or panicking sink never stops the others,
//!   and failures are surfaced by [`Logger::sync`]
//!
//! ## Example
//!
//! ```
//! use spark::{Field, Format, Level, Logger, MemorySink};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let logger = Logger::builder()
//!     .level(Level::Debug)
//!     .format(Format::Json)
//!     .output(sink.clone())
//!     .build()
//!     .unwrap();
//!
//! logger.info("user login", &[Field::string("user", "alice"), Field::int("attempt", 3)]);
//! logger.sync().unwrap();
//!
//! assert!(sink.contents().contains("\"user\":\"alice\",\"attempt\":3"));
//! ```
//!
//! The process-wide default logger is reached through the free functions
//! ([`info`], [`with`], [`set_default`], ...). Call [`sync`] before exiting.

pub mod config;
pub mod core;
pub mod global;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::config::{Config, LoggerBuilder, OutputTarget};
    pub use crate::core::{
        FatalHook, Field, FieldValue, Format, Level, Logger, LoggerError, Result, Sink,
        TimestampFormat,
    };
    pub use crate::sinks::{MemorySink, StderrSink, StdoutSink, WriterSink};
}

pub use crate::config::{Config, LoggerBuilder, OutputTarget};
pub use crate::core::{
    Caller, ConsoleEncoder, Core, Encoder, EncoderConfig, FatalHook, Field, FieldSerialize,
    FieldValue, Format, JsonEncoder, Level, Logger, LoggerError, LoggerMetrics, Record, Result,
    Sink, TimestampFormat,
};
pub use crate::global::{
    debug, default_logger, enabled, error, fatal, info, log, set_default, sync, warn, with,
};
pub use crate::sinks::{MemorySink, StderrSink, StdoutSink, WriterSink};
