//! Transient log record handed to encoders

use super::field::Field;
use super::level::Level;
use chrono::{DateTime, Utc};
use std::fmt;
use std::panic::Location;

/// Source location of a log call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl From<&'static Location<'static>> for Caller {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A borrowed view of one log event
///
/// Built on the stack for a single call, encoded, then discarded. Context and
/// call-site fields are kept as two borrowed slices so merging them never
/// copies or mutates either list.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: &'a str,
    pub context: &'a [Field],
    pub fields: &'a [Field],
    pub caller: Option<Caller>,
}

impl<'a> Record<'a> {
    pub fn new(level: Level, message: &'a str) -> Self {
        Self {
            time: Utc::now(),
            level,
            message,
            context: &[],
            fields: &[],
            caller: None,
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    pub fn with_context(mut self, context: &'a [Field]) -> Self {
        self.context = context;
        self
    }

    pub fn with_fields(mut self, fields: &'a [Field]) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Context fields followed by call-site fields, each in insertion order
    pub fn all_fields(&self) -> impl Iterator<Item = &'a Field> + 'a {
        self.context.iter().chain(self.fields.iter())
    }
}
