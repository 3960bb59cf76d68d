//! Timestamp formatting for encoded records
//!
//! All formats render UTC with a fixed precision so that encoding the same
//! record twice yields identical bytes.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};
use std::str::FromStr;

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use spark::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let time = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(TimestampFormat::Iso8601.format(&time), "2025-01-08T10:30:45.000Z");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 with a numeric offset: `2025-01-08T10:30:45.123+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in nanoseconds: `1736332245123456000`
    UnixNanos,

    /// Custom strftime format, validated by [`TimestampFormat::custom`]
    Custom(String),
}

impl TimestampFormat {
    /// Build a custom strftime format, rejecting invalid specifiers
    pub fn custom(format_str: impl Into<String>) -> Result<Self> {
        let format = TimestampFormat::Custom(format_str.into());
        format.validate()?;
        Ok(format)
    }

    /// Check that a custom format only contains valid strftime items and
    /// never emits control characters
    pub fn validate(&self) -> Result<()> {
        if let TimestampFormat::Custom(format_str) = self {
            if StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error)) {
                return Err(LoggerError::config(
                    "timestamp_format",
                    format!("invalid strftime format '{}'", format_str),
                ));
            }
            // Literal control characters and the %n / %t escapes would split
            // a console record across lines
            let emits_control = format_str.chars().any(char::is_control)
                || StrftimeItems::new(format_str).any(|item| {
                    matches!(item, Item::Literal(text) | Item::Space(text) if text.chars().any(char::is_control))
                });
            if emits_control {
                return Err(LoggerError::config(
                    "timestamp_format",
                    format!("control characters are not allowed in timestamp format {:?}", format_str),
                ));
            }
        }
        Ok(())
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::UnixMillis | TimestampFormat::UnixNanos)
    }

    /// Format a timestamp into a new string
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        let mut out = String::with_capacity(32);
        self.write_to(&mut out, datetime);
        out
    }

    /// Append a formatted timestamp to `out`
    ///
    /// An invalid custom format falls back to ISO 8601 instead of panicking.
    pub fn write_to(&self, out: &mut String, datetime: &DateTime<Utc>) {
        let start = out.len();
        let written = match self {
            TimestampFormat::Iso8601 => write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            TimestampFormat::Iso8601Micros => {
                write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ"))
            }
            TimestampFormat::Rfc3339 => write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.3f%:z")),
            TimestampFormat::UnixMillis => write!(out, "{}", datetime.timestamp_millis()),
            TimestampFormat::UnixNanos => write!(
                out,
                "{}",
                datetime
                    .timestamp_nanos_opt()
                    .unwrap_or_else(|| datetime.timestamp_micros().saturating_mul(1000))
            ),
            TimestampFormat::Custom(format_str) => write!(out, "{}", datetime.format(format_str)),
        };

        if written.is_err() {
            out.truncate(start);
            let _ = write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ"));
        }
    }

    /// Numeric value of the timestamp for numeric formats
    pub(crate) fn numeric_value(&self, datetime: &DateTime<Utc>) -> Option<i64> {
        match self {
            TimestampFormat::UnixMillis => Some(datetime.timestamp_millis()),
            TimestampFormat::UnixNanos => Some(
                datetime
                    .timestamp_nanos_opt()
                    .unwrap_or_else(|| datetime.timestamp_micros().saturating_mul(1000)),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampFormat::Iso8601 => f.write_str("iso8601"),
            TimestampFormat::Iso8601Micros => f.write_str("iso8601_micros"),
            TimestampFormat::Rfc3339 => f.write_str("rfc3339"),
            TimestampFormat::UnixMillis => f.write_str("unix_millis"),
            TimestampFormat::UnixNanos => f.write_str("unix_nanos"),
            TimestampFormat::Custom(format_str) => f.write_str(format_str),
        }
    }
}

impl FromStr for TimestampFormat {
    type Err = LoggerError;

    /// Named formats are matched case-insensitively; anything containing `%`
    /// is treated as a custom strftime format.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "iso8601" => Ok(TimestampFormat::Iso8601),
            "iso8601_micros" => Ok(TimestampFormat::Iso8601Micros),
            "rfc3339" => Ok(TimestampFormat::Rfc3339),
            "unix_millis" => Ok(TimestampFormat::UnixMillis),
            "unix_nanos" => Ok(TimestampFormat::UnixNanos),
            _ if s.contains('%') => TimestampFormat::custom(s),
            _ => Err(LoggerError::config(
                "timestamp_format",
                format!("unknown timestamp format '{}'", s),
            )),
        }
    }
}

impl TryFrom<String> for TimestampFormat {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimestampFormat> for String {
    fn from(format: TimestampFormat) -> Self {
        format.to_string()
    }
}
