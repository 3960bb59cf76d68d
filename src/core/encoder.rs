//! Encoders turning a [`Record`] into bytes
//!
//! Provides the two record formats:
//! - Json: one machine-readable JSON object per line
//! - Console: human-readable `[timestamp] [LEVEL] message key=value` lines
//!
//! Both encoders are deterministic and never fail: a field that cannot be
//! rendered is replaced with a placeholder and reported back to the caller.

use super::error::{LoggerError, Result};
use super::field::{Field, FieldValue};
use super::record::Record;
use super::timestamp::TimestampFormat;
use serde::ser::{SerializeMap, Serializer};
use std::fmt::Write;
use std::str::FromStr;
use std::sync::Arc;

/// Renders one record into a byte buffer
pub trait Encoder: Send + Sync {
    /// Append exactly one record, terminated by `\n`, to `buf`
    ///
    /// Returns one [`LoggerError::Encode`] per field that was replaced by a
    /// placeholder; the record itself is always written.
    fn encode(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> Vec<LoggerError>;

    fn name(&self) -> &str;
}

/// Output format of a logger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Format {
    /// Line-delimited JSON
    ///
    /// Example: `{"timestamp":"2025-01-08T10:30:45.123Z","level":"INFO","message":"Request processed"}`
    Json,

    /// Human-readable console format (default)
    ///
    /// Example: `[2025-01-08T10:30:45.123Z] [INFO ] Request processed status=200`
    #[default]
    Console,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Console => "console",
        }
    }

    /// Build the encoder for this format
    pub fn encoder(&self, config: EncoderConfig) -> Arc<dyn Encoder> {
        match self {
            Format::Json => Arc::new(JsonEncoder::new().with_timestamp_format(config.timestamp_format)),
            Format::Console => Arc::new(
                ConsoleEncoder::new()
                    .with_timestamp_format(config.timestamp_format)
                    .with_colors(config.color),
            ),
        }
    }
}

impl FromStr for Format {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "console" | "text" => Ok(Format::Console),
            _ => Err(LoggerError::config(
                "format",
                format!("unknown format '{}' (expected 'json' or 'console')", s),
            )),
        }
    }
}

impl TryFrom<String> for Format {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.as_str().to_string()
    }
}

/// Settings shared by the bundled encoders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderConfig {
    pub timestamp_format: TimestampFormat,
    pub color: bool,
}

fn placeholder(kind: &str, reason: &str) -> String {
    format!("<unrenderable {}: {}>", kind, reason)
}

/// Line-delimited JSON encoder
///
/// Keys are emitted in a fixed order: `timestamp`, `level`, `caller` (when
/// captured), `message`, then context fields and call-site fields in
/// insertion order.
///
/// Field keys are never renamed. A field keyed `timestamp`, `level`, `caller`
/// or `message` is written as a second key after the envelope, and decoders
/// that keep the last occurrence of a key will report the field's value.
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    timestamp_format: TimestampFormat,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    fn timestamp_value(&self, record: &Record<'_>) -> serde_json::Value {
        match self.timestamp_format.numeric_value(&record.time) {
            Some(n) => serde_json::Value::Number(n.into()),
            None => serde_json::Value::String(self.timestamp_format.format(&record.time)),
        }
    }

    fn field_value(field: &Field, issues: &mut Vec<LoggerError>) -> serde_json::Value {
        use serde_json::Value;

        match field.value() {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::Number((*i).into()),
            FieldValue::Int64(i) => Value::Number((*i).into()),
            FieldValue::Uint64(u) => Value::Number((*u).into()),
            FieldValue::Float64(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => Value::Number(n),
                None => {
                    let reason = format!("non-finite float {}", f);
                    issues.push(LoggerError::encode(field.key(), reason.clone()));
                    Value::String(placeholder("float64", &reason))
                }
            },
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Duration(d) => Value::String(format!("{:?}", d)),
            FieldValue::Error(Some(text)) => Value::String(text.clone()),
            FieldValue::Error(None) => Value::Null,
            FieldValue::Any(value) => match value.to_json() {
                Ok(json) => json,
                Err(e) => {
                    let reason = e.to_string();
                    issues.push(LoggerError::encode(field.key(), reason.clone()));
                    Value::String(placeholder("any", &reason))
                }
            },
        }
    }

    fn write_object(
        &self,
        record: &Record<'_>,
        buf: &mut Vec<u8>,
        issues: &mut Vec<LoggerError>,
    ) -> serde_json::Result<()> {
        let mut ser = serde_json::Serializer::new(buf);
        let mut map = (&mut ser).serialize_map(None)?;

        map.serialize_entry("timestamp", &self.timestamp_value(record))?;
        map.serialize_entry("level", record.level.as_str())?;
        if let Some(caller) = record.caller {
            map.serialize_entry("caller", &caller.to_string())?;
        }
        map.serialize_entry("message", record.message)?;

        for field in record.all_fields() {
            let value = Self::field_value(field, issues);
            map.serialize_entry(field.key(), &value)?;
        }

        map.end()
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> Vec<LoggerError> {
        let start = buf.len();
        let mut issues = Vec::new();

        if let Err(e) = self.write_object(record, buf, &mut issues) {
            // Keep the record: drop the partial object and emit the envelope only
            buf.truncate(start);
            issues.push(LoggerError::encode("<record>", e.to_string()));
            let fallback = serde_json::json!({
                "timestamp": self.timestamp_value(record),
                "level": record.level.as_str(),
                "message": record.message,
                "encode_error": e.to_string(),
            });
            let _ = serde_json::to_writer(&mut *buf, &fallback);
        }

        buf.push(b'\n');
        issues
    }

    fn name(&self) -> &str {
        "json"
    }
}

/// Human-readable encoder
///
/// Example: `[2025-01-08T10:30:45.123Z] [WARN ] src/main.rs:42 Slow request path="/api" ms=350`
#[derive(Debug, Clone, Default)]
pub struct ConsoleEncoder {
    timestamp_format: TimestampFormat,
    use_colors: bool,
}

impl ConsoleEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Colour the level column (only with the `console` feature)
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn write_level(&self, out: &mut String, record: &Record<'_>) {
        #[cfg(feature = "console")]
        {
            if self.use_colors {
                use colored::Colorize;
                let padded = format!("{:5}", record.level.as_str());
                let _ = write!(out, "{}", padded.color(record.level.color_code()));
                return;
            }
        }

        let _ = write!(out, "{:5}", record.level.as_str());
    }

    /// Escape control characters so one record stays on one line
    fn write_message(out: &mut String, message: &str) {
        for c in message.chars() {
            match c {
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {
                    let _ = write!(out, "\\u{{{:04x}}}", c as u32);
                }
                c => out.push(c),
            }
        }
    }

    fn write_key(out: &mut String, key: &str) {
        let start = out.len();
        out.extend(
            key.chars()
                .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')),
        );
        if out.len() == start {
            out.push('_');
        }
    }

    fn needs_quoting(value: &str) -> bool {
        value.is_empty()
            || value
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || c == '"' || c == '=')
    }

    fn write_value_str(out: &mut String, value: &str) {
        if !Self::needs_quoting(value) {
            out.push_str(value);
            return;
        }

        out.push('"');
        for c in value.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {
                    let _ = write!(out, "\\u{{{:04x}}}", c as u32);
                }
                c => out.push(c),
            }
        }
        out.push('"');
    }

    fn write_value(out: &mut String, field: &Field, issues: &mut Vec<LoggerError>) {
        let _ = match field.value() {
            FieldValue::String(s) => {
                Self::write_value_str(out, s);
                Ok(())
            }
            FieldValue::Int(i) => write!(out, "{}", i),
            FieldValue::Int64(i) => write!(out, "{}", i),
            FieldValue::Uint64(u) => write!(out, "{}", u),
            FieldValue::Float64(f) => write!(out, "{}", f),
            FieldValue::Bool(b) => write!(out, "{}", b),
            FieldValue::Duration(d) => write!(out, "{:?}", d),
            FieldValue::Error(Some(text)) => {
                Self::write_value_str(out, text);
                Ok(())
            }
            FieldValue::Error(None) => {
                out.push_str("<nil>");
                Ok(())
            }
            FieldValue::Any(value) => {
                match value.to_json() {
                    Ok(serde_json::Value::String(s)) => Self::write_value_str(out, &s),
                    Ok(json) => Self::write_value_str(out, &json.to_string()),
                    Err(e) => {
                        let reason = e.to_string();
                        issues.push(LoggerError::encode(field.key(), reason.clone()));
                        Self::write_value_str(out, &placeholder("any", &reason));
                    }
                }
                Ok(())
            }
        };
    }
}

impl Encoder for ConsoleEncoder {
    fn encode(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> Vec<LoggerError> {
        let mut issues = Vec::new();
        let mut line = String::with_capacity(128);

        line.push('[');
        self.timestamp_format.write_to(&mut line, &record.time);
        line.push_str("] [");
        self.write_level(&mut line, record);
        line.push_str("] ");

        if let Some(caller) = record.caller {
            let _ = write!(line, "{} ", caller);
        }

        Self::write_message(&mut line, record.message);

        for field in record.all_fields() {
            line.push(' ');
            Self::write_key(&mut line, field.key());
            line.push('=');
            Self::write_value(&mut line, field, &mut issues);
        }

        line.push('\n');
        buf.extend_from_slice(line.as_bytes());
        issues
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Caller, Level};
    use chrono::{DateTime, TimeZone, Utc};
    use serde::ser::Error as _;
    use std::io;

    #[derive(Debug)]
    struct Unserializable;

    impl serde::Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(S::Error::custom("refuses to serialize"))
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::milliseconds(123)
    }

    fn encode_to_string(encoder: &dyn Encoder, record: &Record<'_>) -> (String, Vec<LoggerError>) {
        let mut buf = Vec::new();
        let issues = encoder.encode(record, &mut buf);
        (String::from_utf8(buf).unwrap(), issues)
    }

    #[test]
    fn test_json_layout() {
        let fields = vec![Field::string("user", "alice"), Field::int("attempt", 3)];
        let record = Record::new(Level::Info, "user login")
            .with_time(fixed_time())
            .with_fields(&fields);

        let (out, issues) = encode_to_string(&JsonEncoder::new(), &record);

        assert!(issues.is_empty());
        assert_eq!(
            out,
            "{\"timestamp\":\"2025-01-08T10:30:45.123Z\",\"level\":\"INFO\",\
             \"message\":\"user login\",\"user\":\"alice\",\"attempt\":3}\n"
        );
    }

    #[test]
    fn test_json_context_before_call_site_fields() {
        let context = vec![Field::string("service", "users"), Field::string("version", "1.0.0")];
        let fields = vec![Field::string("user_id", "12345"), Field::string("action", "login")];
        let record = Record::new(Level::Info, "Processing user request")
            .with_time(fixed_time())
            .with_context(&context)
            .with_fields(&fields);

        let (out, _) = encode_to_string(&JsonEncoder::new(), &record);

        let service = out.find("\"service\"").unwrap();
        let version = out.find("\"version\"").unwrap();
        let user_id = out.find("\"user_id\"").unwrap();
        let action = out.find("\"action\"").unwrap();
        assert!(service < version && version < user_id && user_id < action);
    }

    #[test]
    fn test_json_envelope_keys_written_before_colliding_fields() {
        let fields = vec![Field::string("level", "x"), Field::string("message", "shadow")];
        let record = Record::new(Level::Info, "real")
            .with_time(fixed_time())
            .with_fields(&fields);

        let (out, issues) = encode_to_string(&JsonEncoder::new(), &record);

        assert!(issues.is_empty());
        assert!(out.ends_with(
            "\"level\":\"INFO\",\"message\":\"real\",\"level\":\"x\",\"message\":\"shadow\"}\n"
        ));
        let decoded: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(decoded["level"], "x");
    }

    #[test]
    fn test_json_caller_and_newlines() {
        let record = Record::new(Level::Warn, "line one\nline two")
            .with_time(fixed_time())
            .with_caller(Caller {
                file: "src/main.rs",
                line: 42,
            });

        let (out, _) = encode_to_string(&JsonEncoder::new(), &record);

        assert_eq!(out.matches('\n').count(), 1);
        assert!(out.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(parsed["caller"], "src/main.rs:42");
        assert_eq!(parsed["message"], "line one\nline two");
    }

    #[test]
    fn test_json_numeric_timestamp() {
        let record = Record::new(Level::Debug, "tick").with_time(fixed_time());
        let encoder = JsonEncoder::new().with_timestamp_format(TimestampFormat::UnixMillis);

        let (out, _) = encode_to_string(&encoder, &record);
        let parsed: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(parsed["timestamp"], 1736332245123_i64);
    }

    #[test]
    fn test_json_placeholders_keep_record() {
        let fields = vec![
            Field::float64("ratio", f64::NAN),
            Field::any("payload", Unserializable),
            Field::bool("ok", true),
        ];
        let record = Record::new(Level::Error, "partial")
            .with_time(fixed_time())
            .with_fields(&fields);

        let (out, issues) = encode_to_string(&JsonEncoder::new(), &record);

        assert_eq!(issues.len(), 2);
        assert!(matches!(&issues[0], LoggerError::Encode { key, .. } if key == "ratio"));
        let parsed: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert!(parsed["ratio"].as_str().unwrap().starts_with("<unrenderable float64"));
        assert!(parsed["payload"].as_str().unwrap().contains("refuses to serialize"));
        assert_eq!(parsed["ok"], true);
    }

    #[test]
    fn test_json_error_fields() {
        let err = io::Error::other("");
        let fields = vec![Field::err(&err), Field::err_opt::<io::Error>(None)];
        let record = Record::new(Level::Error, "failed")
            .with_time(fixed_time())
            .with_fields(&fields);

        let (out, issues) = encode_to_string(&JsonEncoder::new(), &record);

        assert!(issues.is_empty());
        assert!(out.contains("\"error\":\"\""));
        assert!(out.contains("\"error\":null"));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let context = vec![Field::string("service", "api")];
        let fields = vec![Field::duration("elapsed", std::time::Duration::from_millis(1500))];
        let record = Record::new(Level::Info, "done")
            .with_time(fixed_time())
            .with_context(&context)
            .with_fields(&fields);

        let json = JsonEncoder::new();
        let console = ConsoleEncoder::new();
        let encoders: [&dyn Encoder; 2] = [&json, &console];

        for encoder in encoders {
            let (first, _) = encode_to_string(encoder, &record);
            let (second, _) = encode_to_string(encoder, &record);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_console_layout() {
        let fields = vec![Field::string("user", "alice"), Field::int("attempt", 3)];
        let record = Record::new(Level::Info, "user login")
            .with_time(fixed_time())
            .with_fields(&fields);

        let (out, _) = encode_to_string(&ConsoleEncoder::new(), &record);

        assert_eq!(
            out,
            "[2025-01-08T10:30:45.123Z] [INFO ] user login user=alice attempt=3\n"
        );
    }

    #[test]
    fn test_console_caller() {
        let record = Record::new(Level::Error, "boom")
            .with_time(fixed_time())
            .with_caller(Caller {
                file: "src/lib.rs",
                line: 7,
            });

        let (out, _) = encode_to_string(&ConsoleEncoder::new(), &record);
        assert_eq!(out, "[2025-01-08T10:30:45.123Z] [ERROR] src/lib.rs:7 boom\n");
    }

    #[test]
    fn test_console_hostile_input_stays_on_one_line() {
        let err = io::Error::other("first line\nsecond line");
        let fields = vec![
            Field::string("query", "SELECT * FROM users WHERE id=1"),
            Field::string("bad key\n", "x"),
            Field::err(&err),
        ];
        let record = Record::new(Level::Info, "User login\nERROR fake entry\r\tend")
            .with_time(fixed_time())
            .with_fields(&fields);

        let (out, _) = encode_to_string(&ConsoleEncoder::new(), &record);

        assert_eq!(out.matches('\n').count(), 1);
        assert!(out.contains("User login\\nERROR fake entry\\r\\tend"));
        assert!(out.contains("query=\"SELECT * FROM users WHERE id=1\""));
        assert!(out.contains(" badkey=x"));
        assert!(out.contains("error=\"first line\\nsecond line\""));
    }

    #[test]
    fn test_console_empty_and_missing_errors() {
        let err = io::Error::other("");
        let fields = vec![Field::err(&err), Field::named_err("cause", &err), Field::err_opt::<io::Error>(None)];
        let record = Record::new(Level::Warn, "retry")
            .with_time(fixed_time())
            .with_fields(&fields);

        let (out, _) = encode_to_string(&ConsoleEncoder::new(), &record);
        assert!(out.ends_with("retry error=\"\" cause=\"\" error=<nil>\n"));
    }

    #[test]
    fn test_console_any_values() {
        let fields = vec![
            Field::any("tags", vec!["a", "b"]),
            Field::any("name", "plain"),
            Field::any("broken", Unserializable),
        ];
        let record = Record::new(Level::Debug, "values")
            .with_time(fixed_time())
            .with_fields(&fields);

        let (out, issues) = encode_to_string(&ConsoleEncoder::new(), &record);

        assert_eq!(issues.len(), 1);
        assert!(out.contains("tags=\"[\\\"a\\\",\\\"b\\\"]\""));
        assert!(out.contains("name=plain"));
        assert!(out.contains("broken=\"<unrenderable any: refuses to serialize>\""));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("Console".parse::<Format>().unwrap(), Format::Console);
        let err = "xml".parse::<Format>().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert_eq!(Format::default(), Format::Console);
    }

    #[test]
    fn test_format_builds_matching_encoder() {
        assert_eq!(Format::Json.encoder(EncoderConfig::default()).name(), "json");
        assert_eq!(Format::Console.encoder(EncoderConfig::default()).name(), "console");
    }
}
