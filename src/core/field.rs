//! Typed key/value fields attached to log calls and logger context
//!
//! A [`Field`] is immutable once built. Call-site fields live only for the
//! duration of the log call; context fields are owned by the [`Logger`] that
//! carries them.
//!
//! [`Logger`]: crate::core::Logger

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Values that can be rendered through serde by the encoders
///
/// Implemented for every `Serialize + Debug + Send + Sync` type, so any such
/// value can be attached with [`Field::any`].
pub trait FieldSerialize: fmt::Debug + Send + Sync {
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T> FieldSerialize for T
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Value type for structured logging fields
#[derive(Debug, Clone)]
pub enum FieldValue {
    String(String),
    Int(i32),
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    Bool(bool),
    Duration(Duration),
    /// Description text of an error, `None` when no error was present
    Error(Option<String>),
    Any(Arc<dyn FieldSerialize>),
}

impl FieldValue {
    /// Short name of the value kind, used in placeholders
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::String(_) => "string",
            FieldValue::Int(_) => "int",
            FieldValue::Int64(_) => "int64",
            FieldValue::Uint64(_) => "uint64",
            FieldValue::Float64(_) => "float64",
            FieldValue::Bool(_) => "bool",
            FieldValue::Duration(_) => "duration",
            FieldValue::Error(_) => "error",
            FieldValue::Any(_) => "any",
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int64(i)
    }
}

impl From<u64> for FieldValue {
    fn from(u: u64) -> Self {
        FieldValue::Uint64(u)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float64(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Duration> for FieldValue {
    fn from(d: Duration) -> Self {
        FieldValue::Duration(d)
    }
}

/// One typed key/value annotation
#[derive(Debug, Clone)]
pub struct Field {
    key: Cow<'static, str>,
    value: FieldValue,
}

impl Field {
    /// Key used by [`Field::err`] and [`Field::err_opt`]
    pub const ERROR_KEY: &'static str = "error";

    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::String(value.into()))
    }

    pub fn int(key: impl Into<Cow<'static, str>>, value: i32) -> Self {
        Self::new(key, FieldValue::Int(value))
    }

    pub fn int64(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self::new(key, FieldValue::Int64(value))
    }

    pub fn uint64(key: impl Into<Cow<'static, str>>, value: u64) -> Self {
        Self::new(key, FieldValue::Uint64(value))
    }

    pub fn float64(key: impl Into<Cow<'static, str>>, value: f64) -> Self {
        Self::new(key, FieldValue::Float64(value))
    }

    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self::new(key, FieldValue::Duration(value))
    }

    /// Attach an error under the `error` key, rendered with its `Display` text
    pub fn err<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::named_err(Self::ERROR_KEY, err)
    }

    /// Attach an optional error; `None` renders as an absent error
    pub fn err_opt<E>(err: Option<&E>) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::new(
            Self::ERROR_KEY,
            FieldValue::Error(err.map(ToString::to_string)),
        )
    }

    pub fn named_err<E>(key: impl Into<Cow<'static, str>>, err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::new(key, FieldValue::Error(Some(err.to_string())))
    }

    /// Attach any serializable value
    ///
    /// Serialization happens at encode time; a value that fails to serialize
    /// is rendered as a placeholder instead of dropping the record.
    pub fn any<T>(key: impl Into<Cow<'static, str>>, value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Self::new(key, FieldValue::Any(Arc::new(value)))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}
