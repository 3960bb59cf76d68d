//! Core logger types and traits

pub mod encoder;
pub mod engine;
pub mod error;
pub mod field;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod sink;
pub mod timestamp;

pub use encoder::{ConsoleEncoder, Encoder, EncoderConfig, Format, JsonEncoder};
pub use engine::{Core, FatalHook};
pub use error::{LoggerError, Result};
pub use field::{Field, FieldSerialize, FieldValue};
pub use level::Level;
pub use logger::Logger;
pub use metrics::LoggerMetrics;
pub use record::{Caller, Record};
pub use sink::Sink;
pub use timestamp::TimestampFormat;
