//! Error types for the logging core

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Invalid or contradictory construction options
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A field value could not be rendered and was replaced by a placeholder
    #[error("Failed to encode field '{key}': {message}")]
    Encode { key: String, message: String },

    /// A sink rejected a record
    #[error("Write to sink '{sink}' failed: {source}")]
    SinkWrite {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// A sink could not be flushed
    #[error("Flush of sink '{sink}' failed: {source}")]
    SinkFlush {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// Aggregated failures collected while syncing every sink of a core
    #[error("sync failed for {} sink operation(s); first: {}", .failures.len(), first_message(.failures))]
    Sync { failures: Vec<LoggerError> },
}

fn first_message(failures: &[LoggerError]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "sync failed".to_string())
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an encode error for a single field
    pub fn encode(key: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Encode {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a sink write error
    pub fn sink_write(sink: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::SinkWrite {
            sink: sink.into(),
            source,
        }
    }

    /// Create a sink flush error
    pub fn sink_flush(sink: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::SinkFlush {
            sink: sink.into(),
            source,
        }
    }

    /// Sink failures carried by a [`LoggerError::Sync`], or an empty slice
    pub fn failures(&self) -> &[LoggerError] {
        match self {
            LoggerError::Sync { failures } => failures,
            _ => &[],
        }
    }
}
