//! Standard stream sinks

use crate::core::Sink;
use std::io::{self, Write};

/// Writes records to the process's standard error
///
/// Each record is written while holding the stderr lock, so records from
/// different threads never interleave.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl StderrSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for StderrSink {
    fn write(&self, record: &[u8]) -> io::Result<()> {
        io::stderr().lock().write_all(record)
    }

    fn flush(&self) -> io::Result<()> {
        io::stderr().lock().flush()
    }

    fn name(&self) -> &str {
        "stderr"
    }
}

/// Writes records to the process's standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for StdoutSink {
    fn write(&self, record: &[u8]) -> io::Result<()> {
        io::stdout().lock().write_all(record)
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }

    fn name(&self) -> &str {
        "stdout"
    }
}
