//! The logging engine shared by every logger derived from it

use super::{
    encoder::Encoder,
    error::{LoggerError, Result},
    field::Field,
    level::Level,
    metrics::LoggerMetrics,
    record::{Caller, Record},
    sink::Sink,
};
use crate::sinks::StderrSink;
use arc_swap::ArcSwap;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::Arc;

/// Encode buffers above this capacity are released instead of reused
const MAX_RETAINED_BUFFER: usize = 64 * 1024;

thread_local! {
    static ENCODE_BUFFER: Cell<Vec<u8>> = const { Cell::new(Vec::new()) };
}

/// Borrow this thread's encode buffer
///
/// A re-entrant log call (a sink that logs) finds the slot empty and simply
/// allocates.
fn take_buffer() -> Vec<u8> {
    ENCODE_BUFFER.try_with(Cell::take).unwrap_or_default()
}

fn return_buffer(mut buf: Vec<u8>) {
    if buf.capacity() > MAX_RETAINED_BUFFER {
        return;
    }
    buf.clear();
    let _ = ENCODE_BUFFER.try_with(move |slot| slot.set(buf));
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// What happens once a `Fatal` record has been written and every sink flushed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalHook {
    /// Terminate the process with the given exit code
    Exit(i32),
    /// Panic on the calling thread
    Panic,
    /// Return to the caller, which decides how to terminate
    Continue,
}

impl Default for FatalHook {
    fn default() -> Self {
        FatalHook::Exit(1)
    }
}

struct SinkSlot {
    sink: Arc<dyn Sink>,
    /// First write error since the last sync
    pending: Mutex<Option<io::Error>>,
}

impl SinkSlot {
    fn new(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            pending: Mutex::new(None),
        }
    }

    fn record_pending(&self, err: io::Error) {
        let mut pending = self.pending.lock();
        if pending.is_none() {
            *pending = Some(err);
        }
    }

    fn take_pending(&self) -> Option<io::Error> {
        self.pending.lock().take()
    }
}

/// Immutable configuration snapshot, replaced as a whole on every change
#[derive(Clone)]
struct CoreConfig {
    level: Level,
    encoder: Arc<dyn Encoder>,
    sinks: Vec<Arc<SinkSlot>>,
    include_caller: bool,
    fatal_hook: FatalHook,
}

/// The engine behind every [`Logger`](crate::Logger)
///
/// Holds the level gate, the encoder and the ordered sink list. The
/// configuration lives in a single snapshot behind an [`ArcSwap`]: log calls
/// read it without locking and every mutation publishes a complete new
/// snapshot, so no reader ever sees a mix of old and new settings.
pub struct Core {
    config: ArcSwap<CoreConfig>,
    /// Where sink failures are reported as they happen
    error_output: Arc<dyn Sink>,
    metrics: LoggerMetrics,
}

impl Core {
    /// Create a core at `Info` level without caller capture
    pub fn new(encoder: Arc<dyn Encoder>, sinks: Vec<Arc<dyn Sink>>) -> Self {
        let config = CoreConfig {
            level: Level::default(),
            encoder,
            sinks: sinks
                .into_iter()
                .map(|sink| Arc::new(SinkSlot::new(sink)))
                .collect(),
            include_caller: false,
            fatal_hook: FatalHook::default(),
        };

        Self {
            config: ArcSwap::from_pointee(config),
            error_output: Arc::new(StderrSink::new()),
            metrics: LoggerMetrics::new(),
        }
    }

    #[must_use]
    pub fn with_level(self, level: Level) -> Self {
        self.set_level(level);
        self
    }

    /// Capture the file and line of each log call
    #[must_use]
    pub fn with_caller(self, include_caller: bool) -> Self {
        self.reconfigure(|config| config.include_caller = include_caller);
        self
    }

    #[must_use]
    pub fn with_fatal_hook(self, hook: FatalHook) -> Self {
        self.reconfigure(|config| config.fatal_hook = hook);
        self
    }

    /// Replace the sink that receives internal failure reports
    #[must_use]
    pub fn with_error_output(mut self, error_output: Arc<dyn Sink>) -> Self {
        self.error_output = error_output;
        self
    }

    fn reconfigure(&self, update: impl Fn(&mut CoreConfig)) {
        self.config.rcu(|current| {
            let mut next = CoreConfig::clone(current);
            update(&mut next);
            next
        });
    }

    /// Whether a record at `level` would be emitted
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.config.load().level
    }

    pub fn level(&self) -> Level {
        self.config.load().level
    }

    pub fn set_level(&self, level: Level) {
        self.reconfigure(|config| config.level = level);
    }

    /// Append a sink; it receives every record logged after this returns
    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        let slot = Arc::new(SinkSlot::new(sink));
        self.reconfigure(|config| config.sinks.push(Arc::clone(&slot)));
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.config
            .load()
            .sinks
            .iter()
            .map(|slot| slot.sink.name().to_string())
            .collect()
    }

    pub fn encoder_name(&self) -> String {
        self.config.load().encoder.name().to_string()
    }

    pub fn includes_caller(&self) -> bool {
        self.config.load().include_caller
    }

    pub fn fatal_hook(&self) -> FatalHook {
        self.config.load().fatal_hook
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Gate, encode and write one record
    ///
    /// Never returns an error: sink failures are reported on the error output
    /// and surfaced by the next [`Core::sync`]. At [`Level::Fatal`] every sink
    /// is flushed before the fatal hook runs; that flush leaves recorded write
    /// errors in place, so a later sync still returns them.
    pub fn log(
        &self,
        level: Level,
        message: &str,
        context: &[Field],
        fields: &[Field],
        location: &'static Location<'static>,
    ) {
        let config = self.config.load();
        if level < config.level {
            return;
        }

        let mut record = Record::new(level, message)
            .with_context(context)
            .with_fields(fields);
        if config.include_caller {
            record = record.with_caller(Caller::from(location));
        }

        let mut buf = take_buffer();
        let issues = config.encoder.encode(&record, &mut buf);
        if !issues.is_empty() {
            self.report_encode_issues(&issues);
        }
        self.write_to_sinks(&config.sinks, &buf);
        return_buffer(buf);

        if level == Level::Fatal {
            // Pending write errors stay in their slots for the next sync
            for (idx, slot) in config.sinks.iter().enumerate() {
                let _ = self.flush_slot(idx, slot);
            }
            let _ = self.error_output.flush();
            Self::run_fatal_hook(config.fatal_hook, message);
        }
    }

    /// Flush every sink, attempting all of them even after a failure
    ///
    /// Write errors recorded since the previous sync are returned along with
    /// flush errors, in sink order.
    pub fn sync(&self) -> Result<()> {
        let config = self.config.load();
        let mut failures = Vec::new();

        for (idx, slot) in config.sinks.iter().enumerate() {
            if let Some(err) = slot.take_pending() {
                failures.push(LoggerError::sink_write(slot.sink.name(), err));
            }
            if let Some(err) = self.flush_slot(idx, slot) {
                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::Sync { failures })
        }
    }

    /// Write one record to every sink with per-sink panic isolation
    fn write_to_sinks(&self, sinks: &[Arc<SinkSlot>], record: &[u8]) {
        let mut has_error = false;

        for (idx, slot) in sinks.iter().enumerate() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| slot.sink.write(record)));

            let err = match result {
                Ok(Ok(())) => {
                    self.metrics.record_sink_write();
                    continue;
                }
                Ok(Err(e)) => {
                    self.report(format_args!(
                        "[LOGGER ERROR] Sink #{} ({}) write failed: {}",
                        idx,
                        slot.sink.name(),
                        e
                    ));
                    e
                }
                Err(panic_info) => {
                    let panic_msg = panic_message(&*panic_info);
                    self.metrics.record_sink_panic();
                    self.report(format_args!(
                        "[LOGGER CRITICAL] Sink #{} ({}) panicked during write: {}. \
                         Other sinks continue to function.",
                        idx,
                        slot.sink.name(),
                        panic_msg
                    ));
                    io::Error::other(format!("sink panicked: {}", panic_msg))
                }
            };

            has_error = true;
            self.metrics.record_write_failure();
            slot.record_pending(err);
        }

        if !has_error {
            self.metrics.record_written();
        }
    }

    /// Flush one sink, reporting and returning any failure
    fn flush_slot(&self, idx: usize, slot: &SinkSlot) -> Option<LoggerError> {
        let name = slot.sink.name();

        match panic::catch_unwind(AssertUnwindSafe(|| slot.sink.flush())) {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                self.metrics.record_flush_failure();
                self.report(format_args!(
                    "[LOGGER ERROR] Sink #{} ({}) flush failed: {}",
                    idx, name, e
                ));
                Some(LoggerError::sink_flush(name, e))
            }
            Err(panic_info) => {
                let panic_msg = panic_message(&*panic_info);
                self.metrics.record_sink_panic();
                self.metrics.record_flush_failure();
                self.report(format_args!(
                    "[LOGGER CRITICAL] Sink #{} ({}) panicked during flush: {}. \
                     Other sinks continue to function.",
                    idx, name, panic_msg
                ));
                Some(LoggerError::sink_flush(
                    name,
                    io::Error::other(format!("sink panicked: {}", panic_msg)),
                ))
            }
        }
    }

    fn report_encode_issues(&self, issues: &[LoggerError]) {
        self.metrics.record_encode_placeholders(issues.len() as u64);
        for issue in issues {
            self.report(format_args!("[LOGGER WARNING] {}; placeholder written", issue));
        }
    }

    /// Write one line to the error output, ignoring its own failures
    fn report(&self, args: fmt::Arguments<'_>) {
        let line = format!("{} {}\n", Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"), args);
        let _ = panic::catch_unwind(AssertUnwindSafe(|| self.error_output.write(line.as_bytes())));
    }

    fn run_fatal_hook(hook: FatalHook, message: &str) {
        match hook {
            FatalHook::Exit(code) => std::process::exit(code),
            FatalHook::Panic => panic!("fatal log record: {}", message),
            FatalHook::Continue => {}
        }
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.config.load();
        f.debug_struct("Core")
            .field("level", &config.level)
            .field("encoder", &config.encoder.name())
            .field("sinks", &self.sink_names())
            .field("include_caller", &config.include_caller)
            .field("fatal_hook", &config.fatal_hook)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConsoleEncoder, JsonEncoder};
    use crate::sinks::MemorySink;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FailingSink {
        writes: AtomicUsize,
        flushes: AtomicUsize,
    }

    impl Sink for FailingSink {
        fn write(&self, _record: &[u8]) -> io::Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(io::Error::other("simulated write failure"))
        }

        fn flush(&self) -> io::Result<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingSink;

    impl Sink for PanickingSink {
        fn write(&self, _record: &[u8]) -> io::Result<()> {
            panic!("sink exploded");
        }

        fn flush(&self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Holds writes in a staging area until flushed
    #[derive(Default)]
    struct StagingSink {
        staged: Mutex<Vec<u8>>,
        durable: Mutex<Vec<u8>>,
    }

    impl Sink for StagingSink {
        fn write(&self, record: &[u8]) -> io::Result<()> {
            self.staged.lock().extend_from_slice(record);
            Ok(())
        }

        fn flush(&self) -> io::Result<()> {
            let staged = std::mem::take(&mut *self.staged.lock());
            self.durable.lock().extend_from_slice(&staged);
            Ok(())
        }
    }

    fn memory_core(level: Level) -> (Core, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let core = Core::new(Arc::new(ConsoleEncoder::new()), vec![sink.clone() as Arc<dyn Sink>])
            .with_level(level)
            .with_error_output(Arc::new(MemorySink::new()));
        (core, sink)
    }

    #[test]
    fn test_gating_monotonicity() {
        for min in Level::ALL {
            let (core, sink) = memory_core(min);
            for level in Level::ALL.into_iter().filter(|l| *l != Level::Fatal) {
                core.log(level, "gated", &[], &[], Location::caller());
                let expected = level >= min;
                assert_eq!(core.enabled(level), expected);
                assert_eq!(
                    sink.lines().last().map(|l| l.contains(level.as_str())).unwrap_or(false),
                    expected,
                    "min={} level={}",
                    min,
                    level
                );
                sink.clear();
            }
        }
    }

    #[test]
    fn test_disabled_call_writes_nothing() {
        let (core, sink) = memory_core(Level::Info);
        core.log(Level::Debug, "hidden", &[], &[Field::int("n", 1)], Location::caller());

        assert_eq!(sink.write_count(), 0);
        assert_eq!(core.metrics().records_written(), 0);
    }

    #[test]
    fn test_failing_sink_does_not_block_others() {
        let failing = Arc::new(FailingSink::default());
        let healthy = Arc::new(MemorySink::new());
        let errors = Arc::new(MemorySink::new());
        let core = Core::new(
            Arc::new(JsonEncoder::new()),
            vec![failing.clone() as Arc<dyn Sink>, healthy.clone() as Arc<dyn Sink>],
        )
        .with_error_output(errors.clone());

        core.log(Level::Info, "one record", &[], &[], Location::caller());

        assert_eq!(healthy.lines().len(), 1);
        assert_eq!(core.metrics().write_failures(), 1);
        assert!(errors.contents().contains("[LOGGER ERROR] Sink #0 (failing) write failed"));

        let err = core.sync().unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert!(matches!(&err.failures()[0], LoggerError::SinkWrite { sink, .. } if sink == "failing"));
        assert_eq!(failing.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.flush_count(), 1);

        // Pending write errors are reported once
        assert!(core.sync().is_ok());
    }

    #[test]
    fn test_panicking_sink_is_isolated() {
        let healthy = Arc::new(MemorySink::new());
        let core = Core::new(
            Arc::new(ConsoleEncoder::new()),
            vec![Arc::new(PanickingSink) as Arc<dyn Sink>, healthy.clone() as Arc<dyn Sink>],
        )
        .with_error_output(Arc::new(MemorySink::new()));

        core.log(Level::Warn, "still delivered", &[], &[], Location::caller());

        assert_eq!(healthy.lines().len(), 1);
        assert_eq!(core.metrics().sink_panics(), 1);
        let err = core.sync().unwrap_err();
        assert!(err.to_string().contains("sink panicked: sink exploded"));
    }

    #[test]
    fn test_set_level_is_visible_to_next_call() {
        let (core, sink) = memory_core(Level::Error);
        core.log(Level::Info, "before", &[], &[], Location::caller());
        core.set_level(Level::Debug);
        core.log(Level::Info, "after", &[], &[], Location::caller());

        assert_eq!(core.level(), Level::Debug);
        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("after"));
    }

    #[test]
    fn test_add_sink_receives_later_records() {
        let (core, first) = memory_core(Level::Info);
        core.log(Level::Info, "one", &[], &[], Location::caller());

        let second = Arc::new(MemorySink::new().with_name("second"));
        core.add_sink(second.clone());
        core.log(Level::Info, "two", &[], &[], Location::caller());

        assert_eq!(first.lines().len(), 2);
        assert_eq!(second.lines().len(), 1);
        assert_eq!(core.sink_names(), vec!["memory".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_caller_only_when_enabled() {
        let sink = Arc::new(MemorySink::new());
        let core = Core::new(Arc::new(JsonEncoder::new()), vec![sink.clone() as Arc<dyn Sink>]);

        core.log(Level::Info, "no caller", &[], &[], Location::caller());
        let core = core.with_caller(true);
        core.log(Level::Info, "with caller", &[], &[], Location::caller());

        let lines = sink.lines();
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert!(first.get("caller").is_none());
        assert!(second["caller"].as_str().unwrap().contains("engine.rs:"));
    }

    #[test]
    fn test_fatal_flushes_before_returning() {
        let staging = Arc::new(StagingSink::default());
        let core = Core::new(Arc::new(ConsoleEncoder::new()), vec![staging.clone() as Arc<dyn Sink>])
            .with_fatal_hook(FatalHook::Continue);

        core.log(Level::Error, "staged only", &[], &[], Location::caller());
        assert!(staging.durable.lock().is_empty());

        core.log(Level::Fatal, "disk on fire", &[], &[], Location::caller());

        let durable = String::from_utf8(staging.durable.lock().clone()).unwrap();
        assert!(durable.contains("staged only"));
        assert!(durable.contains("disk on fire"));
        assert!(staging.staged.lock().is_empty());
    }

    #[test]
    fn test_write_errors_survive_fatal_flush() {
        let failing = Arc::new(FailingSink::default());
        let healthy = Arc::new(MemorySink::new());
        let core = Core::new(
            Arc::new(JsonEncoder::new()),
            vec![failing.clone() as Arc<dyn Sink>, healthy.clone() as Arc<dyn Sink>],
        )
        .with_fatal_hook(FatalHook::Continue)
        .with_error_output(Arc::new(MemorySink::new()));

        core.log(Level::Info, "before", &[], &[], Location::caller());
        core.log(Level::Fatal, "fatal", &[], &[], Location::caller());

        assert_eq!(healthy.lines().len(), 2);
        assert_eq!(healthy.flush_count(), 1);
        assert_eq!(failing.flushes.load(Ordering::SeqCst), 1);

        let err = core.sync().expect_err("write errors must outlive the fatal flush");
        assert_eq!(err.failures().len(), 1);
        assert!(matches!(&err.failures()[0], LoggerError::SinkWrite { sink, .. } if sink == "failing"));
        assert!(core.sync().is_ok());
    }

    #[test]
    fn test_write_failure_rate_counts_each_sink() {
        let failing = Arc::new(FailingSink::default());
        let healthy = Arc::new(MemorySink::new());
        let core = Core::new(
            Arc::new(ConsoleEncoder::new()),
            vec![failing.clone() as Arc<dyn Sink>, healthy.clone() as Arc<dyn Sink>],
        )
        .with_error_output(Arc::new(MemorySink::new()));

        for _ in 0..10 {
            core.log(Level::Info, "half delivered", &[], &[], Location::caller());
        }

        let metrics = core.metrics();
        assert_eq!(healthy.write_count(), 10);
        assert_eq!(metrics.sink_writes(), 10);
        assert_eq!(metrics.write_failures(), 10);
        assert_eq!(metrics.records_written(), 0);
        assert_eq!(metrics.write_failure_rate(), 50.0);
    }

    #[test]
    #[should_panic(expected = "fatal log record: unrecoverable")]
    fn test_fatal_panic_hook() {
        let (core, _sink) = memory_core(Level::Info);
        let core = core.with_fatal_hook(FatalHook::Panic);
        core.log(Level::Fatal, "unrecoverable", &[], &[], Location::caller());
    }

    #[test]
    fn test_encode_placeholders_are_counted() {
        let sink = Arc::new(MemorySink::new());
        let core = Core::new(Arc::new(JsonEncoder::new()), vec![sink.clone() as Arc<dyn Sink>])
            .with_error_output(Arc::new(MemorySink::new()));

        core.log(Level::Info, "ratio", &[], &[Field::float64("r", f64::INFINITY)], Location::caller());

        assert_eq!(core.metrics().encode_placeholders(), 1);
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn test_fatal_hook_serde() {
        assert_eq!(serde_json::to_string(&FatalHook::Continue).unwrap(), "\"continue\"");
        let hook: FatalHook = serde_json::from_str("{\"exit\":3}").unwrap();
        assert_eq!(hook, FatalHook::Exit(3));
        assert_eq!(FatalHook::default(), FatalHook::Exit(1));
    }
}
