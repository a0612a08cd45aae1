//! Line sinks for harness output.

use std::cell::RefCell;
use std::rc::Rc;

/// Receives harness output, one line per call, in call order.
pub trait LogSink {
    fn log(&mut self, text: &str);
}

impl<F> LogSink for F
where
    F: FnMut(&str),
{
    fn log(&mut self, text: &str) {
        self(text)
    }
}

/// Collects lines in memory.
impl LogSink for Vec<String> {
    fn log(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

/// First failure raised by a sink that cannot report it through
/// [`LogSink::log`].
///
/// Clones share one slot, so the sink can record a failure and an engine
/// wrapper ([`crate::engine::HaltOnSinkFailure`]) can see it and stop the run.
#[derive(Debug)]
pub struct SinkFailure<E> {
    slot: Rc<RefCell<Option<E>>>,
}

impl<E> Clone for SinkFailure<E> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<E> Default for SinkFailure<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> SinkFailure<E> {
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
        }
    }

    /// Keep `err` unless a failure is already recorded.
    pub fn record(&self, err: E) {
        let mut slot = self.slot.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    pub fn is_set(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub fn take(&self) -> Option<E> {
        self.slot.borrow_mut().take()
    }
}

/// Prints every line to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn log(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Forwards lines to the `log` facade.
///
/// Lines are split on `\n` so that the section header's leading newline
/// does not produce a record with an empty prefix glued to text.
#[derive(Debug, Clone, Copy)]
pub struct LogFacadeSink {
    level: log::Level,
    target: &'static str,
}

impl Default for LogFacadeSink {
    fn default() -> Self {
        Self::new(log::Level::Info)
    }
}

impl LogFacadeSink {
    pub fn new(level: log::Level) -> Self {
        Self {
            level,
            target: module_path!(),
        }
    }

    pub fn with_target(mut self, target: &'static str) -> Self {
        self.target = target;
        self
    }

    pub fn level(&self) -> log::Level {
        self.level
    }
}

impl LogSink for LogFacadeSink {
    fn log(&mut self, text: &str) {
        for line in text.split('\n') {
            log::log!(target: self.target, self.level, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::testing::{install_logger, records_for};

    #[test]
    fn test_vec_sink_keeps_order() {
        let mut lines: Vec<String> = Vec::new();
        lines.log("first");
        lines.log("second");
        assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_closure_sink() {
        let mut count = 0;
        let mut total_len = 0;
        {
            let mut sink = |text: &str| {
                count += 1;
                total_len += text.len();
            };
            sink.log("abc");
            sink.log("de");
        }
        assert_eq!(count, 2);
        assert_eq!(total_len, 5);
    }

    #[test]
    fn test_dyn_sink() {
        let mut lines: Vec<String> = Vec::new();
        let sink: &mut dyn LogSink = &mut lines;
        sink.log("through a trait object");
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_sink_failure_keeps_first() {
        let failure: SinkFailure<String> = SinkFailure::new();
        let shared = failure.clone();
        assert!(!failure.is_set());

        shared.record("first".to_string());
        shared.record("second".to_string());
        assert!(failure.is_set());
        assert_eq!(failure.take(), Some("first".to_string()));
        assert!(!shared.is_set());
    }

    #[test]
    fn test_log_facade_sink() {
        install_logger();

        let mut sink = LogFacadeSink::new(log::Level::Warn).with_target("sink_test");
        assert_eq!(sink.level(), log::Level::Warn);
        sink.log("\nMusicXML -> GMN :");

        assert_eq!(
            records_for("sink_test"),
            vec![
                (log::Level::Warn, "".to_string()),
                (log::Level::Warn, "MusicXML -> GMN :".to_string()),
            ]
        );
    }
}
