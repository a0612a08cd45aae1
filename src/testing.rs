//! Capture logger shared by the unit tests.

use std::sync::{Mutex, Once};

pub(crate) struct CaptureLogger {
    records: Mutex<Vec<(log::Level, String, String)>>,
}

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        self.records.lock().unwrap().push((
            record.level(),
            record.target().to_string(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};
static INIT: Once = Once::new();

pub(crate) fn install_logger() {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(log::LevelFilter::Trace);
    });
}

/// Records whose target is exactly `target`, oldest first.
pub(crate) fn records_for(target: &str) -> Vec<(log::Level, String)> {
    LOGGER
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, t, _)| t == target)
        .map(|(level, _, message)| (*level, message.clone()))
        .collect()
}
