use log::{log_enabled, Level};
use std::time::Instant;

/// Scoped timer that traces how long a controller pass took.
///
/// Costs nothing beyond an `Instant::now()` unless trace logging is enabled.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Option<Instant>,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        let start = log_enabled!(Level::Trace).then(Instant::now);
        Self { label, start }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            log::trace!("{} took {} µs", self.label, start.elapsed().as_micros());
        }
    }
}
