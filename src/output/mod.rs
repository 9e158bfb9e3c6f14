//! Output sink for per-task progress reporting
//!
//! Executors report through [`Output`] and never branch on it. Two sinks
//! ship with the crate:
//!
//! - [`LogOutput`] writes JSON lines through the [`Logger`].
//! - [`MemoryOutput`] records every emitted line, mostly for tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::observability::{Event, Logger, Severity};

/// Write-only, fire-and-forget progress sink.
pub trait Output: Send + Sync {
    /// Emit one progress line.
    fn emit(&self, severity: Severity, event: Event, fields: &[(&str, &str)]);

    /// Emit at INFO.
    fn info(&self, event: Event, fields: &[(&str, &str)]) {
        self.emit(Severity::Info, event, fields);
    }

    /// Emit at WARN.
    fn warn(&self, event: Event, fields: &[(&str, &str)]) {
        self.emit(Severity::Warn, event, fields);
    }

    /// Emit at ERROR.
    fn error(&self, event: Event, fields: &[(&str, &str)]) {
        self.emit(Severity::Error, event, fields);
    }
}

/// Sink backed by the structured logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOutput;

impl LogOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Output for LogOutput {
    fn emit(&self, severity: Severity, event: Event, fields: &[(&str, &str)]) {
        Logger::log(severity, event.as_str(), fields);
    }
}

/// One line captured by [`MemoryOutput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub severity: Severity,
    pub event: Event,
    pub fields: BTreeMap<String, String>,
}

impl OutputRecord {
    /// Value of a field, if present.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Rendered JSON line, as [`LogOutput`] would have written it.
    pub fn to_line(&self) -> String {
        let fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        Logger::render(self.severity, self.event.as_str(), &fields)
    }
}

/// In-memory sink. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryOutput {
    records: Arc<Mutex<Vec<OutputRecord>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<OutputRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All recorded lines in emission order.
    pub fn records(&self) -> Vec<OutputRecord> {
        self.lock().clone()
    }

    /// Recorded event kinds in emission order.
    pub fn events(&self) -> Vec<Event> {
        self.lock().iter().map(|r| r.event).collect()
    }

    /// Recorded lines of one event kind.
    pub fn records_for(&self, event: Event) -> Vec<OutputRecord> {
        self.lock()
            .iter()
            .filter(|r| r.event == event)
            .cloned()
            .collect()
    }

    /// Recorded lines of one event kind for one task id.
    pub fn task_records(&self, event: Event, task: &str) -> Vec<OutputRecord> {
        self.records_for(event)
            .into_iter()
            .filter(|r| r.field("task") == Some(task))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Output for MemoryOutput {
    fn emit(&self, severity: Severity, event: Event, fields: &[(&str, &str)]) {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.lock().push(OutputRecord {
            severity,
            event,
            fields,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_output_records_in_order() {
        let output = MemoryOutput::new();

        output.info(Event::TaskStart, &[("task", "db")]);
        output.error(Event::TaskFailed, &[("task", "db"), ("reason", "boom")]);

        assert_eq!(output.len(), 2);
        assert_eq!(output.events(), vec![Event::TaskStart, Event::TaskFailed]);

        let failed = output.task_records(Event::TaskFailed, "db");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].severity, Severity::Error);
        assert_eq!(failed[0].field("reason"), Some("boom"));
    }

    #[test]
    fn test_memory_output_clones_share_buffer() {
        let output = MemoryOutput::new();
        let clone = output.clone();

        clone.warn(Event::TaskWarning, &[]);

        assert!(!output.is_empty());
    }

    #[test]
    fn test_record_renders_log_line() {
        let output = MemoryOutput::new();
        output.info(Event::TaskComplete, &[("task", "uploads")]);

        let line = output.records()[0].to_line();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(parsed["event"], "TASK_COMPLETE");
        assert_eq!(parsed["task"], "uploads");
    }

    #[test]
    fn test_log_output_does_not_panic() {
        LogOutput::new().info(Event::TaskSkipped, &[("task", "pages")]);
    }
}
