//! Scoped trace steps.
//!
//! A tracer is handed to whoever needs it (no global). `TracerPlugin::step`
//! returns a [`TraceStep`] guard; the step is closed when the guard drops, so
//! every return path (including unwinding) closes it exactly once.

use std::collections::BTreeMap;

use crate::errors::diagnostic;

/// Name and tags of one trace step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSpan {
    pub name: String,
    pub tags: BTreeMap<String, String>,
}

impl TraceSpan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

pub trait TracerPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn step(&self, span: TraceSpan) -> TraceStep;
}

/// Backend half of a step. `close` is invoked once, by `TraceStep::drop`.
pub trait StepSink: Send {
    fn record_error(&mut self, message: &str);

    fn close(&mut self);

    /// `tracing` span to instrument work inside this step with.
    fn span(&self) -> tracing::Span {
        tracing::Span::none()
    }
}

pub struct TraceStep {
    sink: Box<dyn StepSink>,
    errors: usize,
}

impl TraceStep {
    pub fn new(sink: Box<dyn StepSink>) -> Self {
        Self { sink, errors: 0 }
    }

    pub fn record_error(&mut self, err: &(dyn std::error::Error + 'static)) {
        self.record_error_message(&diagnostic(err));
    }

    pub fn record_error_message(&mut self, message: &str) {
        self.errors += 1;
        self.sink.record_error(message);
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn span(&self) -> tracing::Span {
        self.sink.span()
    }
}

impl Drop for TraceStep {
    fn drop(&mut self) {
        self.sink.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Log(Arc<Mutex<Vec<String>>>);

    impl StepSink for Log {
        fn record_error(&mut self, message: &str) {
            self.0.lock().unwrap().push(format!("error:{message}"));
        }

        fn close(&mut self) {
            self.0.lock().unwrap().push("close".into());
        }
    }

    #[test]
    fn dropping_the_guard_closes_once() {
        let events = Arc::new(Mutex::new(Vec::new()));
        {
            let mut step = TraceStep::new(Box::new(Log(events.clone())));
            step.record_error_message("bad");
            assert_eq!(step.error_count(), 1);
        }
        assert_eq!(*events.lock().unwrap(), vec!["error:bad", "close"]);
    }

    #[test]
    fn guard_closes_on_unwind() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink_events = events.clone();
        let result = std::panic::catch_unwind(move || {
            let _step = TraceStep::new(Box::new(Log(sink_events)));
            panic!("boom");
        });
        assert!(result.is_err());
        assert_eq!(*events.lock().unwrap(), vec!["close"]);
    }

    #[test]
    fn span_tags_are_ordered() {
        let span = TraceSpan::new("Executing ls")
            .with_tag("CWD", "/tmp")
            .with_tag("AAA", "x");
        let keys: Vec<_> = span.tags.keys().cloned().collect();
        assert_eq!(keys, vec!["AAA", "CWD"]);
    }
}
