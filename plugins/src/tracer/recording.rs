use std::sync::{Arc, Mutex};

use kiln_core::api::{StepSink, TraceSpan, TraceStep, TracerPlugin};

/// One step as seen by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedStep {
    pub span: TraceSpan,
    pub errors: Vec<String>,
    pub close_count: usize,
}

/// Keeps every step in memory. Used to assert on span lifecycles.
#[derive(Debug, Default, Clone)]
pub struct RecordingTracer {
    steps: Arc<Mutex<Vec<RecordedStep>>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> Vec<RecordedStep> {
        lock(&self.steps).clone()
    }

    pub fn opened(&self) -> usize {
        lock(&self.steps).len()
    }

    /// Steps whose guard has dropped exactly once.
    pub fn closed_once(&self) -> usize {
        lock(&self.steps).iter().filter(|s| s.close_count == 1).count()
    }
}

fn lock(steps: &Mutex<Vec<RecordedStep>>) -> std::sync::MutexGuard<'_, Vec<RecordedStep>> {
    // A panicking test thread must not hide the steps recorded before it.
    steps.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TracerPlugin for RecordingTracer {
    fn name(&self) -> &str {
        "recording"
    }

    fn step(&self, span: TraceSpan) -> TraceStep {
        let index = {
            let mut steps = lock(&self.steps);
            steps.push(RecordedStep {
                span,
                errors: Vec::new(),
                close_count: 0,
            });
            steps.len() - 1
        };
        TraceStep::new(Box::new(RecordingSink {
            steps: self.steps.clone(),
            index,
        }))
    }
}

struct RecordingSink {
    steps: Arc<Mutex<Vec<RecordedStep>>>,
    index: usize,
}

impl StepSink for RecordingSink {
    fn record_error(&mut self, message: &str) {
        if let Some(step) = lock(&self.steps).get_mut(self.index) {
            step.errors.push(message.to_string());
        }
    }

    fn close(&mut self) {
        if let Some(step) = lock(&self.steps).get_mut(self.index) {
            step.close_count += 1;
        }
    }
}
