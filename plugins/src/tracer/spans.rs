use std::time::Instant;

use kiln_core::api::{StepSink, TraceSpan, TraceStep, TracerPlugin};

/// Emits every trace step as a `tracing` span named `trace.step`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTracer;

impl TracingTracer {
    pub fn new() -> Self {
        Self
    }
}

impl TracerPlugin for TracingTracer {
    fn name(&self) -> &str {
        "tracing"
    }

    fn step(&self, step: TraceSpan) -> TraceStep {
        let span = tracing::info_span!(
            target: "kiln.trace",
            "trace.step",
            step = %step.name,
            tags = ?step.tags,
            errors = tracing::field::Empty,
        );
        span.in_scope(|| tracing::debug!(target: "kiln.trace", "step opened"));

        TraceStep::new(Box::new(SpanSink {
            span,
            started: Instant::now(),
            errors: 0,
            closed: false,
        }))
    }
}

struct SpanSink {
    span: tracing::Span,
    started: Instant,
    errors: u64,
    closed: bool,
}

impl StepSink for SpanSink {
    fn record_error(&mut self, message: &str) {
        self.errors += 1;
        self.span.record("errors", self.errors);
        self.span
            .in_scope(|| tracing::error!(target: "kiln.trace", error = %message, "step error"));
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let errors = self.errors;
        self.span.in_scope(|| {
            tracing::debug!(target: "kiln.trace", elapsed_ms, errors, "step closed")
        });
    }

    fn span(&self) -> tracing::Span {
        self.span.clone()
    }
}
