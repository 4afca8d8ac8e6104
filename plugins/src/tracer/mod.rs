pub mod recording;
pub mod spans;

pub use recording::{RecordedStep, RecordingTracer};
pub use spans::TracingTracer;
