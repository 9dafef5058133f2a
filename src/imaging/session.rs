//! Capture session module
//!
//! Runs a device through start, grab, write and advance, and times each step.

mod recorder;
mod timing;

#[cfg(test)]
mod tests;

pub use recorder::{frame_file_name, CaptureSession};
pub use timing::{SessionTimings, StepTiming, Timer};
