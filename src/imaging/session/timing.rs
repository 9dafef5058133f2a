use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: String,
    pub duration: Duration,
}

/// Per-step wall time of a recording.
///
/// Steps with the same name (one `grab` per frame, say) are listed
/// individually in [`steps`](Self::steps) and summed in
/// [`get_step`](Self::get_step).
#[derive(Debug, Default)]
pub struct SessionTimings {
    steps: Vec<StepTiming>,
    step_map: HashMap<String, Duration>,
    frames: usize,
}

impl SessionTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        self.steps.push(StepTiming {
            name: name.clone(),
            duration,
        });
        *self.step_map.entry(name).or_insert(Duration::ZERO) += duration;
    }

    pub(crate) fn record(&mut self, timer: Timer) {
        let (name, duration) = timer.stop();
        self.add_step(name, duration);
    }

    pub(crate) fn count_frame(&mut self) {
        self.frames += 1;
    }

    /// Frames written during the recording.
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    pub fn get_step(&self, name: &str) -> Option<Duration> {
        self.step_map.get(name).copied()
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn log_summary(&self) {
        let total = self.total_duration();
        let mut names: Vec<&String> = self.step_map.keys().collect();
        names.sort();

        info!(frames = self.frames, "Session timing summary");
        for name in names {
            let duration = self.step_map[name];
            let percentage = if total.as_secs_f64() > 0.0 {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            info!(
                "{:<12} {:>12.3}ms ({:>5.1}%)",
                name,
                duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        info!("{:<12} {:>12.3}ms", "total", total.as_secs_f64() * 1000.0);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn stop(self) -> (String, Duration) {
        (self.name, self.start.elapsed())
    }
}
