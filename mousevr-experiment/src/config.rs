use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and waypoint constants for the task variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskTiming {
    pub tick_hz: f64,
    /// Cue-to-punishment latency when the target is not reached
    pub punishment_latency_s: f64,
    /// Cue-to-trial-end duration for failed trials
    pub punishment_duration_s: f64,
    pub start_waypoint: String,
    pub origin_waypoint: String,
}

impl Default for TaskTiming {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            punishment_latency_s: 2.0,
            punishment_duration_s: 6.0,
            start_waypoint: "10".to_string(),
            origin_waypoint: "0".to_string(),
        }
    }
}

impl TaskTiming {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz)
    }

    pub fn punishment_latency(&self) -> Duration {
        Duration::from_secs_f64(self.punishment_latency_s)
    }

    pub fn punishment_duration(&self) -> Duration {
        Duration::from_secs_f64(self.punishment_duration_s)
    }
}
