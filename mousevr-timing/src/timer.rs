use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Control-loop clock
pub trait Timer: Clone + Send + Sync {
    /// Monotonic milliseconds since the timer was created
    fn now_ms(&self) -> u64;
    fn elapsed(&self, since_ms: u64) -> Duration {
        Duration::from_millis(self.now_ms().saturating_sub(since_ms))
    }
    fn sleep(&self, d: Duration);
    fn record_tick(&mut self, d: Duration);
    fn tick_stats(&self) -> TickStats;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickStats {
    pub samples: usize,
    pub average_tick_ns: f64,
    pub jitter_ns: f64,
    pub min_tick_ns: f64,
    pub max_tick_ns: f64,
    pub effective_hz: f64,
}

/// Bounded window of recent tick durations
#[derive(Debug, Clone)]
struct TickHistory {
    ticks: Vec<Duration>,
    max_samples: usize,
}

impl TickHistory {
    fn new(max_samples: usize) -> Self {
        Self {
            ticks: Vec::with_capacity(max_samples),
            max_samples,
        }
    }

    fn push(&mut self, d: Duration) {
        if self.ticks.len() >= self.max_samples {
            self.ticks.remove(0);
        }
        self.ticks.push(d);
    }

    fn stats(&self) -> TickStats {
        let times: Vec<f64> = self.ticks.iter().map(|d| d.as_nanos() as f64).collect();
        if times.is_empty() {
            return TickStats::default();
        }
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        TickStats {
            samples: times.len(),
            average_tick_ns: avg,
            jitter_ns: var.sqrt(),
            min_tick_ns: min,
            max_tick_ns: max,
            effective_hz: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    start: Instant,
    history: TickHistory,
}

impl Timer for HighPrecisionTimer {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
    fn record_tick(&mut self, d: Duration) {
        self.history.push(d);
    }
    fn tick_stats(&self) -> TickStats {
        self.history.stats()
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            history: TickHistory::new(1000),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        self.portable_sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    // Spin for sub-100µs waits, the OS scheduler is too coarse below that
    #[cfg(not(target_os = "linux"))]
    fn portable_sleep(&self, duration: Duration) {
        if duration.as_nanos() < 100_000 {
            let start = Instant::now();
            while start.elapsed() < duration {
                std::hint::spin_loop();
            }
        } else {
            std::thread::sleep(duration);
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer driven explicitly by the caller; `sleep` advances the clock
#[derive(Debug, Clone)]
pub struct ManualTimer {
    now_ms: Arc<AtomicU64>,
    history: TickHistory,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(0)),
            history: TickHistory::new(1000),
        }
    }

    pub fn advance(&self, d: Duration) {
        self.now_ms
            .fetch_add(d.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_ms(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for ManualTimer {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
    fn record_tick(&mut self, d: Duration) {
        self.history.push(d);
    }
    fn tick_stats(&self) -> TickStats {
        self.history.stats()
    }
}
