use rand::Rng;
use std::time::Duration;
use tracing::info;

/// Longest foreperiod in seconds
pub const MAX_DELAY_S: f64 = 20.0;

/// Maps a uniform draw onto the capped exponential foreperiod, in seconds.
///
/// `r == 0` is replaced with the smallest positive `f64` so the logarithm
/// stays finite.
pub fn delay_from_uniform(r: f64) -> f64 {
    let r = if r <= 0.0 { f64::MIN_POSITIVE } else { r };
    (10.0 - 10.0 * r.ln()).min(MAX_DELAY_S)
}

pub fn sample_delay<R: Rng>(rng: &mut R) -> Duration {
    let r: f64 = rng.random();
    let secs = delay_from_uniform(r);
    info!("Delay duration: {:.3} s", secs);
    Duration::from_secs_f64(secs)
}
