use rand::Rng;

/// Smallest delay ever armed, in minutes. Keeps the draw strictly positive
/// even when jitter meets or exceeds the interval.
pub const MIN_DELAY_MINUTES: f64 = 0.1;

/// Uniform draw from `[max(0.1, interval - jitter), interval + jitter]`.
/// Collapses to the lower bound when the band is empty.
pub fn randomized_delay_minutes(interval: f64, jitter: f64, rng: &mut impl Rng) -> f64 {
    let min = (interval - jitter).max(MIN_DELAY_MINUTES);
    let max = interval + jitter;
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}

pub fn to_duration(minutes: f64) -> std::time::Duration {
    std::time::Duration::from_secs_f64(minutes * 60.0)
}
