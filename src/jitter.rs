//! Jittered timeouts
//!
//! Waits are drawn from a discrete grid `{min, min + step, ..., <= max}` so
//! consecutive requests never share a fixed interval while staying bounded.

use rand::Rng;
use std::time::Duration;

/// Grid step for page and navigation waits (milliseconds)
pub const NAVIGATION_STEP_MS: u64 = 5000;

/// Grid step for short UI-interaction waits (milliseconds)
pub const INTERACTION_STEP_MS: u64 = 150;

/// Picks a navigation timeout between `min_ms` and `max_ms` on a 5000 ms grid
pub fn randomize_timeout(min_ms: u64, max_ms: u64) -> Duration {
    Duration::from_millis(jittered_ms(
        &mut rand::thread_rng(),
        min_ms,
        max_ms,
        NAVIGATION_STEP_MS,
    ))
}

/// Picks an interaction timeout between `min_ms` and `max_ms` on a 150 ms grid
pub fn random_small_timeout(min_ms: u64, max_ms: u64) -> Duration {
    Duration::from_millis(jittered_ms(
        &mut rand::thread_rng(),
        min_ms,
        max_ms,
        INTERACTION_STEP_MS,
    ))
}

/// Draws uniformly from `{min, min + step, ..., <= max}`
///
/// Returns `min` when the range is inverted or `step` is zero.
pub fn jittered_ms<R: Rng>(rng: &mut R, min_ms: u64, max_ms: u64, step: u64) -> u64 {
    if max_ms <= min_ms || step == 0 {
        return min_ms;
    }
    let slots = (max_ms - min_ms) / step;
    min_ms + rng.gen_range(0..=slots) * step
}
