use std::fmt;
use std::time::Duration;

use rand::Rng;

/// Source of the random delay added to each hop so installations started
/// together do not write in lockstep.
pub trait JitterSource: Send + Sync + fmt::Debug {
    /// Returns a value in `[0, max_ms)`, or zero when `max_ms` is zero.
    fn sample_ms(&self, max_ms: u64) -> u64;

    fn sample(&self, max_ms: u64) -> Duration {
        Duration::from_millis(self.sample_ms(max_ms))
    }
}

/// Uniform jitter drawn from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformJitter;

impl JitterSource for UniformJitter {
    fn sample_ms(&self, max_ms: u64) -> u64 {
        if max_ms == 0 {
            return 0;
        }
        rand::rng().random_range(0..max_ms)
    }
}

/// Constant jitter, clamped below the requested bound. Used to make hop
/// timing reproducible.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedJitter(pub u64);

impl FixedJitter {
    pub const ZERO: FixedJitter = FixedJitter(0);
}

impl JitterSource for FixedJitter {
    fn sample_ms(&self, max_ms: u64) -> u64 {
        self.0.min(max_ms.saturating_sub(1))
    }
}
