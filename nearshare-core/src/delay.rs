//! Injectable Timing
//!
//! Discovery reveals and transfer ticks are jittered so the simulation feels
//! organic. The jitter comes from a [`DelaySource`] so tests can swap
//! [`RandomDelays`] for the deterministic [`FixedDelays`].

use rand::Rng;
use std::time::Duration;

/// Source of simulated delays and progress steps
pub trait DelaySource: Send + Sync {
    /// Extra delay for the reveal at `index`, at most `max`
    fn reveal_jitter(&self, index: usize, max: Duration) -> Duration;

    /// Delay before a transfer moves from preparing to connecting
    fn connect_delay(&self, min: Duration, max: Duration) -> Duration;

    /// Interval until the next progress tick
    fn tick_interval(&self, min: Duration, max: Duration) -> Duration;

    /// Progress increment in percentage points, within `1..=max_step`
    fn progress_step(&self, max_step: u8) -> u8;
}

/// Uniformly random delays from the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDelays;

impl RandomDelays {
    fn between(min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

impl DelaySource for RandomDelays {
    fn reveal_jitter(&self, _index: usize, max: Duration) -> Duration {
        Self::between(Duration::ZERO, max)
    }

    fn connect_delay(&self, min: Duration, max: Duration) -> Duration {
        Self::between(min, max)
    }

    fn tick_interval(&self, min: Duration, max: Duration) -> Duration {
        Self::between(min, max)
    }

    fn progress_step(&self, max_step: u8) -> u8 {
        rand::thread_rng().gen_range(1..=max_step.max(1))
    }
}

/// Constant delays for deterministic runs
///
/// Values are clamped into the ranges the caller asks for, so a fixed source
/// never produces a delay the random one could not.
///
/// # Examples
///
/// ```
/// use nearshare_core::{DelaySource, FixedDelays};
/// use std::time::Duration;
///
/// let delays = FixedDelays::default().with_step(4);
/// assert_eq!(delays.progress_step(6), 4);
/// assert_eq!(delays.progress_step(2), 2);
/// assert_eq!(delays.reveal_jitter(3, Duration::from_millis(100)), Duration::ZERO);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedDelays {
    pub jitter: Duration,
    pub connect: Duration,
    pub tick: Duration,
    pub step: u8,
}

impl Default for FixedDelays {
    fn default() -> Self {
        Self {
            jitter: Duration::ZERO,
            connect: Duration::from_secs(1),
            tick: Duration::from_millis(100),
            step: 1,
        }
    }
}

impl FixedDelays {
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_connect(mut self, connect: Duration) -> Self {
        self.connect = connect;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_step(mut self, step: u8) -> Self {
        self.step = step;
        self
    }
}

impl DelaySource for FixedDelays {
    fn reveal_jitter(&self, _index: usize, max: Duration) -> Duration {
        self.jitter.min(max)
    }

    fn connect_delay(&self, min: Duration, max: Duration) -> Duration {
        self.connect.clamp(min, max.max(min))
    }

    fn tick_interval(&self, min: Duration, max: Duration) -> Duration {
        self.tick.clamp(min, max.max(min))
    }

    fn progress_step(&self, max_step: u8) -> u8 {
        self.step.clamp(1, max_step.max(1))
    }
}
