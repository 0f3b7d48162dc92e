use rand::Rng;
use std::time::Duration;

/// Exponential delay between rename attempts, capped at `max`.
///
/// With `jitter` on, the delay is drawn from the upper half of the capped
/// value (`exp / 2..=exp`), so a retry never fires sooner than half the
/// nominal wait even when `base` is only a few milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter: bool,
}

const MAX_DOUBLINGS: u32 = 16;

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, jitter: bool) -> Self {
        Self { base, max, jitter }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with_rng(attempt, &mut rand::thread_rng())
    }

    /// Delay before retry number `attempt` (zero-based), using `rng` for
    /// jitter.
    pub fn delay_with_rng<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let nominal = as_millis(self.base)
            .saturating_mul(1u64 << attempt.min(MAX_DOUBLINGS))
            .min(as_millis(self.max));
        if !self.jitter || nominal == 0 {
            return Duration::from_millis(nominal);
        }
        Duration::from_millis(rng.gen_range(nominal / 2..=nominal))
    }
}
