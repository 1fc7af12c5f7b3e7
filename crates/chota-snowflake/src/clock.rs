use jiff::Timestamp;
use std::time::Duration;

pub trait Clock: Send + Sync {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
    /// Block and wait until the clock reaches the target time.
    fn wait_until(&self, target: Timestamp);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn wait_until(&self, target: Timestamp) {
        // Waits are at most one millisecond in practice (sequence exhaustion),
        // so sleep in slices no longer than that and re-check.
        loop {
            let now = Timestamp::now();
            if now >= target {
                return;
            }
            let remaining = target.duration_since(now).unsigned_abs();
            std::thread::sleep(remaining.min(Duration::from_millis(1)));
        }
    }
}
