//! Time sources for the panel simulation
//!
//! All timestamps in the crate are `Duration`s measured from the clock's
//! origin. The core never looks at calendar time, only at differences.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source injected into the simulator
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;
}

/// Wall-clock time source backed by `Instant`
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock for deterministic runs
///
/// Clones share the same underlying time, so a test can keep a handle
/// after moving the clock into a simulator.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saturates at `u64::MAX` nanoseconds (about 584 years)
    pub fn advance(&self, by: Duration) {
        let by = as_nanos(by);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(by))
            });
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    pub fn set(&self, at: Duration) {
        self.nanos.store(as_nanos(at), Ordering::SeqCst);
    }
}

fn as_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Fixed-cadence gate for reactor updates
///
/// Fires at most once per poll, and only when a full interval has passed
/// since the last update. Missed intervals are not replayed.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    interval: Duration,
    last_update: Duration,
}

impl SimulationClock {
    pub fn new(interval: Duration, start: Duration) -> Self {
        Self {
            interval,
            last_update: start,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start a new interval at `now`
    pub fn restart(&mut self, now: Duration) {
        self.last_update = now;
    }

    /// Returns true (and restarts the interval) if an update is due at `now`
    pub fn poll(&mut self, now: Duration) -> bool {
        if now.saturating_sub(self.last_update) >= self.interval {
            self.last_update = now;
            true
        } else {
            false
        }
    }
}

/// Per-action cooldown measured from the last successful invocation
#[derive(Debug, Clone)]
pub struct Cooldown {
    period: Duration,
    last_fired: Option<Duration>,
}

impl Cooldown {
    /// A fresh cooldown is immediately available
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_fired: None,
        }
    }

    pub fn is_ready(&self, now: Duration) -> bool {
        match self.last_fired {
            Some(last) => now.saturating_sub(last) >= self.period,
            None => true,
        }
    }

    /// Records a firing at `now` if the cooldown has expired
    pub fn try_fire(&mut self, now: Duration) -> bool {
        if !self.is_ready(now) {
            return false;
        }
        self.last_fired = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance_secs(3);
        assert_eq!(clock.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_manual_clock_keeps_sub_millisecond_time() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_micros(1500));
        clock.advance(Duration::from_nanos(250));
        assert_eq!(clock.now(), Duration::from_nanos(1_500_250));
    }

    #[test]
    fn test_manual_clock_saturates() {
        let clock = ManualClock::new();
        clock.set(Duration::MAX);
        assert_eq!(clock.now(), Duration::from_nanos(u64::MAX));
        clock.advance_secs(1);
        assert_eq!(clock.now(), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn test_simulation_clock_restart() {
        let mut ticker = SimulationClock::new(Duration::from_secs(1), Duration::ZERO);
        ticker.restart(Duration::from_millis(800));
        assert!(!ticker.poll(Duration::from_millis(1000)));
        assert!(ticker.poll(Duration::from_millis(1800)));
    }

    #[test]
    fn test_simulation_clock_fires_once_per_interval() {
        let mut ticker = SimulationClock::new(Duration::from_secs(1), Duration::ZERO);
        assert!(!ticker.poll(Duration::from_millis(999)));
        assert!(ticker.poll(Duration::from_millis(1000)));
        assert!(!ticker.poll(Duration::from_millis(1500)));
        // A long stall yields one update, not a burst
        assert!(ticker.poll(Duration::from_secs(10)));
        assert!(!ticker.poll(Duration::from_millis(10_500)));
    }

    #[test]
    fn test_cooldown() {
        let mut cd = Cooldown::new(Duration::from_secs(5));
        assert!(cd.try_fire(Duration::ZERO));
        assert!(!cd.try_fire(Duration::from_millis(4999)));
        assert!(cd.try_fire(Duration::from_secs(5)));
    }
}
