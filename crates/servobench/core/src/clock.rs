// Servobench
// Copyright (C) 2026 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time source driving the scheduler and the simulated plant.
///
/// `now` is the elapsed time since the clock was created. `wait_until`
/// blocks (or fast-forwards) until `now() >= deadline`, which is what lets
/// the same scheduler loop run paced against wall time or as fast as the
/// simulation allows.
pub trait Clock: Send + Sync {
    /// Monotonic time since clock start.
    fn now(&self) -> Duration;

    /// Park until the given deadline has been reached.
    ///
    /// Deadlines already in the past return immediately. Implementations
    /// must guarantee `now() >= deadline` on return.
    fn wait_until(&self, deadline: Duration);
}

/// Wall-clock implementation backed by [`Instant`].
#[derive(Debug)]
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

    fn wait_until(&self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// Virtual clock for fast-forward simulation and deterministic tests.
///
/// `wait_until` jumps time forward instead of sleeping, so a scheduler run
/// against a `ManualClock` executes a multi-second schedule in microseconds
/// while observing exactly the same release sequence. Time never moves
/// backwards.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock whose `now` starts at the given offset.
    pub fn starting_at(now: Duration) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Move time forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now += delta;
    }

    /// Move time forward to `to`; earlier values are ignored.
    pub fn set_now(&self, to: Duration) {
        let mut now = self.now.lock();
        if to > *now {
            *now = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }

    fn wait_until(&self, deadline: Duration) {
        self.set_now(deadline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_zero() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_millis(10));
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.now(), Duration::from_millis(15));
    }

    #[test]
    fn manual_clock_never_rewinds() {
        let clock = ManualClock::starting_at(Duration::from_secs(1));
        clock.set_now(Duration::from_millis(1));
        assert_eq!(clock.now(), Duration::from_secs(1));
    }

    #[test]
    fn manual_wait_until_fast_forwards() {
        let clock = ManualClock::new();
        clock.wait_until(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));

        // A deadline in the past is a no-op
        clock.wait_until(Duration::from_millis(100));
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn system_wait_until_reaches_deadline() {
        let clock = SystemClock::new();
        let deadline = clock.now() + Duration::from_millis(5);
        clock.wait_until(deadline);
        assert!(clock.now() >= deadline);
    }
}
