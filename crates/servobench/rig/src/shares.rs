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

//! The inter-task shares of one bench run.

use servobench_core::control::Sample;
use servobench_core::share::{DataQueue, OverwritePolicy, Share, SharePool, ShareReport};
use servobench_wire::Channel;
use std::sync::Arc;

/// Shares one motor task reads and writes.
#[derive(Clone)]
pub struct MotorShares {
    /// Proportional gain for the channel's controller.
    pub kp: Arc<Share<f32>>,
    /// Target position in encoder counts.
    pub setpoint: Arc<Share<i32>>,
    /// Raised to start sampling, lowered by the task when it finishes.
    pub run: Arc<Share<bool>>,
    /// Raised by the task after the last sample.
    pub done: Arc<Share<bool>>,
    /// Tells the task to zero its encoder and controller on its next release.
    pub reset: Arc<Share<bool>>,
    /// Recorded samples, drained by the runner after the run.
    pub data: Arc<DataQueue<Sample>>,
}

impl MotorShares {
    fn new(pool: &SharePool, channel: Channel, capacity: usize) -> Self {
        Self {
            kp: pool.share(&format!("{channel}.kp"), 0.0f32),
            setpoint: pool.share(&format!("{channel}.setpoint"), 0i32),
            run: pool.share(&format!("{channel}.run"), false),
            done: pool.share(&format!("{channel}.done"), false),
            reset: pool.share(&format!("{channel}.reset"), false),
            data: pool.queue(&format!("{channel}.data"), capacity, OverwritePolicy::Reject),
        }
    }

    /// Prime the channel for a run.
    pub fn arm(&self, kp: f32, setpoint: i32) {
        self.kp.put(kp);
        self.setpoint.put(setpoint);
        self.done.put(false);
        self.reset.put(true);
        self.run.put(true);
    }

    pub fn is_done(&self) -> bool {
        self.done.get()
    }
}

/// All shares of a bench run, registered in one pool so the whole set can be
/// rendered as a diagnostics table.
pub struct RigShares {
    pool: SharePool,
    /// Control period the current run was commanded with.
    pub period_ms: Arc<Share<u32>>,
    pub m0: MotorShares,
    pub m1: MotorShares,
}

impl RigShares {
    /// Build the share set. `samples_per_run` sizes the data queues so a
    /// full run fits without drops.
    pub fn new(samples_per_run: usize, period_ms: u32) -> Self {
        let pool = SharePool::new();
        let period = pool.share("period_ms", period_ms);
        let m0 = MotorShares::new(&pool, Channel::M0, samples_per_run);
        let m1 = MotorShares::new(&pool, Channel::M1, samples_per_run);
        Self {
            pool,
            period_ms: period,
            m0,
            m1,
        }
    }

    pub fn channel(&self, channel: Channel) -> &MotorShares {
        match channel {
            Channel::M0 => &self.m0,
            Channel::M1 => &self.m1,
        }
    }

    pub fn all_done(&self) -> bool {
        self.m0.is_done() && self.m1.is_done()
    }

    /// Snapshot of every share and queue, `show_all` style.
    pub fn report(&self) -> ShareReport {
        self.pool.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_primes_the_flags() {
        let shares = RigShares::new(8, 10);
        shares.m0.done.put(true);

        shares.m0.arm(0.05, 16_000);

        assert_eq!(shares.m0.kp.get(), 0.05);
        assert_eq!(shares.m0.setpoint.get(), 16_000);
        assert!(shares.m0.run.get());
        assert!(shares.m0.reset.get());
        assert!(!shares.m0.is_done());
        assert!(!shares.all_done());
    }

    #[test]
    fn report_covers_both_channels() {
        let shares = RigShares::new(4, 25);
        let report = shares.report();

        assert_eq!(report.len(), 13);
        assert_eq!(report.status_of("period_ms"), Some("25"));
        assert!(report.status_of("m0.data").is_some());
        assert!(report.status_of("m1.kp").is_some());
    }

    #[test]
    fn queues_hold_a_full_run() {
        let shares = RigShares::new(3, 10);
        for i in 0..3 {
            shares.m1.data.try_put(Sample::new(i * 10, i as i32)).unwrap();
        }
        assert!(shares.m1.data.is_full());
        assert!(shares.m1.data.try_put(Sample::new(30, 3)).is_err());
    }
}
