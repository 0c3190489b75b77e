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

//! The periodic motor control task.

use crate::shares::MotorShares;
use servobench_core::control::{Controller, Sample};
use servobench_core::hw::{CounterAccumulator, Encoder, MotorDriver};
use servobench_core::sched::{StateId, Task};
use servobench_wire::Channel;
use std::time::Duration;

/// Waiting for the run flag.
pub const STATE_IDLE: StateId = 0;
/// Sampling and driving the motor.
pub const STATE_RUN: StateId = 1;
/// Run finished, duty dropped to zero.
pub const STATE_DONE: StateId = 2;

/// Static parameters of one motor task.
#[derive(Debug, Clone, Copy)]
pub struct MotorTaskSpec {
    pub channel: Channel,
    pub priority: u8,
    pub period_ms: u32,
    pub samples_per_run: usize,
    /// State-trace ring size; zero disables tracing.
    pub trace_capacity: usize,
}

/// Build the periodic control task for one motor channel.
///
/// # Workflow
///
/// Each release the body:
/// 1. On a raised reset flag, zeros the encoder, the accumulator, the
///    controller, and the data queue, then re-enables the driver.
/// 2. While idle, waits for the run flag.
/// 3. While running, reads the encoder, folds the raw count into the
///    accumulated position, updates the controller against the setpoint
///    share, commands the resulting duty, and queues one sample.
/// 4. After the configured sample count, drops duty to zero, disables the
///    channel, and raises the done flag.
///
/// Sample timestamps are `index * period`; the time axis is the release
/// schedule, not the (possibly jittered) execution instants.
pub fn motor_task(
    spec: MotorTaskSpec,
    shares: MotorShares,
    mut driver: Box<dyn MotorDriver>,
    mut encoder: Box<dyn Encoder>,
    mut controller: Box<dyn Controller>,
) -> Task {
    let mut accumulator = CounterAccumulator::default();
    let mut taken = 0usize;
    let mut state = STATE_IDLE;

    let mut task = Task::new(format!("motor-{}", spec.channel), move |_ctx| {
        if shares.reset.get() {
            shares.reset.put(false);
            encoder.zero()?;
            accumulator.reset(encoder.read()?);
            controller.reset();
            shares.data.clear();
            driver.enable()?;
            taken = 0;
            state = STATE_IDLE;
        }

        if state == STATE_IDLE && shares.run.get() {
            state = STATE_RUN;
        }

        if state == STATE_RUN {
            let raw = encoder.read()?;
            let count = accumulator.update(raw).clamp(i64::from(i32::MIN), i64::from(i32::MAX));
            let duty = controller.update(i64::from(shares.setpoint.get()), count);
            driver.set_duty(duty)?;

            let t_ms = (taken as u32).saturating_mul(spec.period_ms);
            shares.data.try_put(Sample::new(t_ms, count as i32))?;
            taken += 1;

            if taken >= spec.samples_per_run {
                driver.set_duty(0.0)?;
                driver.disable()?;
                shares.run.put(false);
                shares.done.put(true);
                state = STATE_DONE;
            }
        }

        Ok(state)
    })
    .with_priority(spec.priority)
    .with_period(Duration::from_millis(u64::from(spec.period_ms)))
    .with_profile();
    if spec.trace_capacity > 0 {
        task = task.with_trace(spec.trace_capacity);
    }
    task
}
