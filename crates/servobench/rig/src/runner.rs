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

//! One commanded step response, end to end.

use crate::config::{MotorConfig, Pace, RigConfig};
use crate::error::RigError;
use crate::shares::{MotorShares, RigShares};
use crate::tasks::{motor_task, MotorTaskSpec};
use servobench_core::clock::{Clock, ManualClock, SystemClock};
use servobench_core::control::{PController, ResponseLog};
use servobench_core::hw::{MotorPlant, SimEncoder, SimMotor};
use servobench_core::sched::{Scheduler, SchedulerSummary};
use servobench_core::share::ShareReport;
use servobench_wire::{Channel, RunRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const MOTOR_PRIORITY: u8 = 10;

/// Everything one run produced: both trajectories plus the diagnostics the
/// original bench printed after stopping.
#[derive(Debug)]
pub struct RunOutcome {
    pub m0: ResponseLog,
    pub m1: ResponseLog,
    pub shares: ShareReport,
    pub summary: SchedulerSummary,
}

impl RunOutcome {
    pub fn log(&self, channel: Channel) -> &ResponseLog {
        match channel {
            Channel::M0 => &self.m0,
            Channel::M1 => &self.m1,
        }
    }
}

/// Execute one step response on a fresh scheduler.
///
/// Every run builds its own clock, plants, shares, and tasks; nothing
/// leaks from one commanded run into the next. Fast pace finishes as
/// quickly as the host allows, real pace takes `samples * period` of wall
/// time.
pub fn run_step_response(config: &RigConfig, request: &RunRequest) -> Result<RunOutcome, RigError> {
    validate_request(request)?;

    let clock: Arc<dyn Clock> = match config.pace {
        Pace::Fast => Arc::new(ManualClock::new()),
        Pace::Real => Arc::new(SystemClock::new()),
    };
    let shares = RigShares::new(config.samples_per_run, request.period_ms);
    let mut scheduler = Scheduler::new(clock.clone());

    for channel in Channel::ALL {
        let motor = config_for(config, channel);
        let plant = Arc::new(MotorPlant::new(motor.plant_params(), clock.clone()));
        let spec = MotorTaskSpec {
            channel,
            priority: MOTOR_PRIORITY,
            period_ms: request.period_ms,
            samples_per_run: config.samples_per_run,
            trace_capacity: config.trace_capacity,
        };
        scheduler.append(motor_task(
            spec,
            shares.channel(channel).clone(),
            Box::new(SimMotor::new(plant.clone())),
            Box::new(SimEncoder::new(plant)),
            Box::new(PController::new(kp_for(request, channel))),
        ));
    }

    shares.m0.arm(request.kp0, request.setpoint0);
    shares.m1.arm(request.kp1, request.setpoint1);
    debug!(pace = %config.pace, samples = config.samples_per_run, period_ms = request.period_ms, "run armed");

    let period = Duration::from_millis(u64::from(request.period_ms));
    let samples = u32::try_from(config.samples_per_run).unwrap_or(u32::MAX);
    scheduler.run_for(period * samples.saturating_add(2));

    if !shares.all_done() {
        return Err(run_failure(&scheduler));
    }

    let outcome = RunOutcome {
        m0: drain_log(&shares.m0),
        m1: drain_log(&shares.m1),
        shares: shares.report(),
        summary: scheduler.summary(),
    };
    info!(m0_samples = outcome.m0.len(), m1_samples = outcome.m1.len(), "run complete");
    Ok(outcome)
}

fn validate_request(request: &RunRequest) -> Result<(), RigError> {
    if request.period_ms == 0 {
        return Err(RigError::Params("period must be at least 1 ms".to_string()));
    }
    if !request.kp0.is_finite() || !request.kp1.is_finite() {
        return Err(RigError::Params("kp must be finite".to_string()));
    }
    Ok(())
}

fn config_for(config: &RigConfig, channel: Channel) -> &MotorConfig {
    match channel {
        Channel::M0 => &config.m0,
        Channel::M1 => &config.m1,
    }
}

fn kp_for(request: &RunRequest, channel: Channel) -> f32 {
    match channel {
        Channel::M0 => request.kp0,
        Channel::M1 => request.kp1,
    }
}

fn drain_log(shares: &MotorShares) -> ResponseLog {
    let mut log = ResponseLog::with_capacity(shares.data.len());
    for sample in shares.data.drain() {
        log.push(sample);
    }
    log
}

fn run_failure(scheduler: &Scheduler) -> RigError {
    let summary = scheduler.summary();
    if let Some(row) = summary.rows().iter().find(|row| row.error.is_some()) {
        return RigError::Run(format!(
            "task {} failed: {}",
            row.name,
            row.error.as_deref().unwrap_or("unknown error"),
        ));
    }
    RigError::Run("run did not finish within its window".to_string())
}
