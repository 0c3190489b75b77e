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

//! Closed-loop position control and step-response evaluation.
//!
//! A [`Controller`] turns a position error into a duty cycle once per
//! control period. [`ResponseLog`] records the measured trajectory and
//! [`StepMetrics`] condenses it into the numbers a tuning session actually
//! compares: rise time, overshoot, settling time and steady-state error.

mod response;

pub use response::{ResponseLog, Sample, StepMetrics};

/// One-step-per-period feedback controller.
///
/// `update` is called once per control period with the commanded and the
/// measured position in encoder counts and returns a duty cycle in percent,
/// already clamped to the actuator range `-100.0..=100.0`.
pub trait Controller: Send {
    fn update(&mut self, setpoint: i64, measured: i64) -> f32;

    /// Clear internal state before a new run. Stateless controllers keep
    /// the default no-op.
    fn reset(&mut self) {}
}

/// Proportional position controller: `duty = kp * (setpoint - measured)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PController {
    kp: f32,
}

impl PController {
    pub fn new(kp: f32) -> Self {
        Self { kp }
    }

    pub fn kp(&self) -> f32 {
        self.kp
    }

    pub fn set_kp(&mut self, kp: f32) {
        self.kp = kp;
    }
}

impl Controller for PController {
    fn update(&mut self, setpoint: i64, measured: i64) -> f32 {
        let error = (setpoint - measured) as f32;
        (self.kp * error).clamp(-100.0, 100.0)
    }
}
