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

use crate::clock::Clock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Physical characteristics of a simulated motor channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantParams {
    /// Steady-state speed in encoder counts per second at 100% duty.
    pub max_speed_cps: f64,
    /// First-order time constant of the velocity response.
    pub tau: Duration,
    /// Amplitude of uniform measurement noise in counts. Zero disables it.
    pub noise_counts: f64,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            max_speed_cps: 20_000.0,
            tau: Duration::from_millis(150),
            noise_counts: 0.0,
        }
    }
}

/// First-order DC motor model advanced lazily against a [`Clock`].
///
/// Velocity follows `dv/dt = (v_target - v) / tau` where `v_target` is the
/// commanded duty fraction times `max_speed_cps` (zero while disabled).
/// State is updated with the exact solution of that equation over the
/// elapsed interval, so the trajectory is independent of how often the
/// plant is observed. Observing through a fast-forwarding clock therefore
/// produces the same response a wall-clock run would.
///
/// # Thread Safety
///
/// State sits behind a mutex; a plant is shared between a [`SimMotor`]
/// and a [`SimEncoder`] through an `Arc`.
///
/// [`SimMotor`]: crate::hw::SimMotor
/// [`SimEncoder`]: crate::hw::SimEncoder
pub struct MotorPlant {
    params: PlantParams,
    clock: Arc<dyn Clock>,
    state: Mutex<PlantState>,
}

#[derive(Debug, Clone, Copy)]
struct PlantState {
    last_update: Duration,
    velocity: f64,
    position: f64,
    duty: f32,
    enabled: bool,
}

impl MotorPlant {
    pub fn new(params: PlantParams, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            params,
            clock,
            state: Mutex::new(PlantState {
                last_update: now,
                velocity: 0.0,
                position: 0.0,
                duty: 0.0,
                enabled: false,
            }),
        }
    }

    pub fn params(&self) -> PlantParams {
        self.params
    }

    /// Command a duty cycle in percent, clamped to `-100.0..=100.0`.
    ///
    /// The plant is advanced to the current time first, so the new duty
    /// takes effect from now rather than being back-dated.
    pub fn set_duty(&self, percent: f32) {
        let mut state = self.state.lock();
        self.advance(&mut state);
        state.duty = percent.clamp(-100.0, 100.0);
    }

    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        self.advance(&mut state);
        state.enabled = enabled;
    }

    /// Current position in counts, advanced to the clock's now.
    pub fn position(&self) -> f64 {
        let mut state = self.state.lock();
        self.advance(&mut state);
        state.position
    }

    /// Current velocity in counts per second, advanced to the clock's now.
    pub fn velocity(&self) -> f64 {
        let mut state = self.state.lock();
        self.advance(&mut state);
        state.velocity
    }

    /// Most recently commanded duty cycle, after clamping.
    pub fn duty(&self) -> f32 {
        self.state.lock().duty
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Integrate the model forward to the clock's current time.
    fn advance(&self, state: &mut PlantState) {
        let now = self.clock.now();
        if now <= state.last_update {
            return;
        }
        let dt = (now - state.last_update).as_secs_f64();
        let tau = self.params.tau.as_secs_f64();
        let target = if state.enabled {
            (state.duty as f64 / 100.0) * self.params.max_speed_cps
        } else {
            0.0
        };
        let alpha = (-dt / tau).exp();
        let v0 = state.velocity;
        // Closed-form position integral of the first-order velocity response
        state.position += target * dt + (v0 - target) * tau * (1.0 - alpha);
        state.velocity = target + (v0 - target) * alpha;
        state.last_update = now;
    }
}

impl std::fmt::Debug for MotorPlant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MotorPlant")
            .field("params", &self.params)
            .field("duty", &state.duty)
            .field("enabled", &state.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn plant_on_manual_clock(params: PlantParams) -> (Arc<MotorPlant>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let plant = Arc::new(MotorPlant::new(params, Arc::clone(&clock) as Arc<dyn Clock>));
        (plant, clock)
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn disabled_plant_stays_at_rest() {
        let (plant, clock) = plant_on_manual_clock(PlantParams::default());
        plant.set_duty(100.0);
        clock.advance(Duration::from_secs(5));
        assert_eq!(plant.velocity(), 0.0);
        assert_eq!(plant.position(), 0.0);
    }

    #[test]
    fn velocity_converges_to_duty_fraction_of_max_speed() {
        let params = PlantParams {
            max_speed_cps: 10_000.0,
            tau: Duration::from_millis(100),
            noise_counts: 0.0,
        };
        let (plant, clock) = plant_on_manual_clock(params);
        plant.set_enabled(true);
        plant.set_duty(50.0);
        // 20 time constants is far past settling
        clock.advance(Duration::from_secs(2));
        assert!(close(plant.velocity(), 5_000.0, 1.0));
    }

    #[test]
    fn negative_duty_runs_backward() {
        let (plant, clock) = plant_on_manual_clock(PlantParams::default());
        plant.set_enabled(true);
        plant.set_duty(-100.0);
        clock.advance(Duration::from_secs(1));
        assert!(plant.velocity() < 0.0);
        assert!(plant.position() < 0.0);
    }

    #[test]
    fn duty_is_clamped_to_plus_minus_100() {
        let (plant, _clock) = plant_on_manual_clock(PlantParams::default());
        plant.set_duty(250.0);
        assert_eq!(plant.duty(), 100.0);
        plant.set_duty(-3000.0);
        assert_eq!(plant.duty(), -100.0);
    }

    #[test]
    fn trajectory_is_independent_of_observation_rate() {
        let params = PlantParams {
            max_speed_cps: 16_000.0,
            tau: Duration::from_millis(150),
            noise_counts: 0.0,
        };
        let (coarse, coarse_clock) = plant_on_manual_clock(params);
        let (fine, fine_clock) = plant_on_manual_clock(params);
        for plant in [&coarse, &fine] {
            plant.set_enabled(true);
            plant.set_duty(80.0);
        }

        coarse_clock.advance(Duration::from_secs(1));
        for _ in 0..100 {
            fine_clock.advance(Duration::from_millis(10));
            // Observing forces an integration step
            let _ = fine.position();
        }

        assert!(close(coarse.position(), fine.position(), 1e-6));
        assert!(close(coarse.velocity(), fine.velocity(), 1e-6));
    }

    #[test]
    fn disabling_decays_velocity_toward_zero() {
        let (plant, clock) = plant_on_manual_clock(PlantParams::default());
        plant.set_enabled(true);
        plant.set_duty(100.0);
        clock.advance(Duration::from_secs(2));
        let spinning = plant.velocity();
        assert!(spinning > 0.0);

        plant.set_enabled(false);
        clock.advance(Duration::from_secs(2));
        assert!(close(plant.velocity(), 0.0, 1.0));
        // Coasting still covered ground
        assert!(plant.position() > 0.0);
    }
}
