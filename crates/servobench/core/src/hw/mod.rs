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

//! Motor and encoder abstractions plus their simulated implementations.
//!
//! The bench tasks talk to hardware only through the [`MotorDriver`] and
//! [`Encoder`] traits. [`SimMotor`] and [`SimEncoder`] back those traits
//! with a shared first-order [`MotorPlant`], which is what lets the whole
//! rig run on a desktop with no bench attached. The encoder path is
//! deliberately faithful to a 16-bit hardware counter: reads are truncated
//! to `u16` and [`CounterAccumulator`] reconstructs the full position from
//! wrapping deltas.

use thiserror::Error;

mod accumulator;
mod plant;
mod sim;

pub use accumulator::CounterAccumulator;
pub use plant::{MotorPlant, PlantParams};
pub use sim::{SimEncoder, SimMotor};

/// Errors surfaced by motor and encoder drivers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HwError {
    /// The underlying device rejected a command.
    #[error("device fault: {0}")]
    Device(String),
}

/// An H-bridge style motor channel driven by a signed duty cycle.
///
/// Duty is a percentage in `-100.0..=100.0`; the sign selects direction.
/// Implementations clamp values outside that range. A disabled channel
/// keeps accepting duty commands but produces no torque until re-enabled.
pub trait MotorDriver: Send {
    /// Allow the channel to drive the motor.
    fn enable(&mut self) -> Result<(), HwError>;

    /// Put the channel in a free-wheeling state.
    fn disable(&mut self) -> Result<(), HwError>;

    /// Command a signed duty cycle in percent.
    fn set_duty(&mut self, percent: f32) -> Result<(), HwError>;

    /// Most recently commanded duty cycle, after clamping.
    fn duty(&self) -> f32;
}

/// A 16-bit quadrature counter channel.
///
/// `read` returns the raw counter register, which wraps freely. Callers
/// reconstruct absolute position by feeding consecutive readings through a
/// [`CounterAccumulator`]. Reads must happen at least once per half
/// revolution of the counter range or the reconstruction becomes ambiguous.
pub trait Encoder: Send {
    /// Current raw counter value.
    fn read(&mut self) -> Result<u16, HwError>;

    /// Reset the counter register to zero.
    fn zero(&mut self) -> Result<(), HwError>;
}
