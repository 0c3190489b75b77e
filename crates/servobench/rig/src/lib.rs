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

//! The rig side of the bench: configuration, the periodic motor control
//! task, the step-response runner, and the TCP server that speaks the
//! wire protocol to hosts.
//!
//! Everything runs against simulated hardware; swapping in real drivers
//! means implementing the `MotorDriver` and `Encoder` traits from
//! `servobench-core` and handing them to [`tasks::motor_task`].

pub mod config;
pub mod error;
pub mod runner;
pub mod server;
pub mod shares;
pub mod tasks;

pub use config::{MotorConfig, Pace, RigConfig};
pub use error::RigError;
pub use runner::{run_step_response, RunOutcome};
pub use server::{handle_session, RigServer, SessionInfo};
pub use shares::{MotorShares, RigShares};
pub use tasks::{motor_task, MotorTaskSpec, STATE_DONE, STATE_IDLE, STATE_RUN};
