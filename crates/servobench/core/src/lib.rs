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

//! Core building blocks of the servobench motor test bench:
//! cooperative scheduling, inter-task data sharing, the simulated
//! motor/encoder hardware layer, proportional control with step-response
//! recording, and the documentation navigation-data model.

pub mod clock;
pub mod control;
pub mod hw;
pub mod navdata;
pub mod sched;
pub mod share;

pub use clock::{Clock, ManualClock, SystemClock};
pub use control::{Controller, PController, ResponseLog, Sample, StepMetrics};
pub use hw::{CounterAccumulator, Encoder, HwError, MotorDriver, MotorPlant, PlantParams, SimEncoder, SimMotor};
pub use navdata::{NavChildren, NavDataError, NavEntry, NavTree};
pub use sched::{Scheduler, SchedulerSummary, StateId, Task, TaskContext, TaskError, TaskId, TaskState};
pub use share::{DataQueue, OverwritePolicy, Share, ShareError, SharePool, ShareReport};
