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

//! Cooperative priority scheduler for periodic bench tasks.
//!
//! Tasks are short run-to-completion step functions released on fixed
//! periods. Each [`Scheduler::tick`] runs every task that is currently due,
//! highest priority first, ties in append order. [`Scheduler::run_until`]
//! repeats that against the scheduler's [`Clock`], sleeping between
//! releases on a wall clock or fast-forwarding on a manual one, so the
//! same task set drives a paced bench run and an instant simulation.
//!
//! A failing task body takes only that task out of rotation; the rest of
//! the schedule keeps running and the failure is reported in the
//! [`SchedulerSummary`].
//!
//! [`Clock`]: crate::clock::Clock

use crate::hw::HwError;
use crate::share::ShareError;
use thiserror::Error;

mod scheduler;
mod task;

pub use scheduler::{Scheduler, SchedulerSummary, TaskSummary};
pub use task::{Task, TaskContext, TaskId, TaskState, TaskStats, TraceLog, TraceRecord};

/// Identifier a task body returns to describe the state it ended the step
/// in. Recorded by the trace when it differs from the previous step.
pub type StateId = u8;

/// Errors a task body can abort with.
///
/// Returning an error fails the task permanently; the scheduler logs it
/// and keeps running the remaining tasks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("hardware: {0}")]
    Hw(#[from] HwError),

    #[error("share: {0}")]
    Share(#[from] ShareError),

    #[error("{0}")]
    Aborted(String),
}

impl TaskError {
    /// Convenience for rig-level aborts with a plain message.
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::Aborted(message.into())
    }
}
