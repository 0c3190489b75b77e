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

use super::{StateId, TaskError};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Identifier assigned by [`Scheduler::append`], stable for the lifetime
/// of the scheduler.
///
/// [`Scheduler::append`]: super::Scheduler::append
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduling state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Runs whenever due.
    Ready,
    /// Administratively paused; releases are skipped but the cadence keeps
    /// advancing so unblocking does not cause a burst of catch-up runs.
    Blocked,
    /// The body returned an error; the task is out of rotation for good.
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Ready => "ready",
            TaskState::Blocked => "blocked",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Per-release information handed to a task body.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext {
    /// Identifier of the running task.
    pub id: TaskId,
    /// Scheduler clock reading at the start of this step.
    pub now: Duration,
    /// Zero-based count of completed runs of this task.
    pub run: u64,
}

pub(super) type TaskBody = Box<dyn FnMut(&TaskContext) -> Result<StateId, TaskError> + Send>;

/// A periodic step function plus its scheduling attributes.
///
/// The body runs to completion each release and reports the state it ended
/// in. Aperiodic tasks (no period) are due on every tick; the rig uses
/// those only for free-running diagnostics.
///
/// # Examples
///
/// Built with a fluent chain:
///
/// ```
/// use servobench_core::sched::Task;
/// use std::time::Duration;
///
/// let task = Task::new("ctrl0", |_ctx| Ok(0))
///     .with_priority(10)
///     .with_period(Duration::from_millis(10))
///     .with_profile()
///     .with_trace(64);
/// assert_eq!(task.name(), "ctrl0");
/// ```
pub struct Task {
    name: String,
    priority: u8,
    period: Option<Duration>,
    profile: bool,
    trace_capacity: usize,
    pub(super) body: TaskBody,
}

impl Task {
    pub fn new(name: impl Into<String>, body: impl FnMut(&TaskContext) -> Result<StateId, TaskError> + Send + 'static) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            period: None,
            profile: false,
            trace_capacity: 0,
            body: Box::new(body),
        }
    }

    /// Higher values run first when several tasks are due together.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Release the task every `period`. Without one the task is due on
    /// every tick.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = Some(period);
        self
    }

    /// Record per-run timing and lateness statistics.
    pub fn with_profile(mut self) -> Self {
        self.profile = true;
        self
    }

    /// Keep the most recent `capacity` state transitions.
    pub fn with_trace(mut self, capacity: usize) -> Self {
        self.trace_capacity = capacity;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn profiled(&self) -> bool {
        self.profile
    }

    pub fn trace_capacity(&self) -> usize {
        self.trace_capacity
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("period", &self.period)
            .finish()
    }
}

/// Execution statistics for one task, filled in when profiling is on.
///
/// `runs` is always counted. Runtime figures come from a monotonic wall
/// timer around the body, so they stay meaningful even when the schedule
/// itself runs on a fast-forwarding clock. Lateness is measured in
/// scheduler time as actual release minus scheduled release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub runs: u64,
    pub total_runtime: Duration,
    pub max_runtime: Duration,
    pub total_late: Duration,
    pub max_late: Duration,
    pub late_releases: u64,
}

impl TaskStats {
    pub fn avg_runtime(&self) -> Duration {
        if self.runs == 0 {
            Duration::ZERO
        } else {
            self.total_runtime / self.runs as u32
        }
    }

    pub fn avg_late(&self) -> Duration {
        if self.runs == 0 {
            Duration::ZERO
        } else {
            self.total_late / self.runs as u32
        }
    }

    pub(super) fn record(&mut self, runtime: Duration, late: Duration) {
        self.total_runtime += runtime;
        self.max_runtime = self.max_runtime.max(runtime);
        self.total_late += late;
        self.max_late = self.max_late.max(late);
        if late > Duration::ZERO {
            self.late_releases += 1;
        }
    }
}

/// One recorded state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    /// Run index at which the transition happened.
    pub run: u64,
    /// Scheduler clock reading at that run.
    pub at: Duration,
    /// State the body ended the run in.
    pub state: StateId,
}

/// Bounded history of a task's state transitions.
///
/// The log keeps the most recent `capacity` records and counts the ones it
/// had to discard, so a long run cannot grow memory without bound while
/// the tail end of the behavior stays inspectable.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    records: VecDeque<TraceRecord>,
    capacity: usize,
    dropped: u64,
}

impl TraceLog {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    pub(super) fn push(&mut self, record: TraceRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records.push_back(record);
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records discarded to stay within capacity.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Retained records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }
}
