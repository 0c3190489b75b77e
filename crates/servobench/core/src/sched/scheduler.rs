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

use super::task::{Task, TaskContext, TaskId, TaskState, TaskStats, TraceLog, TraceRecord};
use super::TaskError;
use crate::clock::Clock;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

struct Entry {
    id: TaskId,
    task: Task,
    state: TaskState,
    /// Next scheduled release for periodic tasks; `None` means due on
    /// every tick.
    next_release: Option<Duration>,
    last_state: Option<super::StateId>,
    stats: TaskStats,
    trace: TraceLog,
    error: Option<TaskError>,
}

/// Cooperative scheduler running appended [`Task`]s against a [`Clock`].
///
/// # Workflow
///
/// 1. Append tasks; each gets a [`TaskId`] and its first release one
///    period after append.
/// 2. Drive the schedule, either manually with [`tick`](Scheduler::tick)
///    or over a window with [`run_until`](Scheduler::run_until) /
///    [`run_for`](Scheduler::run_for).
/// 3. Read back [`summary`](Scheduler::summary), per-task stats and
///    traces.
///
/// A tick runs every due task exactly once, highest priority first and
/// append order within a priority. Releases missed while the schedule was
/// stalled are skipped, not replayed, so the cadence is preserved and
/// lateness shows up in the statistics instead of as a burst of runs.
pub struct Scheduler {
    clock: Arc<dyn Clock>,
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, entries: Vec::new() }
    }

    /// Current reading of the scheduler's clock.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a task to the schedule and return its identifier.
    ///
    /// A periodic task's first release is one period after this call.
    pub fn append(&mut self, task: Task) -> TaskId {
        let id = TaskId(self.entries.len() as u64);
        let next_release = task.period().map(|p| self.clock.now() + p);
        let trace = TraceLog::new(task.trace_capacity());
        debug!(task = task.name(), id = %id, "task appended");
        self.entries.push(Entry {
            id,
            state: TaskState::Ready,
            next_release,
            last_state: None,
            stats: TaskStats::default(),
            trace,
            error: None,
            task,
        });
        id
    }

    /// Run every task due at the current clock reading, highest priority
    /// first. Returns how many task bodies ran.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        let mut due: Vec<usize> = (0..self.entries.len()).filter(|&i| self.is_due(i, now)).collect();
        // Stable sort keeps append order within equal priorities
        due.sort_by(|&a, &b| self.entries[b].task.priority().cmp(&self.entries[a].task.priority()));
        self.run_indices(&due)
    }

    /// Like [`tick`](Scheduler::tick) but in plain append order, ignoring
    /// priorities.
    pub fn round_robin_tick(&mut self) -> usize {
        let now = self.clock.now();
        let due: Vec<usize> = (0..self.entries.len()).filter(|&i| self.is_due(i, now)).collect();
        self.run_indices(&due)
    }

    /// Earliest upcoming release, or `None` when nothing can run anymore.
    ///
    /// A ready aperiodic task makes this the current clock reading, since
    /// such a task is always due.
    pub fn next_release(&self) -> Option<Duration> {
        let now = self.clock.now();
        let mut earliest: Option<Duration> = None;
        for entry in &self.entries {
            let candidate = match (entry.state, entry.next_release) {
                (TaskState::Failed, _) => continue,
                // A blocked aperiodic task has no cadence to keep
                (TaskState::Blocked, None) => continue,
                (_, Some(release)) => release,
                (TaskState::Ready, None) => now,
            };
            earliest = Some(earliest.map_or(candidate, |e| e.min(candidate)));
        }
        earliest
    }

    /// Run the schedule until its clock reaches `deadline`.
    ///
    /// The loop waits out the gap to each release, so on a wall clock this
    /// paces the bench in real time while on a fast-forwarding clock it
    /// completes immediately. The clock is left exactly at `deadline`.
    /// Releases falling exactly on the deadline still run.
    ///
    /// A ready aperiodic task is due at every instant, so a schedule that
    /// contains one only makes progress toward the deadline on a wall
    /// clock. Drive such schedules with [`tick`](Scheduler::tick) when
    /// using a manual clock.
    pub fn run_until(&mut self, deadline: Duration) {
        loop {
            match self.next_release() {
                Some(next) if next <= deadline => {
                    self.clock.wait_until(next);
                    self.tick();
                }
                _ => break,
            }
        }
        self.clock.wait_until(deadline);
    }

    /// Run the schedule for a window starting at the current clock reading.
    pub fn run_for(&mut self, window: Duration) {
        let deadline = self.clock.now() + window;
        self.run_until(deadline);
    }

    /// Pause or resume a task. Returns `false` for unknown or failed
    /// tasks, which cannot change state anymore.
    pub fn set_blocked(&mut self, id: TaskId, blocked: bool) -> bool {
        match self.entries.get_mut(id.0 as usize) {
            Some(entry) if entry.state != TaskState::Failed => {
                entry.state = if blocked { TaskState::Blocked } else { TaskState::Ready };
                true
            }
            _ => false,
        }
    }

    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.entry(id).map(|e| e.state)
    }

    pub fn stats(&self, id: TaskId) -> Option<&TaskStats> {
        self.entry(id).map(|e| &e.stats)
    }

    pub fn trace(&self, id: TaskId) -> Option<&TraceLog> {
        self.entry(id).map(|e| &e.trace)
    }

    /// Snapshot of every task's attributes, state and statistics.
    pub fn summary(&self) -> SchedulerSummary {
        let rows = self
            .entries
            .iter()
            .map(|e| TaskSummary {
                id: e.id,
                name: e.task.name().to_string(),
                priority: e.task.priority(),
                period: e.task.period(),
                state: e.state,
                stats: e.stats,
                trace_dropped: e.trace.dropped(),
                error: e.error.as_ref().map(|err| err.to_string()),
            })
            .collect();
        SchedulerSummary { rows }
    }

    fn entry(&self, id: TaskId) -> Option<&Entry> {
        self.entries.get(id.0 as usize)
    }

    fn is_due(&self, idx: usize, now: Duration) -> bool {
        let entry = &self.entries[idx];
        if entry.state == TaskState::Failed {
            return false;
        }
        match entry.next_release {
            None => entry.state == TaskState::Ready,
            Some(release) => release <= now,
        }
    }

    fn run_indices(&mut self, due: &[usize]) -> usize {
        let mut ran = 0;
        for &idx in due {
            if self.run_entry(idx) {
                ran += 1;
            }
        }
        ran
    }

    /// Advance one due entry: move its release schedule forward, then run
    /// the body unless the task is blocked. Returns whether the body ran.
    fn run_entry(&mut self, idx: usize) -> bool {
        let now = self.clock.now();
        let entry = &mut self.entries[idx];
        let scheduled = entry.next_release;

        // Move the cadence forward first, skipping releases already in
        // the past so a stall can never cause a catch-up burst
        if let (Some(release), Some(period)) = (scheduled, entry.task.period()) {
            let mut next = release + period;
            while next <= now {
                next += period;
            }
            entry.next_release = Some(next);
        }

        if entry.state != TaskState::Ready {
            return false;
        }

        let late = scheduled.map_or(Duration::ZERO, |release| now.saturating_sub(release));
        let ctx = TaskContext {
            id: entry.id,
            now,
            run: entry.stats.runs,
        };

        let started = Instant::now();
        let result = (entry.task.body)(&ctx);
        let runtime = started.elapsed();

        entry.stats.runs += 1;
        if entry.task.profiled() {
            entry.stats.record(runtime, late);
        }

        match result {
            Ok(state) => {
                if entry.trace.is_enabled() && entry.last_state != Some(state) {
                    entry.trace.push(TraceRecord { run: ctx.run, at: now, state });
                }
                entry.last_state = Some(state);
            }
            Err(err) => {
                error!(task = entry.task.name(), id = %entry.id, error = %err, "task failed, out of rotation");
                entry.state = TaskState::Failed;
                entry.error = Some(err);
            }
        }
        true
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").field("tasks", &self.entries.len()).field("now", &self.clock.now()).finish()
    }
}

/// One row of a [`SchedulerSummary`].
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSummary {
    pub id: TaskId,
    pub name: String,
    pub priority: u8,
    pub period: Option<Duration>,
    pub state: TaskState,
    pub stats: TaskStats,
    pub trace_dropped: u64,
    pub error: Option<String>,
}

/// Post-run profile of the whole schedule, printable as a table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchedulerSummary {
    rows: Vec<TaskSummary>,
}

impl SchedulerSummary {
    pub fn rows(&self) -> &[TaskSummary] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for a named task, if present.
    pub fn row(&self, name: &str) -> Option<&TaskSummary> {
        self.rows.iter().find(|r| r.name == name)
    }
}

impl fmt::Display for SchedulerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<4} {:<16} {:>3} {:>9} {:<8} {:>6} {:>10} {:>10} {:>5} {:>10}",
            "id", "task", "pri", "period", "state", "runs", "avg_run", "max_run", "late", "max_late"
        )?;
        for row in &self.rows {
            let period = row.period.map_or_else(|| "-".to_string(), |p| format!("{p:?}"));
            let error = row.error.as_deref().map_or_else(String::new, |e| format!("  {e}"));
            writeln!(
                f,
                "{:<4} {:<16} {:>3} {:>9} {:<8} {:>6} {:>10} {:>10} {:>5} {:>10}{}",
                row.id,
                row.name,
                row.priority,
                period,
                row.state,
                row.stats.runs,
                format!("{:?}", row.stats.avg_runtime()),
                format!("{:?}", row.stats.max_runtime),
                row.stats.late_releases,
                format!("{:?}", row.stats.max_late),
                error
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sched::StateId;
    use parking_lot::Mutex;

    fn manual_scheduler() -> (Scheduler, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let sched = Scheduler::new(Arc::clone(&clock) as Arc<dyn Clock>);
        (sched, clock)
    }

    fn recording_task(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Task {
        let log = Arc::clone(log);
        let label = name.to_string();
        Task::new(name, move |_ctx| {
            log.lock().push(label.clone());
            Ok(0)
        })
    }

    #[test]
    fn tick_runs_higher_priority_first() {
        let (mut sched, _clock) = manual_scheduler();
        let order = Arc::new(Mutex::new(Vec::new()));
        sched.append(recording_task("low", &order).with_priority(1));
        sched.append(recording_task("high", &order).with_priority(9));
        sched.append(recording_task("mid", &order).with_priority(5));

        assert_eq!(sched.tick(), 3);
        assert_eq!(*order.lock(), vec!["high", "mid", "low"]);
    }

    #[test]
    fn equal_priorities_run_in_append_order() {
        let (mut sched, _clock) = manual_scheduler();
        let order = Arc::new(Mutex::new(Vec::new()));
        sched.append(recording_task("first", &order).with_priority(3));
        sched.append(recording_task("second", &order).with_priority(3));
        sched.append(recording_task("third", &order).with_priority(3));

        sched.tick();
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn round_robin_ignores_priority() {
        let (mut sched, _clock) = manual_scheduler();
        let order = Arc::new(Mutex::new(Vec::new()));
        sched.append(recording_task("low", &order).with_priority(1));
        sched.append(recording_task("high", &order).with_priority(9));

        sched.round_robin_tick();
        assert_eq!(*order.lock(), vec!["low", "high"]);
    }

    #[test]
    fn periodic_task_runs_once_per_period() {
        let (mut sched, clock) = manual_scheduler();
        let times = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&times);
        let id = sched.append(
            Task::new("sampler", move |ctx| {
                sink.lock().push(ctx.now);
                Ok(0)
            })
            .with_period(Duration::from_millis(10)),
        );

        sched.run_until(Duration::from_millis(100));

        let recorded = times.lock().clone();
        let expected: Vec<Duration> = (1..=10).map(|i| Duration::from_millis(i * 10)).collect();
        assert_eq!(recorded, expected);
        assert_eq!(sched.stats(id).unwrap().runs, 10);
        assert_eq!(clock.now(), Duration::from_millis(100));
    }

    #[test]
    fn mixed_periods_release_independently() {
        let (mut sched, _clock) = manual_scheduler();
        let order = Arc::new(Mutex::new(Vec::new()));
        let fast = sched.append(recording_task("fast", &order).with_period(Duration::from_millis(10)));
        let slow = sched.append(recording_task("slow", &order).with_period(Duration::from_millis(25)));

        sched.run_until(Duration::from_millis(100));

        assert_eq!(sched.stats(fast).unwrap().runs, 10);
        assert_eq!(sched.stats(slow).unwrap().runs, 4);
    }

    #[test]
    fn context_reports_run_index_and_scheduled_time() {
        let (mut sched, _clock) = manual_scheduler();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        sched.append(
            Task::new("ctx", move |ctx| {
                sink.lock().push((ctx.run, ctx.now));
                Ok(0)
            })
            .with_period(Duration::from_millis(20)),
        );

        sched.run_until(Duration::from_millis(60));
        assert_eq!(
            *seen.lock(),
            vec![
                (0, Duration::from_millis(20)),
                (1, Duration::from_millis(40)),
                (2, Duration::from_millis(60)),
            ]
        );
    }

    #[test]
    fn failing_task_leaves_the_rest_running() {
        let (mut sched, _clock) = manual_scheduler();
        let order = Arc::new(Mutex::new(Vec::new()));
        let fragile = sched.append(
            Task::new("fragile", |ctx| {
                if ctx.run == 1 {
                    Err(TaskError::aborted("gave up"))
                } else {
                    Ok(0)
                }
            })
            .with_period(Duration::from_millis(10)),
        );
        let steady = sched.append(recording_task("steady", &order).with_period(Duration::from_millis(10)));

        sched.run_until(Duration::from_millis(100));

        assert_eq!(sched.state(fragile), Some(TaskState::Failed));
        assert_eq!(sched.stats(fragile).unwrap().runs, 2);
        assert_eq!(sched.stats(steady).unwrap().runs, 10);

        let summary = sched.summary();
        let row = summary.row("fragile").unwrap();
        assert_eq!(row.state, TaskState::Failed);
        assert_eq!(row.error.as_deref(), Some("gave up"));
    }

    #[test]
    fn blocked_task_skips_releases_without_bursting() {
        let (mut sched, _clock) = manual_scheduler();
        let order = Arc::new(Mutex::new(Vec::new()));
        let id = sched.append(recording_task("gated", &order).with_period(Duration::from_millis(10)));

        sched.run_until(Duration::from_millis(30));
        assert_eq!(sched.stats(id).unwrap().runs, 3);

        assert!(sched.set_blocked(id, true));
        assert_eq!(sched.state(id), Some(TaskState::Blocked));
        sched.run_until(Duration::from_millis(60));
        assert_eq!(sched.stats(id).unwrap().runs, 3);

        assert!(sched.set_blocked(id, false));
        sched.run_until(Duration::from_millis(100));
        // Releases at 70..=100 run; the blocked ones are gone for good
        assert_eq!(sched.stats(id).unwrap().runs, 7);
    }

    #[test]
    fn stalled_releases_are_skipped_not_replayed() {
        let (mut sched, clock) = manual_scheduler();
        let order = Arc::new(Mutex::new(Vec::new()));
        let id = sched.append(
            recording_task("stalled", &order)
                .with_period(Duration::from_millis(10))
                .with_profile(),
        );

        // Nothing ticks while the clock jumps past five releases
        clock.advance(Duration::from_millis(55));
        assert_eq!(sched.tick(), 1);

        // One late run, not a burst of six
        let stats = sched.stats(id).unwrap();
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.late_releases, 1);
        assert_eq!(stats.max_late, Duration::from_millis(45));

        // The cadence lands back on the original period grid
        assert_eq!(sched.next_release(), Some(Duration::from_millis(60)));
        assert_eq!(sched.tick(), 0);

        sched.run_until(Duration::from_millis(80));
        let stats = sched.stats(id).unwrap();
        assert_eq!(stats.runs, 4);
        assert_eq!(stats.late_releases, 1);
    }

    #[test]
    fn blocking_a_failed_task_is_refused() {
        let (mut sched, _clock) = manual_scheduler();
        let id = sched.append(Task::new("doomed", |_ctx| Err(TaskError::aborted("no"))));
        sched.tick();
        assert_eq!(sched.state(id), Some(TaskState::Failed));
        assert!(!sched.set_blocked(id, false));
        assert!(!sched.set_blocked(TaskId(99), true));
    }

    #[test]
    fn aperiodic_task_runs_every_tick() {
        let (mut sched, _clock) = manual_scheduler();
        let order = Arc::new(Mutex::new(Vec::new()));
        let id = sched.append(recording_task("free", &order));

        assert_eq!(sched.tick(), 1);
        assert_eq!(sched.tick(), 1);
        assert_eq!(sched.tick(), 1);
        assert_eq!(sched.stats(id).unwrap().runs, 3);
    }

    #[test]
    fn next_release_reports_the_earliest_cadence() {
        let (mut sched, _clock) = manual_scheduler();
        assert_eq!(sched.next_release(), None);

        sched.append(Task::new("slow", |_ctx| Ok(0)).with_period(Duration::from_millis(25)));
        sched.append(Task::new("fast", |_ctx| Ok(0)).with_period(Duration::from_millis(10)));
        assert_eq!(sched.next_release(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn trace_records_only_state_changes() {
        let (mut sched, _clock) = manual_scheduler();
        let toggling = sched.append(
            Task::new("toggling", |ctx| Ok(if ctx.run % 2 == 0 { 1 } else { 2 } as StateId))
                .with_period(Duration::from_millis(10))
                .with_trace(3),
        );
        let constant = sched.append(
            Task::new("constant", |_ctx| Ok(1))
                .with_period(Duration::from_millis(10))
                .with_trace(8),
        );

        sched.run_until(Duration::from_millis(80));

        let trace = sched.trace(toggling).unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.dropped(), 5);
        let states: Vec<StateId> = trace.records().map(|r| r.state).collect();
        assert_eq!(states, vec![2, 1, 2]);

        // Unchanging state produces exactly one record
        assert_eq!(sched.trace(constant).unwrap().len(), 1);
    }

    #[test]
    fn profiling_measures_wall_runtime_even_on_a_manual_clock() {
        let (mut sched, _clock) = manual_scheduler();
        let id = sched.append(
            Task::new("worker", |_ctx| {
                std::thread::sleep(Duration::from_millis(2));
                Ok(0)
            })
            .with_period(Duration::from_millis(10))
            .with_profile(),
        );

        sched.run_until(Duration::from_millis(30));

        let stats = sched.stats(id).unwrap();
        assert_eq!(stats.runs, 3);
        assert!(stats.max_runtime >= Duration::from_millis(2));
        assert!(stats.total_runtime >= Duration::from_millis(6));
        // Releases land exactly on schedule when the clock fast-forwards
        assert_eq!(stats.total_late, Duration::ZERO);
        assert_eq!(stats.late_releases, 0);
    }

    #[test]
    fn unprofiled_task_counts_runs_only() {
        let (mut sched, _clock) = manual_scheduler();
        let id = sched.append(
            Task::new("lean", |_ctx| {
                std::thread::sleep(Duration::from_millis(1));
                Ok(0)
            })
            .with_period(Duration::from_millis(10)),
        );

        sched.run_until(Duration::from_millis(30));

        let stats = sched.stats(id).unwrap();
        assert_eq!(stats.runs, 3);
        assert_eq!(stats.total_runtime, Duration::ZERO);
    }

    #[test]
    fn summary_table_lists_every_task() {
        let (mut sched, _clock) = manual_scheduler();
        sched.append(Task::new("ctrl0", |_ctx| Ok(0)).with_period(Duration::from_millis(10)).with_priority(10));
        sched.append(Task::new("report", |_ctx| Ok(0)).with_period(Duration::from_millis(20)).with_priority(1));

        sched.run_until(Duration::from_millis(20));

        let summary = sched.summary();
        assert_eq!(summary.len(), 2);
        let rendered = summary.to_string();
        assert!(rendered.contains("task"));
        assert!(rendered.contains("ctrl0"));
        assert!(rendered.contains("report"));
        assert!(rendered.contains("ready"));
    }
}
