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

use super::queue::{DataQueue, OverwritePolicy};
use super::value::Share;
use super::ShareDiag;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Registry of every share and queue created for a bench run.
///
/// Constructing primitives through the pool instead of directly keeps them
/// enumerable: [`report`](SharePool::report) snapshots all of them into a
/// printable table, which is the first thing to look at when a run drops
/// samples or a controller reads stale values.
#[derive(Default)]
pub struct SharePool {
    entries: Mutex<Vec<Arc<dyn ShareDiag>>>,
}

impl SharePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a [`Share`] and register it for reporting.
    pub fn share<T>(&self, name: &str, initial: T) -> Arc<Share<T>>
    where
        T: Copy + fmt::Debug + Send + Sync + 'static,
    {
        let share = Arc::new(Share::new(name, initial));
        self.register(Arc::clone(&share) as Arc<dyn ShareDiag>);
        share
    }

    /// Create a [`DataQueue`] and register it for reporting.
    pub fn queue<T>(&self, name: &str, capacity: usize, policy: OverwritePolicy) -> Arc<DataQueue<T>>
    where
        T: Copy + Send + Sync + 'static,
    {
        let queue = Arc::new(DataQueue::new(name, capacity, policy));
        self.register(Arc::clone(&queue) as Arc<dyn ShareDiag>);
        queue
    }

    /// Register an externally constructed share or queue.
    pub fn register(&self, entry: Arc<dyn ShareDiag>) {
        self.entries.lock().push(entry);
    }

    /// Number of registered shares and queues.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the current status of every registered entry.
    ///
    /// Entries appear in registration order, which for a bench rig means
    /// the order the wiring code created them in.
    pub fn report(&self) -> ShareReport {
        let rows = self
            .entries
            .lock()
            .iter()
            .map(|entry| ReportRow {
                name: entry.name().to_string(),
                kind: entry.kind(),
                status: entry.status(),
            })
            .collect();
        ShareReport { rows }
    }
}

impl fmt::Debug for SharePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharePool").field("entries", &self.len()).finish()
    }
}

#[derive(Debug, Clone)]
struct ReportRow {
    name: String,
    kind: &'static str,
    status: String,
}

/// Point-in-time table of share and queue status, produced by
/// [`SharePool::report`].
#[derive(Debug, Clone)]
pub struct ShareReport {
    rows: Vec<ReportRow>,
}

impl ShareReport {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Status line for a named entry, if it was registered.
    pub fn status_of(&self, name: &str) -> Option<&str> {
        self.rows.iter().find(|row| row.name == name).map(|row| row.status.as_str())
    }
}

impl fmt::Display for ShareReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<20} {:<6} {}", "name", "kind", "status")?;
        for row in &self.rows {
            writeln!(f, "{:<20} {:<6} {}", row.name, row.kind, row.status)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_registers_shares_and_queues() {
        let pool = SharePool::new();
        let kp = pool.share("m0_kp", 0.05f32);
        let data = pool.queue::<i32>("m0_data", 16, OverwritePolicy::Reject);
        assert_eq!(pool.len(), 2);

        kp.put(0.1);
        data.try_put(42).unwrap();

        let report = pool.report();
        assert_eq!(report.status_of("m0_kp"), Some("0.1"));
        assert_eq!(report.status_of("m0_data"), Some("1/16 high 1 dropped 0"));
        assert_eq!(report.status_of("missing"), None);
    }

    #[test]
    fn report_preserves_registration_order() {
        let pool = SharePool::new();
        pool.share("alpha", 1u8);
        pool.queue::<u8>("beta", 2, OverwritePolicy::Overwrite);
        pool.share("gamma", 3u8);

        let rendered = pool.report().to_string();
        let alpha = rendered.find("alpha").unwrap();
        let beta = rendered.find("beta").unwrap();
        let gamma = rendered.find("gamma").unwrap();
        assert!(alpha < beta && beta < gamma);
    }

    #[test]
    fn report_display_has_header_row() {
        let pool = SharePool::new();
        pool.share("setpoint", 0i32);
        let rendered = pool.report().to_string();
        let mut lines = rendered.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("name"));
        assert!(header.contains("kind"));
        assert!(header.contains("status"));
        assert!(lines.next().unwrap().starts_with("setpoint"));
    }

    #[test]
    fn empty_pool_reports_empty_table() {
        let pool = SharePool::new();
        assert!(pool.is_empty());
        let report = pool.report();
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
    }
}
