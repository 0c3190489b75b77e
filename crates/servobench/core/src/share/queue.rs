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

use super::{ShareDiag, ShareError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::trace;

/// What a queue does with a new item when it is already at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Refuse the new item and report [`ShareError::QueueFull`].
    #[default]
    Reject,
    /// Discard the oldest item to make room and count the discard.
    Overwrite,
}

/// Bounded FIFO queue of `Copy` items shared between tasks.
///
/// Producers call [`try_put`](DataQueue::try_put), consumers call
/// [`try_get`](DataQueue::try_get). Neither side ever blocks; a cooperative
/// task that finds the queue empty or full yields and retries on its next
/// release. The queue records its high-water mark and the number of items
/// discarded under [`OverwritePolicy::Overwrite`] so a post-run report shows
/// whether the capacity was adequate.
pub struct DataQueue<T: Copy> {
    name: String,
    capacity: usize,
    policy: OverwritePolicy,
    items: Mutex<VecDeque<T>>,
    high_water: AtomicUsize,
    dropped: AtomicU64,
}

impl<T: Copy> DataQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(name: impl Into<String>, capacity: usize, policy: OverwritePolicy) -> Self {
        assert!(capacity > 0, "queue capacity must be nonzero");
        Self {
            name: name.into(),
            capacity,
            policy,
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            high_water: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of items the queue holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Full-queue policy given at construction.
    pub fn policy(&self) -> OverwritePolicy {
        self.policy
    }

    /// Append an item at the back of the queue.
    ///
    /// When the queue is full the outcome depends on the policy: `Reject`
    /// leaves the queue untouched and returns [`ShareError::QueueFull`],
    /// `Overwrite` discards the oldest item, increments the drop counter
    /// and accepts the new one.
    pub fn try_put(&self, value: T) -> Result<(), ShareError> {
        let mut items = self.items.lock();
        if items.len() == self.capacity {
            match self.policy {
                OverwritePolicy::Reject => {
                    return Err(ShareError::QueueFull {
                        name: self.name.clone(),
                        capacity: self.capacity,
                    });
                }
                OverwritePolicy::Overwrite => {
                    items.pop_front();
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    trace!(queue = %self.name, "discarded oldest item to admit a new one");
                }
            }
        }
        items.push_back(value);
        self.high_water.fetch_max(items.len(), Ordering::Relaxed);
        Ok(())
    }

    /// Remove and return the oldest item, or `None` when empty.
    pub fn try_get(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Remove and return every queued item, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.items.lock().drain(..).collect()
    }

    /// Discard all queued items. Statistics are left intact.
    pub fn clear(&self) {
        self.items.lock().clear();
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Largest number of items the queue has held at once.
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::Relaxed)
    }

    /// Number of items discarded under [`OverwritePolicy::Overwrite`].
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T> ShareDiag for DataQueue<T>
where
    T: Copy + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "queue"
    }

    fn status(&self) -> String {
        format!("{}/{} high {} dropped {}", self.len(), self.capacity, self.high_water(), self.dropped())
    }
}
