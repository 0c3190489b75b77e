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

use super::ShareDiag;
use parking_lot::RwLock;
use std::fmt;

/// Named single-value cell shared between tasks.
///
/// A `Share` holds exactly one value of a `Copy` type. `put` replaces it,
/// `get` copies it out. Readers always observe the most recent write, never
/// a torn or intermediate value.
///
/// # Thread Safety
///
/// All access goes through an internal `RwLock`, so a `Share` can be handed
/// to any number of tasks and threads behind an `Arc`.
pub struct Share<T: Copy> {
    name: String,
    value: RwLock<T>,
}

impl<T: Copy> Share<T> {
    /// Create a share with the given name and starting value.
    pub fn new(name: impl Into<String>, initial: T) -> Self {
        Self {
            name: name.into(),
            value: RwLock::new(initial),
        }
    }

    /// Name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the stored value.
    pub fn put(&self, value: T) {
        *self.value.write() = value;
    }

    /// Copy out the most recently stored value.
    pub fn get(&self) -> T {
        *self.value.read()
    }
}

impl<T> fmt::Debug for Share<T>
where
    T: Copy + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share").field("name", &self.name).field("value", &self.get()).finish()
    }
}

impl<T> ShareDiag for Share<T>
where
    T: Copy + fmt::Debug + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "share"
    }

    fn status(&self) -> String {
        format!("{:?}", self.get())
    }
}
