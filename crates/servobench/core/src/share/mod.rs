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

//! Thread-safe data exchange between cooperating tasks.
//!
//! Tasks never share references into each other's state. They communicate
//! through named [`Share`] cells (latest-value semantics) and bounded
//! [`DataQueue`]s (FIFO semantics with an explicit full-queue policy).
//! Registering both in a [`SharePool`] yields a diagnostics table that
//! reports fill levels, high-water marks and drop counts after a run.

use thiserror::Error;

mod pool;
mod queue;
mod value;

pub use pool::{SharePool, ShareReport};
pub use queue::{DataQueue, OverwritePolicy};
pub use value::Share;

/// Errors produced by the data exchange primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareError {
    /// A value was offered to a queue that is at capacity and configured
    /// to reject rather than overwrite.
    #[error("queue `{name}` is full ({capacity} items)")]
    QueueFull { name: String, capacity: usize },
}

/// Diagnostic view over a share or queue, independent of its item type.
///
/// Implemented by [`Share`] and [`DataQueue`] so a [`SharePool`] can hold
/// them behind one trait object and render a combined report.
pub trait ShareDiag: Send + Sync {
    /// Name given at construction.
    fn name(&self) -> &str;

    /// Either `"share"` or `"queue"`.
    fn kind(&self) -> &'static str;

    /// One-line status rendered into the pool report.
    fn status(&self) -> String;
}
