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

/// Reconstructs an absolute position from a wrapping 16-bit counter.
///
/// Each raw reading is compared to the previous one and the wrapping
/// difference is interpreted as a signed step of at most half the counter
/// range, so the accumulator follows the shortest path around the wrap.
/// This is correct as long as the counter moves fewer than 32768 counts
/// between consecutive updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterAccumulator {
    last_raw: u16,
    total: i64,
}

impl CounterAccumulator {
    /// Start accumulating from the given raw reading. Total begins at zero.
    pub fn new(initial_raw: u16) -> Self {
        Self { last_raw: initial_raw, total: 0 }
    }

    /// Fold in the next raw reading and return the updated total.
    pub fn update(&mut self, raw: u16) -> i64 {
        let delta = raw.wrapping_sub(self.last_raw) as i16 as i64;
        self.last_raw = raw;
        self.total += delta;
        self.total
    }

    /// Accumulated position in counts.
    pub fn total(&self) -> i64 {
        self.total
    }

    /// Raw reading seen by the last update.
    pub fn last_raw(&self) -> u16 {
        self.last_raw
    }

    /// Restart accumulation from a new raw reading, zeroing the total.
    pub fn reset(&mut self, raw: u16) {
        self.last_raw = raw;
        self.total = 0;
    }
}

impl Default for CounterAccumulator {
    fn default() -> Self {
        Self::new(0)
    }
}
