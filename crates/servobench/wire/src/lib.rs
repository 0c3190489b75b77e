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

//! Line protocol between a bench rig and its host.
//!
//! The conversation is plain text, one item per line, `\r\n` terminated on
//! write and tolerant of bare `\n` on read. Control flow rides on short
//! `$x` tokens; everything else is a bare number.
//!
//! A session starts with the rig greeting `servobench-rig <version>`. Each
//! step-response run is then one exchange:
//!
//! | rig sends | meaning                   | host answers      |
//! |-----------|---------------------------|-------------------|
//! | `$a`      | gain prompt, channel m0   | `f32` gain        |
//! | `$b`      | gain prompt, channel m1   | `f32` gain        |
//! | `$c`      | setpoint prompt, m0       | `i32` counts      |
//! | `$d`      | setpoint prompt, m1       | `i32` counts      |
//! | `$e`      | sample period prompt      | `u32` ms, nonzero |
//! | `$f`..`$g`| m0 samples, one per line  |                   |
//! | `$h`..`$i`| m1 samples, one per line  |                   |
//!
//! Sample lines carry encoder counts only; the host reconstructs the time
//! axis as `index * period`. A prompt answered with something unparseable
//! is simply asked again, and the host skips unparseable sample lines with
//! a warning rather than guessing a value for them.

use thiserror::Error;

pub mod client;
pub mod line;
pub mod token;

pub use client::{BenchClient, RunRequest, RunResult};
pub use line::{greeting, prompt_f32, prompt_i32, prompt_u32, read_line, send_greeting, stream_samples, write_line, GREETING_PREFIX};
pub use token::{Channel, Token};

/// Errors on the host/rig line protocol.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed while waiting for {expected}")]
    UnexpectedEof { expected: String },

    #[error("peer is not a bench rig, greeted with `{0}`")]
    BadGreeting(String),
}

impl WireError {
    pub(crate) fn eof(expected: impl Into<String>) -> Self {
        Self::UnexpectedEof { expected: expected.into() }
    }
}
