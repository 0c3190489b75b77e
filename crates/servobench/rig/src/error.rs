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

use servobench_wire::WireError;
use thiserror::Error;

/// Errors produced by the rig: configuration, bench execution, and the
/// serving side of the wire protocol.
#[derive(Debug, Error)]
pub enum RigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("invalid run parameters: {0}")]
    Params(String),

    #[error("bench run failed: {0}")]
    Run(String),

    #[error(transparent)]
    Wire(#[from] WireError),
}
