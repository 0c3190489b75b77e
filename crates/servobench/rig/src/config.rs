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

//! Rig configuration: TOML file, environment overrides, defaults.

use crate::error::RigError;
use serde::{Deserialize, Serialize};
use servobench_core::hw::PlantParams;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// How the scheduler paces a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    /// Virtual time; runs complete as fast as the host can compute them.
    #[default]
    Fast,
    /// Wall-clock pacing, one control period per real period.
    Real,
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pace::Fast => write!(f, "fast"),
            Pace::Real => write!(f, "real"),
        }
    }
}

impl FromStr for Pace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(Pace::Fast),
            "real" => Ok(Pace::Real),
            other => Err(format!("unknown pace {other:?}, expected fast or real")),
        }
    }
}

/// Simulated motor channel parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// Steady-state speed at 100% duty, in encoder counts per second.
    pub max_speed_cps: f64,
    /// Mechanical time constant in milliseconds.
    pub tau_ms: u64,
    /// Uniform encoder noise amplitude in counts; zero disables noise.
    pub noise_counts: f64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            max_speed_cps: 20_000.0,
            tau_ms: 150,
            noise_counts: 0.0,
        }
    }
}

impl MotorConfig {
    pub fn plant_params(&self) -> PlantParams {
        PlantParams {
            max_speed_cps: self.max_speed_cps,
            tau: Duration::from_millis(self.tau_ms),
            noise_counts: self.noise_counts,
        }
    }

    fn validate(&self, which: &str) -> Result<(), RigError> {
        if !self.max_speed_cps.is_finite() || self.max_speed_cps <= 0.0 {
            return Err(RigError::Config(format!("{which}.max_speed_cps must be finite and positive")));
        }
        if self.tau_ms == 0 {
            return Err(RigError::Config(format!("{which}.tau_ms must be at least 1")));
        }
        if !self.noise_counts.is_finite() || self.noise_counts < 0.0 {
            return Err(RigError::Config(format!("{which}.noise_counts must be finite and non-negative")));
        }
        Ok(())
    }
}

/// Full rig configuration.
///
/// Resolution order is CLI flag, then the `SERVOBENCH_CONFIG` file, then
/// defaults; individual `SERVOBENCH_*` variables override whichever base was
/// loaded. Motor channel parameters come from the file only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Address the rig server listens on.
    pub listen_addr: String,
    /// Scheduler pacing for commanded runs.
    pub pace: Pace,
    /// Samples each motor task records per run.
    pub samples_per_run: usize,
    /// Period suggested when the host does not choose one.
    pub default_period_ms: u32,
    /// Per-task state-trace ring size; zero disables tracing.
    pub trace_capacity: usize,
    /// Motor 0 channel.
    pub m0: MotorConfig,
    /// Motor 1 channel.
    pub m1: MotorConfig,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:9750".to_string(),
            pace: Pace::Fast,
            samples_per_run: 500,
            default_period_ms: 10,
            trace_capacity: 64,
            m0: MotorConfig::default(),
            m1: MotorConfig::default(),
        }
    }
}

impl RigConfig {
    /// Load a configuration from a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the effective configuration.
    ///
    /// # Workflow
    ///
    /// 1. Load the base: the CLI-supplied file, else the file named by
    ///    `SERVOBENCH_CONFIG`, else defaults.
    /// 2. Apply `SERVOBENCH_*` environment overrides.
    /// 3. Validate the result.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self, RigError> {
        let mut config = if let Some(path) = cli_path {
            Self::load_from_file(path)?
        } else if let Ok(env_path) = env::var("SERVOBENCH_CONFIG") {
            Self::load_from_file(env_path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides from an arbitrary lookup.
    ///
    /// Unparseable values are logged and ignored rather than failing the
    /// whole resolution.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("SERVOBENCH_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        override_parse(&lookup, "SERVOBENCH_PACE", &mut self.pace);
        override_parse(&lookup, "SERVOBENCH_SAMPLES_PER_RUN", &mut self.samples_per_run);
        override_parse(&lookup, "SERVOBENCH_DEFAULT_PERIOD_MS", &mut self.default_period_ms);
        override_parse(&lookup, "SERVOBENCH_TRACE_CAPACITY", &mut self.trace_capacity);
    }

    pub fn validate(&self) -> Result<(), RigError> {
        if self.samples_per_run == 0 {
            return Err(RigError::Config("samples_per_run must be nonzero".to_string()));
        }
        if self.default_period_ms == 0 {
            return Err(RigError::Config("default_period_ms must be at least 1".to_string()));
        }
        self.m0.validate("m0")?;
        self.m1.validate("m1")?;
        Ok(())
    }
}

fn override_parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    if let Some(raw) = lookup(key) {
        match raw.parse() {
            Ok(value) => *slot = value,
            Err(_) => warn!(key, raw = %raw, "ignoring unparseable override"),
        }
    }
}
