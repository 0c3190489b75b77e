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

use serde::{Deserialize, Serialize};
use std::fmt;

/// One measurement of a step response: elapsed time and encoder count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub t_ms: u32,
    pub count: i32,
}

impl Sample {
    pub fn new(t_ms: u32, count: i32) -> Self {
        Self { t_ms, count }
    }
}

/// Recorded trajectory of one step-response run, in sample order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseLog {
    samples: Vec<Sample>,
}

impl ResponseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Rebuild a log from bare counts sampled at a fixed period.
    ///
    /// The wire protocol ships counts only; timestamps are reconstructed
    /// as `index * period_ms`.
    pub fn from_counts(period_ms: u32, counts: &[i32]) -> Self {
        let samples = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| Sample::new(i as u32 * period_ms, count))
            .collect();
        Self { samples }
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Render as two-column CSV with a header row.
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(16 + self.samples.len() * 12);
        out.push_str("t_ms,count\n");
        for sample in &self.samples {
            out.push_str(&format!("{},{}\n", sample.t_ms, sample.count));
        }
        out
    }

    /// Evaluate the log as a step from its first sample to `setpoint`.
    pub fn metrics(&self, setpoint: i32) -> StepMetrics {
        StepMetrics::evaluate(self, setpoint)
    }
}

/// Figures of merit for a recorded step response.
///
/// All values are derived from the step amplitude, the difference between
/// the commanded setpoint and the first recorded count, so they behave the
/// same for forward and backward steps. Fields are `None` when the log
/// cannot support the figure: an empty log yields nothing, a zero-amplitude
/// step has no rise or overshoot, and a trajectory that never enters the
/// 2% band has no settling time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepMetrics {
    /// Time to first reach 90% of the step amplitude.
    pub rise_time_ms: Option<u32>,
    /// Peak excursion past the setpoint, in percent of the amplitude.
    pub overshoot_pct: Option<f64>,
    /// Time after which the response stays within 2% of the amplitude.
    pub settle_time_ms: Option<u32>,
    /// Setpoint minus the mean of the final tenth of the samples.
    pub steady_state_error: Option<f64>,
}

const RISE_FRACTION: f64 = 0.9;
const SETTLE_BAND: f64 = 0.02;

impl StepMetrics {
    fn evaluate(log: &ResponseLog, setpoint: i32) -> Self {
        let samples = log.samples();
        let Some(first) = samples.first() else {
            return Self::default();
        };

        let initial = first.count as f64;
        let amplitude = setpoint as f64 - initial;

        // Mean of the final tenth, at least one sample
        let tail = (samples.len() / 10).max(1);
        let tail_mean = samples[samples.len() - tail..].iter().map(|s| s.count as f64).sum::<f64>() / tail as f64;
        let steady_state_error = Some(setpoint as f64 - tail_mean);

        if amplitude == 0.0 {
            return Self {
                steady_state_error,
                ..Self::default()
            };
        }

        // Progress normalizes out direction: 0 at the start, 1 at the
        // setpoint, >1 past it
        let progress = |count: i32| (count as f64 - initial) / amplitude;

        let rise_time_ms = samples.iter().find(|s| progress(s.count) >= RISE_FRACTION).map(|s| s.t_ms);

        let peak = samples.iter().map(|s| progress(s.count)).fold(f64::MIN, f64::max);
        let overshoot_pct = Some(((peak - 1.0) * 100.0).max(0.0));

        let settle_time_ms = match samples.iter().rposition(|s| (progress(s.count) - 1.0).abs() > SETTLE_BAND) {
            // Never inside the band for good
            Some(last_outside) if last_outside + 1 == samples.len() => None,
            Some(last_outside) => Some(samples[last_outside + 1].t_ms),
            // Inside the band from the very first sample
            None => Some(first.t_ms),
        };

        Self {
            rise_time_ms,
            overshoot_pct,
            settle_time_ms,
            steady_state_error,
        }
    }
}

impl fmt::Display for StepMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt_ms(v: Option<u32>) -> String {
            v.map_or_else(|| "n/a".to_string(), |ms| format!("{ms} ms"))
        }
        let overshoot = self.overshoot_pct.map_or_else(|| "n/a".to_string(), |p| format!("{p:.1}%"));
        let sse = self.steady_state_error.map_or_else(|| "n/a".to_string(), |e| format!("{e:.1}"));
        write!(
            f,
            "rise {}, overshoot {}, settle {}, steady-state error {}",
            opt_ms(self.rise_time_ms),
            overshoot,
            opt_ms(self.settle_time_ms),
            sse
        )
    }
}
