use super::{output_dir, stamp, write_csv};
use anyhow::Result;
use servobench_core::control::StepMetrics;
use servobench_wire::{BenchClient, RunRequest};
use std::path::PathBuf;
use tracing::info;

pub async fn run(addr: &str, periods: &[u32], kp: f32, setpoint: i32, out: Option<PathBuf>) -> Result<()> {
    if periods.is_empty() {
        anyhow::bail!("at least one period is required");
    }
    if periods.iter().any(|&p| p == 0) {
        anyhow::bail!("periods must be at least 1 ms");
    }

    let mut client = BenchClient::connect(addr).await?;
    println!("Connected to {}", client.rig_greeting().unwrap_or("rig"));
    info!(addr, kp, setpoint, runs = periods.len(), "period sweep");

    let dir = output_dir(out);
    let stamp = stamp();
    let mut rows: Vec<(u32, usize, i32, StepMetrics)> = Vec::new();

    for &period in periods {
        // The classic period sweep drives motor 0 only.
        let request = RunRequest {
            kp0: kp,
            kp1: 0.0,
            setpoint0: setpoint,
            setpoint1: 0,
            period_ms: period,
        };
        let result = client.run_step_response(&request).await?;
        let path = write_csv(&dir, &format!("sweep-{stamp}-p{period}.csv"), &result.m0)?;
        println!("period {period} ms: {} samples -> {}", result.m0.len(), path.display());

        let final_count = result.m0.samples().last().map(|s| s.count).unwrap_or(0);
        rows.push((period, result.m0.len(), final_count, result.m0.metrics(setpoint)));
    }

    println!();
    println!("{:<12} {:<9} {:<10} metrics", "period (ms)", "samples", "final");
    for (period, samples, final_count, metrics) in rows {
        println!("{:<12} {:<9} {:<10} {}", period, samples, final_count, metrics);
    }

    Ok(())
}
