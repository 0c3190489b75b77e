use super::{output_dir, stamp, write_csv};
use anyhow::Result;
use servobench_wire::{BenchClient, Channel, RunRequest};
use std::path::PathBuf;
use tracing::info;

pub async fn run(addr: &str, m0: &[i32], m1: &[i32], kp: f32, period: u32, out: Option<PathBuf>) -> Result<()> {
    if m0.is_empty() {
        anyhow::bail!("at least one setpoint pair is required");
    }
    if m0.len() != m1.len() {
        anyhow::bail!("--m0 and --m1 need the same number of setpoints ({} vs {})", m0.len(), m1.len());
    }
    if period == 0 {
        anyhow::bail!("period must be at least 1 ms");
    }

    let mut client = BenchClient::connect(addr).await?;
    println!("Connected to {}", client.rig_greeting().unwrap_or("rig"));
    info!(addr, kp, period_ms = period, runs = m0.len(), "paired position campaign");

    let dir = output_dir(out);
    let stamp = stamp();

    for (i, (&sp0, &sp1)) in m0.iter().zip(m1).enumerate() {
        let request = RunRequest {
            kp0: kp,
            kp1: kp,
            setpoint0: sp0,
            setpoint1: sp1,
            period_ms: period,
        };
        let result = client.run_step_response(&request).await?;

        println!("run {i}: m0 -> {sp0}, m1 -> {sp1}");
        for channel in Channel::ALL {
            let log = result.channel(channel);
            let path = write_csv(&dir, &format!("positions-{stamp}-run{i}-{channel}.csv"), log)?;
            let final_count = log.samples().last().map(|s| s.count).unwrap_or(0);
            println!("  {channel}: {} samples, final {final_count} -> {}", log.len(), path.display());
        }
    }

    Ok(())
}
