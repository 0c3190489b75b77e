use super::{output_dir, stamp, write_csv};
use anyhow::Result;
use servobench_wire::{BenchClient, Channel, RunRequest};
use std::path::PathBuf;
use tracing::info;

pub async fn run(addr: &str, request: &RunRequest, out: Option<PathBuf>) -> Result<()> {
    if request.period_ms == 0 {
        anyhow::bail!("period must be at least 1 ms");
    }

    let mut client = BenchClient::connect(addr).await?;
    println!("Connected to {}", client.rig_greeting().unwrap_or("rig"));
    info!(addr, kp0 = request.kp0, kp1 = request.kp1, period_ms = request.period_ms, "single step response");

    let result = client.run_step_response(request).await?;
    let dir = output_dir(out);
    let stamp = stamp();

    for channel in Channel::ALL {
        let log = result.channel(channel);
        let setpoint = match channel {
            Channel::M0 => request.setpoint0,
            Channel::M1 => request.setpoint1,
        };
        let path = write_csv(&dir, &format!("step-{stamp}-{channel}.csv"), log)?;
        println!("{channel}: {} samples -> {}", log.len(), path.display());
        println!("  setpoint {setpoint}: {}", log.metrics(setpoint));
    }

    Ok(())
}
