use anyhow::Result;
use servobench_rig::{RigConfig, RigServer};
use std::path::PathBuf;

pub async fn serve(config_path: Option<PathBuf>, listen: Option<String>, pace: Option<String>) -> Result<()> {
    let mut config = RigConfig::resolve(config_path.as_deref())?;
    if let Some(listen) = listen {
        config.listen_addr = listen;
    }
    if let Some(pace) = pace {
        config.pace = pace.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }

    println!("Starting rig on {} ({} pace)", config.listen_addr, config.pace);
    RigServer::new(config).run().await?;
    Ok(())
}
