pub mod docs;
pub mod positions;
pub mod rig;
pub mod step;
pub mod sweep;

use anyhow::{Context, Result};
use servobench_core::control::ResponseLog;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory campaign CSV files land in when `--out` is not given.
pub fn output_dir(cli_out: Option<PathBuf>) -> PathBuf {
    cli_out.unwrap_or_else(|| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("servobench"))
}

/// Timestamp embedded in output file names.
pub fn stamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Write one response log as CSV, creating the directory if needed.
pub fn write_csv(dir: &Path, name: &str, log: &ResponseLog) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, log.to_csv()).with_context(|| format!("writing {}", path.display()))?;
    debug!(path = %path.display(), samples = log.len(), "wrote trajectory");
    Ok(path)
}
