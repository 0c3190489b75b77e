use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use anyhow::Result;
use servobench_wire::RunRequest;

/// CLI for the servobench two-motor test bench
#[derive(Parser, Debug)]
#[command(name = "servobench", about = "Servobench rig server and step-response campaigns")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for navigation data files
#[derive(Subcommand, Debug)]
#[command(about = "Parse, validate, and convert documentation navigation data")]
pub enum DocsCommands {
    /// Parse a navigation data file and check its invariants
    Validate {
        /// Path to the .js data file
        file: PathBuf,
    },
    /// Convert a navigation data file to JSON on stdout
    Export {
        /// Path to the .js data file
        file: PathBuf,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

/// Top-level commands for servobench
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the rig server
    Rig {
        /// Path to configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Listen address (overrides the configuration)
        #[arg(long)]
        listen: Option<String>,

        /// Pacing: fast or real (overrides the configuration)
        #[arg(long)]
        pace: Option<String>,
    },

    /// Run one step response against a rig and save both trajectories
    Step {
        /// Rig address
        #[arg(long, default_value = "127.0.0.1:9750")]
        addr: String,

        /// Proportional gain for motor 0
        #[arg(long, default_value_t = 0.05)]
        kp0: f32,

        /// Proportional gain for motor 1
        #[arg(long, default_value_t = 0.05)]
        kp1: f32,

        /// Motor 0 setpoint in encoder counts
        #[arg(long, default_value_t = 16_000)]
        sp0: i32,

        /// Motor 1 setpoint in encoder counts
        #[arg(long, default_value_t = 16_000)]
        sp1: i32,

        /// Control period in milliseconds
        #[arg(long, default_value_t = 10)]
        period: u32,

        /// Output directory for CSV files
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Sweep motor 0 step responses across control periods
    Sweep {
        /// Rig address
        #[arg(long, default_value = "127.0.0.1:9750")]
        addr: String,

        /// Periods to test, in milliseconds
        #[arg(long, value_delimiter = ',', default_values_t = vec![10, 25, 40, 60, 100])]
        periods: Vec<u32>,

        /// Proportional gain for motor 0
        #[arg(long, default_value_t = 0.05)]
        kp: f32,

        /// Motor 0 setpoint in encoder counts
        #[arg(long, default_value_t = 16_000)]
        setpoint: i32,

        /// Output directory for CSV files
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Drive both motors through a list of paired setpoints
    Positions {
        /// Rig address
        #[arg(long, default_value = "127.0.0.1:9750")]
        addr: String,

        /// Motor 0 setpoints, comma separated
        #[arg(long, value_delimiter = ',')]
        m0: Vec<i32>,

        /// Motor 1 setpoints, comma separated
        #[arg(long, value_delimiter = ',')]
        m1: Vec<i32>,

        /// Proportional gain for both motors
        #[arg(long, default_value_t = 0.05)]
        kp: f32,

        /// Control period in milliseconds
        #[arg(long, default_value_t = 10)]
        period: u32,

        /// Output directory for CSV files
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Documentation navigation data tooling
    Docs {
        #[command(subcommand)]
        command: DocsCommands,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Rig { config, listen, pace } => {
            commands::rig::serve(config, listen, pace).await?;
        }
        Commands::Step {
            addr,
            kp0,
            kp1,
            sp0,
            sp1,
            period,
            out,
        } => {
            let request = RunRequest {
                kp0,
                kp1,
                setpoint0: sp0,
                setpoint1: sp1,
                period_ms: period,
            };
            commands::step::run(&addr, &request, out).await?;
        }
        Commands::Sweep {
            addr,
            periods,
            kp,
            setpoint,
            out,
        } => {
            commands::sweep::run(&addr, &periods, kp, setpoint, out).await?;
        }
        Commands::Positions {
            addr,
            m0,
            m1,
            kp,
            period,
            out,
        } => {
            commands::positions::run(&addr, &m0, &m1, kp, period, out).await?;
        }
        Commands::Docs { command } => {
            commands::docs::handle(command)?;
        }
    }

    Ok(())
}
