use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "zenfan")]
#[command(about = "Suspend-safe fan control for ASUS Zenbook laptops")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use an in-memory firmware instead of acpi_call
    #[arg(long, global = true)]
    pub simulate: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the maximum fan speed
    Max,

    /// Read the current fan speed from the firmware
    Get,

    /// Hand the fan back to the firmware curve
    Auto,

    /// Run the driver, reading commands from stdin (one per line)
    Run,
}
