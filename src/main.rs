mod cli;

use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use cli::{Cli, Commands};
use zenfan::config::{Config, DEFAULT_CONFIG_PATH};
use zenfan::controller::CoolingDevice;
use zenfan::errors::FanControlError;
use zenfan::firmware::{AcpiCallFirmware, Firmware, SimulatedFirmware};
use zenfan::platform::{
    check_vendor, Driver, NotifierChains, ThermalRegistry, COOLING_DEVICE_NAME,
};
use zenfan::session::{parse_line, SessionCommand, HELP};

type BoxedFirmware = Box<dyn Firmware + Send + Sync>;

fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to zenfan.log next to the executable.
    let log_path = std::env::current_exe()
        .unwrap_or_default()
        .parent()
        .unwrap_or(Path::new("."))
        .join("zenfan.log");
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let log_level = level_from_verbosity(cli.verbose);
    if let Ok(file) = File::create(&log_path) {
        let _ = WriteLogger::init(log_level, log_config, file);
    }
    info!("zenfan started (log level: {})", log_level);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG_PATH))?,
    };

    if cli.simulate || config.skip_vendor_check {
        info!("skipping platform vendor check");
    } else {
        check_vendor(&config.dmi_vendor_path, &config.expected_vendor)?;
    }

    let firmware: BoxedFirmware = if cli.simulate {
        Box::new(SimulatedFirmware::new())
    } else {
        Box::new(AcpiCallFirmware::from_config(&config))
    };

    match cli.command {
        Commands::Max => cmd_max(config.fan_id, firmware),
        Commands::Get => cmd_get(config.fan_id, firmware),
        Commands::Auto => cmd_auto(config.fan_id, firmware),
        Commands::Run => cmd_run(config.fan_id, firmware),
    }
}

fn cmd_max(fan_id: u32, firmware: BoxedFirmware) -> Result<()> {
    let device = CoolingDevice::new(fan_id, firmware);
    println!("{}", device.get_max_speed());
    Ok(())
}

fn cmd_get(fan_id: u32, firmware: BoxedFirmware) -> Result<()> {
    let device = CoolingDevice::new(fan_id, firmware);
    let speed = device.get_current_speed()?;
    println!("{}", speed);
    Ok(())
}

fn cmd_auto(fan_id: u32, firmware: BoxedFirmware) -> Result<()> {
    let device = CoolingDevice::new(fan_id, firmware);
    device.force_auto()?;
    println!("Fan {} returned to automatic control", fan_id);
    Ok(())
}

fn cmd_run(fan_id: u32, firmware: BoxedFirmware) -> Result<()> {
    let thermal = ThermalRegistry::new();
    let power = NotifierChains::new();
    let driver = Driver::init(fan_id, firmware, &thermal, &power)?;
    let cooling = thermal
        .find(COOLING_DEVICE_NAME)
        .context("cooling device vanished after registration")?;

    println!("zenfan ready, type 'help' for commands");
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let command = match parse_line(&line) {
            None => continue,
            Some(Ok(command)) => command,
            Some(Err(message)) => {
                println!("error: {}", message);
                continue;
            }
        };

        match command {
            SessionCommand::Quit => break,
            SessionCommand::Help => println!("{}", HELP),
            SessionCommand::Max => println!("{}", cooling.get_max_state()),
            SessionCommand::Status => println!("{}", driver.device().snapshot()),
            SessionCommand::Get => report(cooling.get_cur_state().map(|speed| speed.to_string())),
            SessionCommand::Set(speed) => {
                let applied = match u64::try_from(speed) {
                    Ok(state) => cooling.set_cur_state(state),
                    Err(_) => Err(FanControlError::InvalidArgument(speed)),
                };
                report(applied.map(|()| format!("set {}", speed)))
            }
            SessionCommand::Auto => report(driver.device().force_auto().map(|()| "auto".to_string())),
            SessionCommand::Event(event) => {
                let outcome = power.deliver(event);
                println!("{}: {:?}", event, outcome);
            }
        }
        stdout.flush()?;
    }

    driver.teardown();
    info!("zenfan stopped");
    Ok(())
}

fn report(result: Result<String, FanControlError>) {
    match result {
        Ok(message) => println!("{}", message),
        Err(error) if error.is_transient() => {
            warn!("{}", error);
            println!("unavailable: {}", error);
        }
        Err(error) => println!("error: {}", error),
    }
}
