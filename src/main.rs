//! Serial Capture
//!
//! Records the serial output of an embedded board (ESP32, STM32, ...) into a
//! plain text file for a fixed amount of time, echoing every line to the
//! console while it runs.
//!
//! # Usage
//!
//! ```bash
//! # List available serial ports
//! serial-capture ports
//!
//! # Capture 48 seconds from /dev/ttyUSB0 at 115200 baud into dados_sensores.txt
//! serial-capture capture
//!
//! # Capture from a specific port for 10 seconds
//! serial-capture capture -p COM3 -b 115200 -o sensors.txt -d 10
//!
//! # Use a config file, overriding the duration
//! serial-capture capture --config capture.toml -d 60
//!
//! # Write a starter config file
//! serial-capture generate config -o capture.toml
//! ```

mod capture;
mod config;
mod serial;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use capture::ConsoleSink;
use config::{CaptureConfig, Overrides};
use serial::SerialTransport;

/// Serial Capture
///
/// Timed serial line capture to a text file
#[derive(Parser)]
#[command(name = "serial-capture")]
#[command(author = "Prasanna Gautam")]
#[command(version = "0.1.0")]
#[command(about = "Timed serial line capture to a text file")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture serial output into a file for a fixed duration
    Capture(CaptureArgs),

    /// List available serial ports
    Ports,

    /// Generate configuration files
    #[command(subcommand)]
    Generate(GenerateCommands),
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// Config file (TOML, [capture] table)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port path (e.g., /dev/ttyUSB0, COM3)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Output text file (truncated)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Capture duration in seconds
    #[arg(short, long, allow_negative_numbers = true)]
    duration: Option<f64>,

    /// Serial read timeout in milliseconds
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Pause after an empty poll in milliseconds (0 = busy-poll)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Prefix echoed lines with timestamps (the file is never timestamped)
    #[arg(short, long)]
    timestamps: bool,
}

impl CaptureArgs {
    fn resolve(&self) -> Result<CaptureConfig> {
        let config = CaptureConfig::load(self.config.as_deref())?;
        Ok(config.apply(Overrides {
            port: self.port.clone(),
            baud_rate: self.baud,
            output: self.output.clone(),
            duration_secs: self.duration,
            read_timeout_ms: self.read_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }))
    }
}

#[derive(Subcommand)]
enum GenerateCommands {
    /// Generate a capture config file
    Config {
        /// Start from an existing config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Commands::Capture(args) => handle_capture(args),
        Commands::Ports => {
            serial::port::print_ports()?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Generate(cmd) => {
            handle_generate(cmd)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn handle_capture(args: CaptureArgs) -> Result<ExitCode> {
    let config = args.resolve()?;
    let session = config.to_session();

    println!(
        "{} Capturing {} for {:.1}s",
        "[*]".cyan().bold(),
        session.port.port_path.white(),
        session.duration.as_secs_f64()
    );

    let mut sink = ConsoleSink::new(args.timestamps);

    // The sink has already printed the failure.
    match capture::capture(&SerialTransport, &session, &mut sink) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            log::debug!("{} lines saved before the capture stopped", err.lines_written());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn handle_generate(cmd: GenerateCommands) -> Result<()> {
    match cmd {
        GenerateCommands::Config { config, output } => {
            let text = CaptureConfig::load(config.as_deref())?.to_toml()?;

            if let Some(path) = output {
                std::fs::write(&path, &text)?;
                println!(
                    "{} Capture config written to {}",
                    "[OK]".green().bold(),
                    path.display()
                );
            } else {
                print!("{}", text);
            }
        }
    }

    Ok(())
}
