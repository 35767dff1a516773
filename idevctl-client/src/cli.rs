use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::devices;
use crate::profile;
use crate::syslog;
use crate::util::logging;

#[derive(Parser, Debug)]
#[command(name = "idevctl")]
#[command(version, about = "Talk to USB connected iOS devices", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configuration profile commands
    #[command(alias = "prof")]
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Stream the device syslog to stdout
    Syslog {
        /// Device UUID to connect (prompts when empty)
        #[arg(short, long, default_value = "")]
        uuid: String,

        /// Stop streaming after this long (e.g. 10s, 500ms, 2m)
        #[arg(short, long, default_value = "10s", value_parser = parse_timeout)]
        timeout: Duration,

        /// Colorize output
        #[arg(
            long,
            action = ArgAction::Set,
            num_args = 0..=1,
            default_value_t = false,
            default_missing_value = "true"
        )]
        color: bool,
    },

    /// List USB connected devices
    Devices,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Install a configuration profile on a device
    Upload {
        /// Device UDID (prompts when omitted)
        #[arg(short, long)]
        udid: Option<String>,

        /// Profile to upload
        file: PathBuf,
    },
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let d = humantime::parse_duration(s).map_err(|e| format!("invalid duration '{s}': {e}"))?;
    if d.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(d)
}

pub async fn cli() -> anyhow::Result<()> {
    run(Cli::parse()).await
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    logging::init_tracing(cli.verbose || config.verbose, &config.log_level);

    match cli.command {
        Commands::Profile { command } => match command {
            ProfileCommands::Upload { udid, file } => profile::run(udid, file, &config).await?,
        },
        Commands::Syslog {
            uuid,
            timeout,
            color,
        } => {
            let uuid = Some(uuid).filter(|u| !u.is_empty());
            syslog::run(uuid, timeout, color, &config).await?
        }
        Commands::Devices => devices::list(&config).await?,
    }

    Ok(())
}
