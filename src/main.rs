use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use coolmasternet::{Bridge, BridgeConfig, Unit, protocol::commands::Request};
use tracing_subscriber::EnvFilter;
use url::Url;


/// Query and control the units behind a CoolMasterNet bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the bridge
    ///
    /// tcp://host[:port][?swing=true&timeout_ms=1000]
    bridge: Url,

    /// Also query the swing mode of each unit
    #[arg(long)]
    swing: bool,

    /// Read timeout for the prompt and the response, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show general bridge information
    Info,

    /// Show the status of every unit
    Status,

    /// Show or change a single unit
    Unit {
        /// Unit identifier, e.g. L1.100
        id: String,

        #[command(subcommand)]
        action: Option<UnitAction>,
    },

    /// Send an arbitrary command and print the raw response
    Raw {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum UnitAction {
    On,
    Off,
    Fan { speed: String },
    Mode { mode: String },
    Temp { value: f64 },
    Swing { mode: String },
    ResetFilter,
    Lock { target: LockArg },
    Unlock { target: LockArg },
    /// Provide an ambient temperature hint
    Feed { value: f64 },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LockArg {
    Power,
    Thermostat,
    Mode,
}


fn print_unit(unit: &Unit) {
    let line = unit.to_string();

    let line = if unit.error_code().is_some() {
        line.on_red().bright_white()
    } else if unit.is_on() {
        line.green()
    } else {
        line.dimmed()
    };

    println!("{line}");
}

async fn unit_action(unit: Unit, action: UnitAction) -> Result<Option<Unit>> {
    let unit = match action {
        UnitAction::On => unit.turn_on().await?,
        UnitAction::Off => unit.turn_off().await?,
        UnitAction::Fan { speed } => unit.set_fan_speed(&speed).await?,
        UnitAction::Mode { mode } => unit.set_mode(&mode).await?,
        UnitAction::Temp { value } => unit.set_thermostat(value).await?,
        UnitAction::Swing { mode } => unit.set_swing(&mode).await?,
        UnitAction::ResetFilter => unit.reset_filter().await?,
        UnitAction::Lock { target } => match target {
            LockArg::Power => unit.lock_on().await?,
            LockArg::Thermostat => unit.lock_temp().await?,
            LockArg::Mode => unit.lock_mode().await?,
        },
        UnitAction::Unlock { target } => match target {
            LockArg::Power => unit.unlock_on().await?,
            LockArg::Thermostat => unit.unlock_temp().await?,
            LockArg::Mode => unit.unlock_mode().await?,
        },
        UnitAction::Feed { value } => {
            unit.feed(value).await?;
            return Ok(None);
        },
    };

    Ok(Some(unit))
}


#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = BridgeConfig::from_url(&args.bridge)?;
    if args.swing {
        config = config.with_swing_support(true);
    }
    if let Some(millis) = args.timeout_ms {
        config = config.with_read_timeout(Duration::from_millis(millis));
    }

    let bridge = Bridge::new(config);

    match args.command {
        Command::Info => {
            let mut info: Vec<_> = bridge.info().await
                .context("failed to read bridge info")?
                .into_iter()
                .collect();
            info.sort();

            for (key, value) in info {
                println!("{}: {value}", key.bold());
            }
        },

        Command::Status => {
            let mut units: Vec<_> = bridge.status().await
                .context("failed to read unit status")?
                .into_values()
                .collect();
            units.sort_by(|a, b| a.unit_id().cmp(b.unit_id()));

            for unit in &units {
                print_unit(unit);
            }
        },

        Command::Unit { id, action } => {
            let unit = bridge.unit(&id).await
                .with_context(|| format!("failed to read unit {id}"))?;

            let unit = match action {
                Some(action) => unit_action(unit, action).await
                    .with_context(|| format!("failed to update unit {id}"))?,
                None => Some(unit),
            };

            if let Some(unit) = unit {
                print_unit(&unit);
            }
        },

        Command::Raw { words } => {
            let line = words.join(" ");
            let response = bridge.request(Request::Raw(&line)).await?;

            print!("{response}");
        },
    }

    Ok(())
}
