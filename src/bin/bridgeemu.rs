use anyhow::{Context, Result};
use clap::Parser;
use coolmasternet::emulator::{EmulatedUnit, Emulator};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Emulator for a CoolMasterNet bridge
///
/// Serves the bridge's command channel with a number of emulated indoor
/// units (L1.100, L1.101, ...).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address and port to listen on (host:port)
    #[arg(default_value = "127.0.0.1:10102")]
    listen: String,

    /// Number of indoor units to emulate
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..=900))]
    units: u16,

    /// Emulate units without louvers (swing commands are unsupported)
    #[arg(long)]
    no_swing: bool,
}


#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let units = (0..args.units).map(|n| {
        let unit = EmulatedUnit {
            swing: if args.no_swing { None } else { EmulatedUnit::default().swing },
            ..Default::default()
        };

        (format!("L1.{:03}", 100 + n), unit)
    });

    let emulator = Emulator::new(units);

    let listener = TcpListener::bind(&args.listen).await
        .with_context(|| format!("failed to listen on {}", args.listen))?;

    info!(listen = %args.listen, units = args.units, "emulating bridge");

    emulator.serve(listener).await?;

    Ok(())
}
