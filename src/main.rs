//! Binary entrypoint for the meshbot CLI.
//!
//! One mode: connect to a MeshCore device on a serial port and answer
//! `ping`/`.date` on the allowed channels until interrupted. See the
//! library crate docs for module-level details: `meshbot::`.
use anyhow::Result;
use clap::Parser;
use log::info;

use meshbot::config::{BotConfig, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "meshbot")]
#[command(about = "A channel-responder bot for MeshCore mesh networks")]
#[command(version)]
struct Cli {
    /// Serial port to connect to
    #[arg(short = 's', long, default_value = DEFAULT_PORT)]
    port: String,

    /// Verbose logging (-v, -vv for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    info!("Starting meshbot v{}", env!("CARGO_PKG_VERSION"));

    let config = BotConfig {
        port: cli.port,
        ..BotConfig::default()
    };

    #[cfg(feature = "serial")]
    {
        use meshbot::bot::BotServer;
        use meshbot::link::serial::SerialLink;

        info!("Connecting to {}", config.port);
        let (link, events) = SerialLink::new(&config.port, config.baud_rate);
        let mut server = BotServer::new(config, link, events);
        server.run().await
    }

    #[cfg(not(feature = "serial"))]
    {
        let _ = config;
        anyhow::bail!("meshbot was built without the 'serial' feature; no device transport is available");
    }
}

fn init_logging(verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    builder.format(|fmt, record| {
        writeln!(
            fmt,
            "{} [{}] {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
            record.level(),
            record.args()
        )
    });
    let _ = builder.try_init();
}
