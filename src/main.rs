//! Demo binary: configure a Midi Fighter Twister and print encoder values.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use twister_driver::knobs::load_knob_config;
use twister_driver::session::DeviceSession;
use twister_driver::transport::MidirTransport;
use twister_driver::Bank;

/// Midi Fighter Twister driver demo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the knob configuration file
    #[arg(short, long, default_value = "knobs.json")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,

    /// Bank to select after configuration (1-4)
    #[arg(short, long, default_value = "1")]
    bank: u8,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    if args.list_ports {
        let (inputs, outputs) = MidirTransport::list_ports()?;
        println!("Input ports:");
        for name in inputs {
            println!("  {name}");
        }
        println!("Output ports:");
        for name in outputs {
            println!("  {name}");
        }
        return Ok(());
    }

    let bank = match args.bank {
        1 => Bank::Bank1,
        2 => Bank::Bank2,
        3 => Bank::Bank3,
        4 => Bank::Bank4,
        n => anyhow::bail!("invalid bank {n} (expected 1-4)"),
    };

    let mut session = DeviceSession::discover().context("Midi Fighter Twister not found")?;

    session.initialize_defaults();

    if std::path::Path::new(&args.config).exists() {
        let knobs = load_knob_config(&args.config)?;
        info!("Loaded {} knob(s) from {}", knobs.len(), args.config);
        for (index, settings) in &knobs {
            session.subscribe(*index, settings)?;
        }
    } else {
        info!("No config file at {}, using defaults only", args.config);
    }

    let report = session.configure()?;
    info!(
        "Configuration pushed: {} encoder(s), global block: {}",
        report.encoders_sent, report.global_sent
    );

    session.set_bank(bank)?;

    session.set_value_changed_callback(|label, value| {
        println!("{label}: {value:.4}");
    });

    session.start()?;
    println!("Turn some knobs; press Enter to exit.");

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read stdin")?;

    session.close();
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
