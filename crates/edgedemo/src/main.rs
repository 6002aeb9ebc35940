mod commands;
mod console;
mod progress;
mod prompt;
mod session;

use clap::{Parser, Subcommand};
use colored::Colorize;
use edgedemo_config::DemoConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "edgedemo")]
#[command(
    about = "Deploy an app to StackPath's edge, put CDN and WAF in front of it, then watch it work",
    long_about = None
)]
struct Cli {
    /// Configuration file (default: edgedemo.yaml lookup)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision the whole demo and monitor it
    Run {
        /// Do not wait for [Enter] between steps
        #[arg(short, long)]
        yes: bool,
    },
    /// Monitor an already deployed workload and site
    Monitor {
        /// Workload slug or ID
        #[arg(short, long)]
        workload: String,
        /// Delivery site ID
        #[arg(short, long)]
        site: String,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = dispatch(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        println!("Done");
        std::process::exit(1);
    }
}

/// Logs go to stderr so they never mix into the demo output.
/// `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    // the config is only loaded by commands that talk to the API
    match cli.command {
        Commands::Version => {
            println!("edgedemo {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Run { yes } => {
            let config = DemoConfig::load(cli.config.as_deref())?;
            commands::run::handle(&config, yes).await
        }
        Commands::Monitor { workload, site } => {
            let config = DemoConfig::load(cli.config.as_deref())?;
            commands::monitor::handle(&config, &workload, &site).await
        }
    }
}
