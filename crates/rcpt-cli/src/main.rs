//! CLI application for receipt line-item extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, discounts, mark, parse};

/// Receipt OCR post-processing - Extract line items from noisy receipt text
#[derive(Parser)]
#[command(name = "rcpt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Fixed locale code (e.g. de, en, ru); turns off per-receipt detection
    #[arg(long, global = true)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract line items from a single receipt
    Parse(parse::ParseArgs),

    /// Process multiple receipt files
    Batch(batch::BatchArgs),

    /// List discounts found in a receipt
    Discounts(discounts::DiscountsArgs),

    /// Rewrite quantity lines into the tagged form
    Mark(mark::MarkArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    let locale = cli.locale.as_deref();

    match cli.command {
        Commands::Parse(args) => parse::run(args, commands::load_config(config_path, locale)?).await,
        Commands::Batch(args) => batch::run(args, commands::load_config(config_path, locale)?).await,
        Commands::Discounts(args) => {
            discounts::run(args, commands::load_config(config_path, locale)?).await
        }
        Commands::Mark(args) => mark::run(args).await,
        Commands::Config(args) => config::run(args, config_path, locale).await,
    }
}
