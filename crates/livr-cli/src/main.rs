//! CLI application for profile-driven delivery-note extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, detect, extract, profiles};

/// livr - Extract line items from supplier delivery notes
#[derive(Parser)]
#[command(name = "livr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract items from a single delivery note
    Extract(extract::ExtractArgs),

    /// Extract items from multiple delivery notes
    Batch(batch::BatchArgs),

    /// Detect the supplier of a delivery note
    Detect(detect::DetectArgs),

    /// Validate and inspect supplier profiles
    Profiles(profiles::ProfilesArgs),

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
    match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Detect(args) => detect::run(args, config_path).await,
        Commands::Profiles(args) => profiles::run(args, config_path).await,
        Commands::Config(args) => config::run(args).await,
    }
}
