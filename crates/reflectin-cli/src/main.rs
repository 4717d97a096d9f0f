use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal_gateway;

#[derive(Parser)]
#[command(name = "reflectin", version, about = "ReflectIn CLI")]
struct Cli {
    /// Log scheduler transitions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the backend; reminders appear when you go quiet
    Chat(commands::chat::ChatArgs),
    /// Show the reminder delay for a sentiment score
    Delay(commands::delay::DelayArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Fetch a check-up prompt from the backend
    Checkup {
        /// Backend base URL (overrides backend.base_url)
        #[arg(long)]
        base_url: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Chat(args) => commands::chat::run(args).await,
        Commands::Delay(args) => commands::delay::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Checkup { base_url } => commands::checkup::run(base_url).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
