mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "postplan")]
#[command(about = "Social media content planning pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the pipeline on a raw scrape already in the data bucket
    Run {
        /// Object key in the data bucket
        data_key: String,
    },
    /// Scrape a username, upload the raw data, and run the pipeline on it
    User {
        username: String,

        /// Maximum posts to scrape (defaults to POSTPLAN_RESULTS_LIMIT)
        #[arg(long)]
        results_limit: Option<u32>,
    },
    /// Process pending usernames from the queue document, then run each upload
    Queue,
    /// Normalize and validate a local raw JSON file without touching the network
    Normalize { file: PathBuf },
    /// Generate a single recommendation for a topic
    Recommend { topic: String },
    /// List objects in the data bucket
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("postplan: no command given (see --help)");
        return Ok(());
    };

    // Offline: no bucket credentials required.
    if let Commands::Normalize { file } = &command {
        init_tracing("info")?;
        return commands::run_normalize(file);
    }

    let config = postplan_core::load_app_config()?;
    init_tracing(&config.log_level)?;

    match command {
        Commands::Run { data_key } => commands::run_key(&config, &data_key).await,
        Commands::User {
            username,
            results_limit,
        } => commands::run_user(&config, &username, results_limit).await,
        Commands::Queue => commands::run_queue(&config).await,
        Commands::Recommend { topic } => commands::run_recommend(&config, &topic).await,
        Commands::List => commands::run_list(&config).await,
        Commands::Normalize { .. } => Ok(()),
    }
}

fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

#[cfg(test)]
mod tests;
