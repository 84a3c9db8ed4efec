//! tweetmesh CLI - runs the content and social services
//!
//! - `tweetmesh serve content|social` - start a service
//! - `tweetmesh config content|social` - show the resolved configuration
//!
//! A `.env` file in the working directory is loaded before anything else.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use commands::config::ConfigArgs;
use commands::serve::ServeArgs;
use tracing_setup::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "tweetmesh",
    author,
    version,
    about = "Content and social-graph services with deferred transactions",
    long_about = "Run the tweet (content) and user (social) HTTP services. Each service \
                  registers with a discovery registry at startup and resolves its peers \
                  through it."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a service until Ctrl+C or SIGTERM
    Serve(ServeArgs),

    /// Print the configuration a service would start with
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Config(args) => commands::run_config(args)?,
    }

    Ok(())
}
