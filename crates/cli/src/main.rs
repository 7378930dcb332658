//! AI Foundation CLI, the main entry point.
//!
//! Commands:
//! - `react`: Run a task through the ReAct loop with the built-in tools
//! - `chat`: Single-message or interactive conversation
//! - `providers`: Show configured providers and their availability
//! - `resolve`: Show which provider serves a model
//! - `tools`: List the built-in tools

use aifoundation_config::{AppConfig, LoggingConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "foundation",
    about = "AI Foundation: ReAct and conversational agents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a config file
    #[arg(short, long, global = true, env = "AIFOUNDATION_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a task with the ReAct agent
    React {
        /// The task to solve
        #[arg(short, long)]
        message: String,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,

        /// Override the iteration budget
        #[arg(long)]
        max_iterations: Option<u32>,
    },

    /// Talk to the conversational agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,

        /// Print the reply as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// Show configured providers
    Providers,

    /// Show which provider a model name resolves to
    Resolve {
        /// Model name, e.g. `glm-4`
        model: String,
    },

    /// List built-in tools
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging, cli.verbose);
    tracing::debug!(
        providers = config.providers.len(),
        model = %config.agent.model,
        "Configuration loaded"
    );

    match cli.command {
        Commands::React {
            message,
            model,
            max_iterations,
        } => commands::react::run(&config, &message, model, max_iterations).await?,
        Commands::Chat {
            message,
            model,
            stream,
        } => commands::chat::run(&config, message, model, stream).await?,
        Commands::Providers => commands::providers::run(&config).await?,
        Commands::Resolve { model } => commands::resolve::run(&config, &model)?,
        Commands::Tools => commands::tools::run(),
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::load()?);
    };
    let mut config = AppConfig::load_from(path)?;
    config.apply_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    // RUST_LOG wins over both the flag and the config file
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
