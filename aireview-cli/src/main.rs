//! aireview CLI - Gemini-backed review assistant for Gerrit changes
//!
//! Drives the same provider a Gerrit host would register, from a terminal.

mod commands;

use aireview_core::Config;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ActionsArgs, ChatArgs, ModelsArgs, TokenArgs};

/// aireview: AI review assistance for Gerrit changes
#[derive(Parser, Debug)]
#[command(name = "aireview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Gerrit server URL (overrides config and env)
    #[arg(long, global = true, env = "AIREVIEW_GERRIT_URL")]
    gerrit_url: Option<String>,

    /// Gemini model to use (overrides config and env)
    #[arg(long, global = true, env = "AIREVIEW_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// List the models offered to the host
    Models(ModelsArgs),

    /// List the canned review actions
    Actions(ActionsArgs),

    /// Ask Gemini about a change
    #[command(visible_alias = "c")]
    Chat(ChatArgs),

    /// Manage the Gemini key stored on your Gerrit account
    Token(TokenArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let config = Config::load_with_overrides(cli.gerrit_url.clone(), cli.model.clone())?;

    if cli.verbose {
        tracing::info!(
            gerrit_url = ?config.gerrit.url,
            model = %config.gemini.model,
            credential_source = %config.review.credential_source,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("aireview {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Models(args)) => {
            args.execute(&config.gemini.model)?;
        }
        Some(Commands::Actions(args)) => {
            args.execute()?;
        }
        Some(Commands::Chat(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Token(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("aireview - Gemini review assistance for Gerrit");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn print_config(config: &Config) {
    println!("aireview Configuration");
    println!("======================");
    println!();
    println!("Gerrit Settings:");
    println!("  url: {}", config.gerrit.url.as_deref().unwrap_or("(not set)"));
    println!(
        "  username: {}",
        config.gerrit.username.as_deref().unwrap_or("(anonymous)")
    );
    println!();
    println!("Gemini Settings:");
    println!("  base_url: {}", config.gemini.base_url);
    println!("  model: {}", config.gemini.model);
    match config.gemini.timeout {
        Some(timeout) => println!("  timeout: {:?}", timeout),
        None => println!("  timeout: (none)"),
    }
    println!();
    println!("Review Settings:");
    println!("  max_files: {}", config.review.max_files);
    match config.review.max_context_bytes {
        Some(limit) => println!("  max_context_bytes: {}", limit),
        None => println!("  max_context_bytes: (unlimited)"),
    }
    println!("  fetch_concurrency: {}", config.review.fetch_concurrency);
    println!("  credential_source: {}", config.review.credential_source);
    println!();
    if let Some(path) = Config::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}
