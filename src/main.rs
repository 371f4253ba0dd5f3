use askrag::cli::handle_ask_command;
use askrag::cli::handle_chat_command;
use askrag::cli::handle_config_command;
use askrag::cli::handle_ingest_command;
use askrag::cli::handle_reset_command;
use askrag::cli::handle_serve_command;
use askrag::cli::handle_stats_command;
use askrag::cli::Cli;
use askrag::cli::Commands;
use askrag::config::AppConfig;
use askrag::Result;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::from_sources(Some(path.as_path()))?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    if cli.verbose {
        askrag::logging::init_logging_with_level(
            "debug",
            config
                .logging
                .file_output
                .then_some(config.logging.directory.as_str()),
        )?;
    } else {
        askrag::logging::init_logging_with_config(&config.logging)?;
    }
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Serve { host, port, cors } => {
            handle_serve_command(&config, host, port, cors).await?;
        }
        Commands::Ingest {
            dir,
            extensions,
            reset,
        } => {
            handle_ingest_command(&config, dir, extensions, reset).await?;
        }
        Commands::Ask {
            question,
            stream,
            top_k,
            sources,
        } => {
            handle_ask_command(&config, question, stream, top_k, sources).await?;
        }
        Commands::Chat { history } => {
            handle_chat_command(&config, history).await?;
        }
        Commands::Stats => {
            handle_stats_command(&config).await?;
        }
        Commands::Reset { force } => {
            handle_reset_command(&config, force).await?;
        }
        Commands::Config => {
            handle_config_command(&config);
        }
    }

    Ok(())
}
