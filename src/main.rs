use clap::Parser;
use colored::Colorize;
use tracing::debug;

use rapport::{
    app::{init_config, load_config, AppContext},
    cli::{apply_overrides, handle_command, Cli, Commands},
    utils::{init_logger, RapportError},
};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), RapportError> {
    if let Commands::Init = cli.command {
        let (path, created) = init_config().map_err(config_error)?;
        if created {
            println!("Created configuration at {}", path.display());
        } else {
            println!("Configuration already exists at {}", path.display());
        }
        return Ok(());
    }

    let config = load_config(cli.config.as_deref()).map_err(config_error)?;
    let config = apply_overrides(config, cli.api_url.as_deref());
    debug!("Using API at {}", config.api.base_url);

    let context = AppContext::from_config(config).map_err(config_error)?;

    // Every invocation starts from the persisted session
    context.controller().bootstrap().await;

    handle_command(&context, &cli.command).await
}

fn config_error(e: anyhow::Error) -> RapportError {
    RapportError::ConfigError(format!("{:#}", e))
}
