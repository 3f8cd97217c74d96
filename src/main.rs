//! portalsync - CLI entry point that dispatches to subcommands

use clap::Parser;
use console::style;
use portalsync::cli::{commands, Cli, Commands};
use portalsync::config::{Config, ConfigManager};
use portalsync::error::PortalResult;
use portalsync::Portal;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PortalResult<()> {
    let cli = Cli::parse();

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;
    init_tracing(cli.verbose, &config);
    debug!("Loaded config from {}", config_manager.path().display());

    // Config editing works without a state directory
    if let Commands::Config(args) = cli.command {
        return commands::config(args, &config_manager, &config).await;
    }

    let state_dir = ConfigManager::state_dir(cli.state_dir.as_deref());
    debug!("Using state directory {}", state_dir.display());
    let portal = Portal::from_state_dir(config, &state_dir).await?;
    let format = cli.format;

    match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::Login(args) => commands::login(args, &portal, format).await,
        Commands::Logout => commands::logout(&portal, format).await,
        Commands::Status => commands::status(&portal, format).await,
        Commands::Transcript(args) => commands::transcript(args, &portal, format).await,
        Commands::Years(args) => commands::years(args, &portal, format).await,
        Commands::Exams(args) => commands::exams(args, &portal, format).await,
        Commands::Notifications(args) => commands::notifications(args, &portal, format).await,
        Commands::Cms(args) => commands::cms(args, &portal, format).await,
        Commands::Sync => commands::sync(&portal, format).await,
        Commands::Cache(args) => commands::cache(args, &portal, format).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `general.verbose` counts as one `-v`
fn init_tracing(verbose: u8, config: &Config) {
    let level = verbose.max(u8::from(config.general.verbose));
    let filter = match level {
        0 => EnvFilter::new("portalsync=warn"),
        1 => EnvFilter::new("portalsync=info"),
        _ => EnvFilter::new("portalsync=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
