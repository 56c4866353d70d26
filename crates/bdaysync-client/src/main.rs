//! bdaysync CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use bdaysync_client::cli::{AuthAction, Cli, Command, ConfigAction};
use bdaysync_client::commands;
use bdaysync_client::config::ClientConfig;
use bdaysync_client::error::{ClientResult, exit_code};
use bdaysync_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = &result {
        eprintln!("error: {}", e);
    }
    ExitCode::from(exit_code(&result))
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = match &cli.config {
        Some(path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    };

    // Logging comes up before the config error is reported so it is not lost.
    let debug = cli.debug || config.as_ref().is_ok_and(|c| c.debug);
    if let Err(e) = init_tracing(TracingConfig::cli(debug)) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    let config = config?;

    match cli.command {
        Command::Sync => commands::sync::run(&config).await.map(|_| ()),
        Command::List => commands::list::run(&config).await,
        Command::Auth { action } => match action {
            AuthAction::Login { force } => commands::auth::login(&config, force).await,
            AuthAction::Status => commands::auth::status(&config),
            AuthAction::Logout => commands::auth::logout(&config),
        },
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
