// ABOUTME: Entry point for the regprune CLI application.
// ABOUTME: Parses arguments, resolves configuration, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use regprune::config::{self, Config, InitOptions};
use regprune::error::Result;
use regprune::logging::{self, LogOptions};
use regprune::output::{Output, OutputMode};
use std::env;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    let mut log = LogOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        log_file: None,
    };
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init {
            force,
            region,
            retention_days,
            tag_prefixes,
        } => {
            logging::init(&log)?;
            let options = InitOptions {
                region,
                retention_days,
                tag_prefixes,
            };
            config::init_config(&cwd, &options, force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Clean(args) => {
            let config =
                Config::locate(&cwd, cli.config.as_deref())?.with_overrides(args.overrides());
            log.log_file = config.log_file.clone();
            logging::init(&log)?;

            let settings = config.cleanup_settings()?;
            commands::clean(settings, output).await
        }
        Commands::Repos(args) => {
            let config =
                Config::locate(&cwd, cli.config.as_deref())?.with_overrides(args.overrides());
            logging::init(&log)?;

            commands::list_repositories(config.backend_settings()?, output).await
        }
    }
}
