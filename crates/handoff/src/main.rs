// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handoff - send-once lead notifications for website chat.
//!
//! This is the binary entry point for the handoff service.

mod serve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use handoff_config::{ConfigError, HandoffConfig};

/// Handoff - send-once lead notifications for website chat.
#[derive(Parser, Debug)]
#[command(name = "handoff", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the trigger endpoint and the retry runner (default).
    Serve,
    /// Load and validate configuration, then exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<HandoffConfig, Vec<ConfigError>> {
    match path {
        Some(path) => handoff_config::load_and_validate_path(path),
        None => handoff_config::load_and_validate(),
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            handoff_config::render_errors(&errors);
            eprintln!("handoff: {} configuration error(s)", errors.len());
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::CheckConfig => {
            println!(
                "handoff: config ok (service.name={}, listen={}:{})",
                config.service.name, config.server.host, config.server.port
            );
            println!("  summarizer: {}", enabled(config.summarizer.enabled));
            println!("  mail:       {}", enabled(config.mail.enabled));
            println!("  inlining:   {}", enabled(config.attachments.inline_enabled));
            ExitCode::SUCCESS
        }
        Commands::Serve => match serve::run_serve(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("handoff: {e}");
                ExitCode::FAILURE
            }
        },
    }
}
