pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use slashbot_core::config::LoadOptions;

#[derive(Debug, Parser)]
#[command(
    name = "slashbot",
    about = "Slashbot operator CLI",
    long_about = "Inspect configuration, check readiness, and sign test payloads for the Slack slash-command webhook.",
    after_help = "Examples:\n  slashbot doctor --json\n  slashbot config\n  slashbot sign --body 'text=echo+hi&response_url=http%3A%2F%2Flocalhost%3A9000'"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to the TOML config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and signing secret readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Compute the Slack signature headers for a form-encoded request body")]
    Sign {
        #[arg(long, help = "Exact request body to sign")]
        body: String,
        #[arg(long, help = "Unix timestamp to sign with (defaults to now)")]
        timestamp: Option<i64>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    };

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
        Command::Doctor { json } => commands::doctor::run(options, json),
        Command::Sign { body, timestamp } => commands::sign::run(options, &body, timestamp),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
