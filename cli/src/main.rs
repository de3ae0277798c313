mod commands;
mod config;
mod telemetry;
mod view;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use todo_core::{FileCredentialStore, TodoApp, TodoClient, UreqTransport};

use crate::commands::Command;
use crate::config::ClientConfig;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Todo list client for a token-authenticated REST backend")]
struct Cli {
    /// Backend base URL (overrides TODO_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Where the access token is kept (overrides TODO_CREDENTIAL_FILE).
    #[arg(long, global = true)]
    credential_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = ClientConfig::from_env().with_overrides(cli.api_url, cli.credential_file);
    telemetry::init(config.json_logs);
    tracing::debug!(api_url = %config.api_url, credential_file = %config.credential_file.display(), "starting");

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &ClientConfig) -> anyhow::Result<()> {
    if let Command::Delete { id, yes: false } = &command {
        if !confirm(&format!("Delete task {id}?"))? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let mut app = TodoApp::new(
        TodoClient::new(&config.api_url),
        UreqTransport::new(),
        FileCredentialStore::new(&config.credential_file),
    );
    commands::dispatch(&mut app, command, &mut io::stdout().lock())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
