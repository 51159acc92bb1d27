//! filesync CLI - Command-line interface for filesync
//!
//! Provides commands for:
//! - Synchronizing one file, or every file the cache knows, with Google Drive
//! - Authentication with Google
//! - Viewing and editing configuration
//! - Archiving a directory into a Drive folder

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    archive::ArchiveCommand, auth::AuthCommand, completions::CompletionsCommand,
    config::ConfigCommand, exit_code, sync::SyncCommand, CliContext,
};
use filesync_core::config::Config;
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "filesync",
    version,
    about = "Keeps local files in sync with versioned copies on Google Drive"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Without a subcommand: sync one path, or every known path
    #[command(flatten)]
    sync: SyncCommand,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Authentication commands
    #[command(subcommand)]
    Auth(AuthCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Upload a directory's files into a Drive folder and remove them locally
    Archive(ArchiveCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set
    fn log_level<'a>(&self, config: &'a Config) -> &'a str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => config.logging.level.as_str(),
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}

fn init_tracing(filter: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);
    init_tracing(cli.log_level(&config), cli.json_logs);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let ctx = CliContext {
        format,
        quiet: cli.quiet,
        config_path,
        config,
    };

    let result = match &cli.command {
        None => cli.sync.execute(&ctx).await,
        Some(Commands::Auth(cmd)) => cmd.execute(&ctx).await,
        Some(Commands::Config(cmd)) => cmd.execute(&ctx).await,
        Some(Commands::Archive(cmd)) => cmd.execute(&ctx).await,
        Some(Commands::Completions(cmd)) => cmd.execute(&ctx).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            get_formatter(cli.json).error(&format!("{:#}", e));
            ExitCode::from(exit_code(&e))
        }
    }
}
