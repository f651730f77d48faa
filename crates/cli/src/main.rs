mod backend;
mod config_commands;
mod contact_commands;
mod group_commands;
mod identity_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "wagroups",
    version,
    about = "WhatsApp group tooling: contact directory and participant management"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (defaults to ./wagroups.toml, then ~/.config/wagroups/).
    #[arg(long, global = true, env = "WAGROUPS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize raw identifiers to their canonical form.
    Normalize {
        /// Raw phone numbers or chat identities.
        #[arg(required = true)]
        raw: Vec<String>,
    },
    /// Contact directory management.
    Contacts {
        #[command(subcommand)]
        action: contact_commands::ContactAction,
    },
    /// Group participant management.
    Participants {
        #[command(subcommand)]
        action: group_commands::ParticipantAction,
    },
    /// Group conversations.
    Groups {
        #[command(subcommand)]
        action: group_commands::GroupAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Logs go to stderr so stdout carries only command output.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Pretty-print a command result on stdout.
pub(crate) fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "wagroups starting");

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Normalize { raw } => identity_commands::handle_normalize(&raw),
        Commands::Contacts { action } => {
            contact_commands::handle_contacts(action, config_path).await
        },
        Commands::Participants { action } => {
            group_commands::handle_participants(action, config_path).await
        },
        Commands::Groups { action } => group_commands::handle_groups(action, config_path).await,
        Commands::Config { action } => config_commands::handle_config(action, config_path),
    }
}
