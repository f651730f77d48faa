use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use wagroups_config::{Severity, validate};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the effective configuration (secrets redacted).
    Show,
}

pub fn handle_config(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(config_path, verbose),
        ConfigAction::Show => show(config_path),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config_path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate(config_path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults and environment.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Info => CYAN,
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{}{RESET} {}", d.severity, d.message);
        } else {
            eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn show(config_path: Option<&Path>) -> Result<()> {
    let mut value = serde_json::to_value(wagroups_config::load(config_path)?)?;
    if let Some(token) = value.pointer_mut("/twilio/auth_token") {
        *token = serde_json::Value::String("[REDACTED]".into());
    }
    crate::print_json(&value)
}
