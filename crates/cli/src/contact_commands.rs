//! CLI commands for the contact directory.

use std::path::Path;

use {anyhow::bail, clap::Subcommand, serde_json::json};

use crate::{backend::Backend, print_json};

#[derive(Subcommand)]
pub enum ContactAction {
    /// List contacts (first page, up to the configured page size).
    List,
    /// Show one contact by key or raw phone number.
    Get { key: String },
    /// Create a contact, or update the existing one with the same identifier.
    Upsert {
        #[arg(long)]
        name: String,
        /// Phone number in any common format, or `client:<id>`.
        #[arg(long)]
        identifier: String,
        #[arg(long)]
        team: Option<String>,
    },
    /// Delete a contact by key or raw phone number.
    Delete { key: String },
}

pub async fn handle_contacts(
    action: ContactAction,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let directory = Backend::load(config_path)?.directory()?;

    match action {
        ContactAction::List => print_json(&directory.list().await?),
        ContactAction::Get { key } => match directory.get(&key).await? {
            Some(contact) => print_json(&contact),
            None => bail!("contact not found: {key}"),
        },
        ContactAction::Upsert {
            name,
            identifier,
            team,
        } => {
            let outcome = directory
                .add_or_update(&name, &identifier, team.as_deref())
                .await?;
            print_json(&outcome)
        },
        ContactAction::Delete { key } => {
            directory.delete(&key).await?;
            print_json(&json!({ "deleted": key }))
        },
    }
}
