//! CLI commands for group conversations and their participants.

use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    clap::Subcommand,
    serde_json::json,
    wagroups_groups::{
        AuthorLabeler, MessageAddedEvent, ParticipantReconciler, ParticipantRequest,
        ReconcileOptions, delete_group, list_groups, update_group,
    },
};

use crate::{backend::Backend, print_json};

#[derive(Subcommand)]
pub enum ParticipantAction {
    /// Add participants to a group; reports added, skipped and failed entries.
    Add {
        /// Group conversation id.
        #[arg(long)]
        group: String,
        /// The group's own WhatsApp address, used as the messaging proxy.
        #[arg(long)]
        proxy: String,
        /// Re-add identifiers that are already members.
        #[arg(long)]
        allow_existing: bool,
        /// Participants as `identifier` or `identifier=Display Name`.
        #[arg(required = true, value_parser = parse_participant)]
        participants: Vec<ParticipantRequest>,
    },
    /// Remove one participant by its participant id.
    Remove {
        #[arg(long)]
        group: String,
        #[arg(long)]
        participant: String,
    },
    /// List the current members of a group.
    List {
        #[arg(long)]
        group: String,
    },
}

#[derive(Subcommand)]
pub enum GroupAction {
    /// List active and inactive groups, newest first.
    List {
        /// Maximum number of groups to fetch.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Open a group conversation and add its first participants.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// The group's own WhatsApp address, used as the messaging proxy.
        #[arg(long)]
        proxy: String,
        /// Participants as `identifier` or `identifier=Display Name`.
        #[arg(required = true, value_parser = parse_participant)]
        participants: Vec<ParticipantRequest>,
    },
    /// Rename a group and optionally replace its description.
    Update {
        #[arg(long)]
        group: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a group conversation.
    Delete {
        #[arg(long)]
        group: String,
    },
    /// Prefix a message-added event body with its author's display name.
    Label {
        /// JSON event file; read from stdin when omitted.
        #[arg(long)]
        event: Option<PathBuf>,
    },
}

/// `identifier[=name]`; the name part is trimmed and dropped when blank.
fn parse_participant(raw: &str) -> Result<ParticipantRequest, String> {
    let (identifier, name) = match raw.split_once('=') {
        Some((identifier, name)) => (identifier.trim(), Some(name.trim())),
        None => (raw.trim(), None),
    };
    if identifier.is_empty() {
        return Err("participant identifier is empty".into());
    }
    let request = ParticipantRequest::new(identifier);
    Ok(match name.filter(|n| !n.is_empty()) {
        Some(name) => request.with_name(name),
        None => request,
    })
}

pub async fn handle_participants(
    action: ParticipantAction,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let backend = Backend::load(config_path)?;

    match action {
        ParticipantAction::Add {
            group,
            proxy,
            allow_existing,
            participants,
        } => {
            let options = ReconcileOptions {
                skip_existing: backend.config.groups.skip_existing && !allow_existing,
            };
            let reconciler = ParticipantReconciler::with_options(backend.conversations(), options);
            let report = reconciler
                .add_participants(&group, &proxy, &participants)
                .await?;
            print_json(&report)
        },
        ParticipantAction::Remove { group, participant } => {
            ParticipantReconciler::new(backend.conversations())
                .remove_participant(&group, &participant)
                .await?;
            print_json(&json!({ "removed": participant, "group": group }))
        },
        ParticipantAction::List { group } => {
            let participants = ParticipantReconciler::new(backend.conversations())
                .list_participants(&group)
                .await?;
            print_json(&participants)
        },
    }
}

pub async fn handle_groups(action: GroupAction, config_path: Option<&Path>) -> anyhow::Result<()> {
    let backend = Backend::load(config_path)?;

    match action {
        GroupAction::List { limit } => {
            let limit = limit.unwrap_or(backend.config.groups.list_limit);
            let groups = list_groups(backend.conversations().as_ref(), limit).await?;
            print_json(&groups)
        },
        GroupAction::Create {
            name,
            description,
            proxy,
            participants,
        } => {
            let options = ReconcileOptions {
                skip_existing: backend.config.groups.skip_existing,
            };
            let created = ParticipantReconciler::with_options(backend.conversations(), options)
                .create_group(&name, description.as_deref(), &proxy, &participants)
                .await?;
            print_json(&created)
        },
        GroupAction::Update {
            group,
            name,
            description,
        } => {
            let conversations = backend.conversations();
            let updated =
                update_group(conversations.as_ref(), &group, &name, description.as_deref())
                    .await?;
            print_json(&updated)
        },
        GroupAction::Delete { group } => {
            delete_group(backend.conversations().as_ref(), &group).await?;
            print_json(&json!({ "deleted": group }))
        },
        GroupAction::Label { event } => {
            let raw = match event {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?,
            };
            let event: MessageAddedEvent =
                serde_json::from_str(&raw).context("event is not valid JSON")?;

            let labeler = AuthorLabeler::new(backend.optional_directory(), backend.conversations());
            let body = labeler.label(&event).await;
            print_json(&json!({
                "changed": body.is_some(),
                "body": body.or(event.body),
            }))
        },
    }
}
