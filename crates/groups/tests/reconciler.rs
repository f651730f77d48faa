#![allow(clippy::unwrap_used, clippy::expect_used)]
use std::sync::Arc;

use {
    wagroups_groups::{
        GROUP_CREATOR, ParticipantReconciler, ParticipantRequest, ReconcileOptions, SkipReason,
    },
    wagroups_identity::Rejection,
    wagroups_store::{
        ConversationState, ConversationStore, ErrorKind, ParticipantAttributes,
        ParticipantBinding, memory::MemoryConversationStore,
    },
};

const GROUP: &str = "CH00000000000000000000000000000001";
const PROXY: &str = "+1 555 999 9999";

async fn setup() -> (Arc<MemoryConversationStore>, ParticipantReconciler) {
    let store = Arc::new(MemoryConversationStore::new());
    store.add_group(GROUP, Some(ConversationState::Active)).await;
    let reconciler = ParticipantReconciler::new(store.clone());
    (store, reconciler)
}

fn requests(ids: &[&str]) -> Vec<ParticipantRequest> {
    ids.iter().map(|id| ParticipantRequest::new(*id)).collect()
}

#[tokio::test]
async fn missing_malformed_and_valid_are_partitioned() {
    let (_, reconciler) = setup().await;
    let report = reconciler
        .add_participants(GROUP, PROXY, &requests(&["", "+1bad", "+15551234567"]))
        .await
        .unwrap();

    assert_eq!(report.added, vec!["whatsapp:+15551234567"]);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].reason, SkipReason::MissingIdentifier);
    assert_eq!(
        report.skipped[1].reason,
        SkipReason::Rejected(Rejection::Malformed)
    );
    assert_eq!(report.skipped[1].identifier, "+1bad");
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn store_failure_mid_batch_does_not_stop_the_rest() {
    let (store, reconciler) = setup().await;
    store.fail_target("whatsapp:+15550000003").await;

    let report = reconciler
        .add_participants(
            GROUP,
            PROXY,
            &requests(&[
                "+15550000001",
                "+15550000002",
                "+1 555 000 0003",
                "+15550000004",
                "client:agent-5",
            ]),
        )
        .await
        .unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].identifier, "+1 555 000 0003");
    assert_eq!(report.errors[0].kind, ErrorKind::Rejected);
    assert_eq!(
        report.added,
        vec![
            "whatsapp:+15550000001",
            "whatsapp:+15550000002",
            "whatsapp:+15550000004",
            "client:agent-5",
        ]
    );
    assert!(report.skipped.is_empty());
    assert_eq!(report.total(), 5);
    // Every participant was attempted, in input order.
    assert_eq!(
        store.attempts().await,
        vec![
            "whatsapp:+15550000001",
            "whatsapp:+15550000002",
            "whatsapp:+15550000003",
            "whatsapp:+15550000004",
            "agent-5",
        ]
    );
}

#[tokio::test]
async fn refused_chat_identity_is_recorded_with_store_detail() {
    let (store, reconciler) = setup().await;
    store.fail_target("agent-5").await;

    let report = reconciler
        .add_participants(
            GROUP,
            PROXY,
            &requests(&["+15550000001", "client:agent-5", "+15550000002", "client:agent-6"]),
        )
        .await
        .unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].identifier, "client:agent-5");
    assert_eq!(report.errors[0].kind, ErrorKind::Rejected);
    assert!(
        report.errors[0]
            .detail
            .contains("invalid binding target agent-5")
    );
    assert_eq!(
        report.added,
        vec![
            "whatsapp:+15550000001",
            "whatsapp:+15550000002",
            "client:agent-6",
        ]
    );
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn report_keeps_identifiers_as_supplied() {
    let (store, reconciler) = setup().await;
    store.fail_target("whatsapp:+15550000003").await;

    let report = reconciler
        .add_participants(
            GROUP,
            PROXY,
            &requests(&["  ", " +1bad ", " +15550000003\t", " +15550000004 ", "+15550000004"]),
        )
        .await
        .unwrap();

    let skipped: Vec<&str> = report
        .skipped
        .iter()
        .map(|s| s.identifier.as_str())
        .collect();
    assert_eq!(skipped, vec!["  ", " +1bad ", "+15550000004"]);
    assert_eq!(report.errors[0].identifier, " +15550000003\t");
    assert_eq!(report.added, vec!["whatsapp:+15550000004"]);
}

#[tokio::test]
async fn messaging_binding_uses_normalized_proxy() {
    let (store, reconciler) = setup().await;
    reconciler
        .add_participants(
            GROUP,
            PROXY,
            &[ParticipantRequest::new("0044 7911 123456").with_name("Ana")],
        )
        .await
        .unwrap();

    let members = store.list_participants(GROUP).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].address.as_deref(), Some("whatsapp:+447911123456"));
    assert_eq!(
        members[0].proxy_address.as_deref(),
        Some("whatsapp:+15559999999")
    );
    assert_eq!(members[0].attributes.friendly_name.as_deref(), Some("Ana"));
}

#[tokio::test]
async fn existing_members_are_skipped() {
    let (store, reconciler) = setup().await;
    store
        .create_participant(
            GROUP,
            &ParticipantBinding::Messaging {
                address: "whatsapp:+15551234567".into(),
                proxy_address: "whatsapp:+15559999999".into(),
            },
            &ParticipantAttributes::default(),
        )
        .await
        .unwrap();
    store
        .create_participant(
            GROUP,
            &ParticipantBinding::Chat {
                identity: "agent-7".into(),
            },
            &ParticipantAttributes::default(),
        )
        .await
        .unwrap();

    let report = reconciler
        .add_participants(
            GROUP,
            PROXY,
            &requests(&["1 (555) 123-4567", "client:agent-7", "client:Agent-7"]),
        )
        .await
        .unwrap();

    assert_eq!(report.skipped.len(), 2);
    assert!(
        report
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::AlreadyParticipant)
    );
    // Comparison is case-sensitive.
    assert_eq!(report.added, vec!["client:Agent-7"]);
}

#[tokio::test]
async fn repeats_within_one_batch_are_skipped() {
    let (store, reconciler) = setup().await;
    let report = reconciler
        .add_participants(
            GROUP,
            PROXY,
            &requests(&["+15551234567", "whatsapp:+15551234567"]),
        )
        .await
        .unwrap();
    assert_eq!(report.added.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::AlreadyParticipant);
    assert_eq!(store.attempts().await.len(), 1);
}

#[tokio::test]
async fn duplicate_detection_can_be_disabled() {
    let store = Arc::new(MemoryConversationStore::new());
    store.add_group(GROUP, None).await;
    let reconciler = ParticipantReconciler::with_options(
        store.clone(),
        ReconcileOptions {
            skip_existing: false,
        },
    );
    let report = reconciler
        .add_participants(
            GROUP,
            PROXY,
            &requests(&["+15551234567", "whatsapp:+15551234567"]),
        )
        .await
        .unwrap();
    // The store itself refuses the second binding.
    assert_eq!(report.added.len(), 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn unsupported_prefix_is_skipped_with_reason() {
    let (_, reconciler) = setup().await;
    let report = reconciler
        .add_participants(GROUP, PROXY, &requests(&["sms:+15551234567"]))
        .await
        .unwrap();
    assert_eq!(report.skipped[0].reason.code(), "unsupported-prefix");
}

#[tokio::test]
async fn request_level_validation() {
    let (_, reconciler) = setup().await;
    let one = requests(&["+15551234567"]);

    let err = reconciler.add_participants("", PROXY, &one).await.unwrap_err();
    assert_eq!(err.kind(), "validation");

    let err = reconciler
        .add_participants(GROUP, "client:bot", &one)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");

    let err = reconciler
        .add_participants(GROUP, "12", &one)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");

    let err = reconciler.add_participants(GROUP, PROXY, &[]).await.unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn unreadable_member_list_aborts_before_any_attempt() {
    let (store, reconciler) = setup().await;
    store.set_unavailable(true);
    let err = reconciler
        .add_participants(GROUP, PROXY, &requests(&["+15551234567"]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "store");
    assert!(store.attempts().await.is_empty());
}

#[tokio::test]
async fn remove_participant_round_trip() {
    let (_, reconciler) = setup().await;
    reconciler
        .add_participants(GROUP, PROXY, &requests(&["client:agent-7"]))
        .await
        .unwrap();
    let members = reconciler.list_participants(GROUP).await.unwrap();
    assert_eq!(members.len(), 1);

    reconciler
        .remove_participant(GROUP, &members[0].sid)
        .await
        .unwrap();
    assert!(reconciler.list_participants(GROUP).await.unwrap().is_empty());

    let err = reconciler
        .remove_participant(GROUP, &members[0].sid)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "store");
    assert_eq!(
        reconciler.remove_participant(GROUP, " ").await.unwrap_err().kind(),
        "validation"
    );
}

#[tokio::test]
async fn create_group_opens_conversation_then_adds_participants() {
    let store = Arc::new(MemoryConversationStore::new());
    store.fail_target("whatsapp:+15550000002").await;
    let reconciler = ParticipantReconciler::new(store.clone());

    let created = reconciler
        .create_group(
            "Ops",
            Some("on call"),
            PROXY,
            &requests(&["+15550000001", "+15550000002", "", "client:agent-5"]),
        )
        .await
        .unwrap();

    let conversation = &created.conversation;
    assert_eq!(conversation.friendly_name.as_deref(), Some("Ops"));
    assert_eq!(conversation.attributes["description"], "on call");
    assert_eq!(
        conversation.attributes["groupTwilioPhoneNumber"],
        "whatsapp:+15559999999"
    );
    assert_eq!(conversation.attributes["createdBy"], GROUP_CREATOR);

    let report = &created.participants;
    assert_eq!(report.added, vec!["whatsapp:+15550000001", "client:agent-5"]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(
        store.list_participants(&conversation.sid).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn create_group_validates_before_creating() {
    let store = Arc::new(MemoryConversationStore::new());
    let reconciler = ParticipantReconciler::new(store.clone());
    let one = requests(&["+15551234567"]);

    for (name, proxy, participants) in [
        ("", PROXY, one.as_slice()),
        ("Ops", "client:bot", one.as_slice()),
        ("Ops", PROXY, &[][..]),
    ] {
        let err = reconciler
            .create_group(name, None, proxy, participants)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }
    assert!(store.list_conversations(10).await.unwrap().is_empty());
}
