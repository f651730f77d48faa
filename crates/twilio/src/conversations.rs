//! Conversations API as the group participant backend.

use {
    async_trait::async_trait,
    serde::Deserialize,
    serde_json::Value,
    tracing::{debug, warn},
    wagroups_store::{
        Conversation, ConversationState, ConversationStore, Participant, ParticipantAttributes,
        ParticipantBinding, Result,
    },
};

use crate::client::{TwilioClient, segment};

/// Participant lists are fetched as a single page this long.
const PARTICIPANT_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Default, Deserialize)]
struct WireBinding {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    proxy_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireParticipant {
    sid: String,
    #[serde(default)]
    identity: Option<String>,
    #[serde(default)]
    messaging_binding: Option<WireBinding>,
    /// JSON document encoded as a string.
    #[serde(default)]
    attributes: Option<String>,
}

impl From<WireParticipant> for Participant {
    fn from(wire: WireParticipant) -> Self {
        let binding = wire.messaging_binding.unwrap_or_default();
        let attributes = wire
            .attributes
            .as_deref()
            .and_then(|raw| serde_json::from_str::<ParticipantAttributes>(raw).ok())
            .unwrap_or_default();
        Self {
            sid: wire.sid,
            identity: wire.identity,
            address: binding.address,
            proxy_address: binding.proxy_address,
            attributes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ParticipantPage {
    #[serde(default)]
    participants: Vec<WireParticipant>,
}

#[derive(Debug, Deserialize)]
struct WireConversation {
    sid: String,
    #[serde(default)]
    friendly_name: Option<String>,
    #[serde(default)]
    attributes: Option<String>,
    #[serde(default)]
    state: Option<ConversationState>,
    #[serde(default)]
    date_created: Option<String>,
    #[serde(default)]
    date_updated: Option<String>,
}

impl From<WireConversation> for Conversation {
    fn from(wire: WireConversation) -> Self {
        let attributes = match wire.attributes.as_deref() {
            Some(raw) if !raw.trim().is_empty() => match serde_json::from_str(raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!(sid = %wire.sid, error = %e, "conversation attributes are not JSON");
                    Value::Object(Default::default())
                },
            },
            _ => Value::Object(Default::default()),
        };
        Self {
            sid: wire.sid,
            friendly_name: wire.friendly_name,
            attributes,
            state: wire.state,
            date_created: wire.date_created,
            date_updated: wire.date_updated,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConversationPage {
    #[serde(default)]
    conversations: Vec<WireConversation>,
}

/// [`ConversationStore`] over the Conversations API, optionally scoped to
/// one conversation service.
#[derive(Debug, Clone)]
pub struct TwilioConversations {
    client: TwilioClient,
    service_sid: Option<String>,
}

impl TwilioConversations {
    pub fn new(client: TwilioClient, service_sid: Option<String>) -> Self {
        Self {
            client,
            service_sid: service_sid.filter(|s| !s.trim().is_empty()),
        }
    }

    fn url(&self, path: &str) -> String {
        match &self.service_sid {
            Some(svc) => self
                .client
                .conversations_url(&format!("/Services/{}{path}", segment(svc))),
            None => self.client.conversations_url(path),
        }
    }

    fn conversation_url(&self, group_id: &str) -> String {
        self.url(&format!("/Conversations/{}", segment(group_id)))
    }

    fn participants_url(&self, group_id: &str) -> String {
        format!("{}/Participants", self.conversation_url(group_id))
    }

    fn participant_url(&self, group_id: &str, participant_id: &str) -> String {
        format!(
            "{}/{}",
            self.participants_url(group_id),
            segment(participant_id)
        )
    }
}

#[async_trait]
impl ConversationStore for TwilioConversations {
    async fn create_participant(
        &self,
        group_id: &str,
        binding: &ParticipantBinding,
        attributes: &ParticipantAttributes,
    ) -> Result<Participant> {
        let attributes = serde_json::to_string(attributes)?;
        let mut form: Vec<(&str, &str)> = match binding {
            ParticipantBinding::Chat { identity } => vec![("Identity", identity.as_str())],
            ParticipantBinding::Messaging {
                address,
                proxy_address,
            } => vec![
                ("MessagingBinding.Address", address.as_str()),
                ("MessagingBinding.ProxyAddress", proxy_address.as_str()),
            ],
        };
        form.push(("Attributes", attributes.as_str()));

        let wire: WireParticipant = self
            .client
            .post_form(
                &self.participants_url(group_id),
                &form,
                &format!("participant {}", binding.target()),
            )
            .await?;
        debug!(group = group_id, participant = %wire.sid, "participant created");
        Ok(wire.into())
    }

    async fn list_participants(&self, group_id: &str) -> Result<Vec<Participant>> {
        let url = format!(
            "{}?PageSize={PARTICIPANT_PAGE_SIZE}",
            self.participants_url(group_id)
        );
        let page: ParticipantPage = self
            .client
            .get_json(&url, &format!("participants of {group_id}"))
            .await?;
        Ok(page.participants.into_iter().map(Participant::from).collect())
    }

    async fn fetch_participant(
        &self,
        group_id: &str,
        participant_id: &str,
    ) -> Result<Participant> {
        let wire: WireParticipant = self
            .client
            .get_json(
                &self.participant_url(group_id, participant_id),
                &format!("participant {participant_id}"),
            )
            .await?;
        Ok(wire.into())
    }

    async fn remove_participant(&self, group_id: &str, participant_id: &str) -> Result<()> {
        self.client
            .delete(
                &self.participant_url(group_id, participant_id),
                &format!("participant {participant_id}"),
            )
            .await
    }

    async fn list_conversations(&self, limit: u32) -> Result<Vec<Conversation>> {
        let url = format!("{}?PageSize={limit}", self.url("/Conversations"));
        let page: ConversationPage = self.client.get_json(&url, "conversations").await?;
        Ok(page
            .conversations
            .into_iter()
            .map(Conversation::from)
            .collect())
    }

    async fn fetch_conversation(&self, group_id: &str) -> Result<Conversation> {
        let wire: WireConversation = self
            .client
            .get_json(
                &self.conversation_url(group_id),
                &format!("conversation {group_id}"),
            )
            .await?;
        Ok(wire.into())
    }

    async fn create_conversation(
        &self,
        friendly_name: &str,
        attributes: &Value,
    ) -> Result<Conversation> {
        let attributes = serde_json::to_string(attributes)?;
        let wire: WireConversation = self
            .client
            .post_form(
                &self.url("/Conversations"),
                &[
                    ("FriendlyName", friendly_name),
                    ("Attributes", attributes.as_str()),
                ],
                &format!("conversation {friendly_name}"),
            )
            .await?;
        debug!(conversation = %wire.sid, "conversation created");
        Ok(wire.into())
    }

    async fn update_conversation(
        &self,
        group_id: &str,
        friendly_name: &str,
        attributes: &Value,
    ) -> Result<Conversation> {
        let attributes = serde_json::to_string(attributes)?;
        let wire: WireConversation = self
            .client
            .post_form(
                &self.conversation_url(group_id),
                &[
                    ("FriendlyName", friendly_name),
                    ("Attributes", attributes.as_str()),
                ],
                &format!("conversation {group_id}"),
            )
            .await?;
        Ok(wire.into())
    }

    async fn remove_conversation(&self, group_id: &str) -> Result<()> {
        self.client
            .delete(
                &self.conversation_url(group_id),
                &format!("conversation {group_id}"),
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::client::Endpoints,
        mockito::Matcher,
        secrecy::Secret,
        serde_json::json,
        std::time::Duration,
        wagroups_store::ErrorKind,
    };

    fn store(server: &mockito::Server, service: Option<&str>) -> TwilioConversations {
        let client = TwilioClient::with_options(
            "AC123",
            Secret::new("token".to_string()),
            Endpoints::single(&server.url()),
            Duration::from_secs(5),
        )
        .unwrap();
        TwilioConversations::new(client, service.map(str::to_string))
    }

    #[tokio::test]
    async fn messaging_participant_sends_binding_and_attributes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/Conversations/CH1/Participants")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "MessagingBinding.Address".into(),
                    "whatsapp:+15551234567".into(),
                ),
                Matcher::UrlEncoded(
                    "MessagingBinding.ProxyAddress".into(),
                    "whatsapp:+15550000000".into(),
                ),
                Matcher::UrlEncoded("Attributes".into(), r#"{"friendlyName":"Ada"}"#.into()),
            ]))
            .with_status(201)
            .with_body(
                json!({
                    "sid": "MB1",
                    "identity": null,
                    "messaging_binding": {
                        "type": "whatsapp",
                        "address": "whatsapp:+15551234567",
                        "proxy_address": "whatsapp:+15550000000"
                    },
                    "attributes": "{\"friendlyName\":\"Ada\"}"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let participant = store(&server, None)
            .create_participant(
                "CH1",
                &ParticipantBinding::Messaging {
                    address: "whatsapp:+15551234567".into(),
                    proxy_address: "whatsapp:+15550000000".into(),
                },
                &ParticipantAttributes {
                    friendly_name: Some("Ada".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(participant.sid, "MB1");
        assert_eq!(participant.address.as_deref(), Some("whatsapp:+15551234567"));
        assert_eq!(participant.attributes.friendly_name.as_deref(), Some("Ada"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn chat_participant_uses_service_scope_and_identity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/Services/IS9/Conversations/CH1/Participants")
            .match_body(Matcher::UrlEncoded("Identity".into(), "ada".into()))
            .with_status(201)
            .with_body(r#"{"sid":"MB2","identity":"ada","messaging_binding":null,"attributes":"{}"}"#)
            .create_async()
            .await;

        let participant = store(&server, Some("IS9"))
            .create_participant(
                "CH1",
                &ParticipantBinding::Chat {
                    identity: "ada".into(),
                },
                &ParticipantAttributes::default(),
            )
            .await
            .unwrap();
        assert_eq!(participant.identifier(), Some("ada"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn invalid_binding_is_rejected_with_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/Conversations/CH1/Participants")
            .with_status(400)
            .with_body(r#"{"code":50407,"message":"Invalid messaging binding address","status":400}"#)
            .create_async()
            .await;

        let err = store(&server, None)
            .create_participant(
                "CH1",
                &ParticipantBinding::Messaging {
                    address: "whatsapp:+10000000000".into(),
                    proxy_address: "whatsapp:+15550000000".into(),
                },
                &ParticipantAttributes::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert!(err.to_string().contains("50407"));
    }

    #[tokio::test]
    async fn listing_tolerates_malformed_attributes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/Conversations/CH1/Participants")
            .match_query(Matcher::UrlEncoded("PageSize".into(), "1000".into()))
            .with_status(200)
            .with_body(
                json!({
                    "participants": [
                        {"sid": "MB1", "identity": "ada", "attributes": "not json"},
                        {"sid": "MB2", "messaging_binding": {"address": "whatsapp:+15551234567"}}
                    ],
                    "meta": {}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let participants = store(&server, None).list_participants("CH1").await.unwrap();
        assert_eq!(participants.len(), 2);
        assert_eq!(participants[0].attributes, ParticipantAttributes::default());
        assert_eq!(participants[1].identifier(), Some("whatsapp:+15551234567"));
    }

    #[tokio::test]
    async fn remove_missing_participant_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/Conversations/CH1/Participants/MB404")
            .with_status(404)
            .with_body(r#"{"code":20404,"message":"not found","status":404}"#)
            .create_async()
            .await;

        let err = store(&server, None)
            .remove_participant("CH1", "MB404")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn conversations_parse_attributes_and_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/Conversations")
            .match_query(Matcher::UrlEncoded("PageSize".into(), "50".into()))
            .with_status(200)
            .with_body(
                json!({
                    "conversations": [
                        {
                            "sid": "CH2",
                            "friendly_name": "Ops",
                            "attributes": "{\"team\":\"ops\"}",
                            "state": "active",
                            "date_created": "2024-05-02T10:00:00Z",
                            "date_updated": "2024-05-02T10:00:00Z"
                        },
                        {"sid": "CH1", "attributes": "", "state": "closed"},
                        {"sid": "CH0", "attributes": "{oops", "state": "archived"}
                    ],
                    "meta": {}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let groups = store(&server, None).list_conversations(50).await.unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].attributes["team"], "ops");
        assert_eq!(groups[0].state, Some(ConversationState::Active));
        assert_eq!(groups[1].attributes, json!({}));
        assert_eq!(groups[1].state, Some(ConversationState::Closed));
        assert_eq!(groups[2].attributes, json!({}));
        assert_eq!(groups[2].state, Some(ConversationState::Unknown));
    }

    #[tokio::test]
    async fn create_conversation_sends_name_and_attributes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/Services/IS9/Conversations")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("FriendlyName".into(), "Ops".into()),
                Matcher::UrlEncoded(
                    "Attributes".into(),
                    r#"{"createdBy":"wagroups","description":"on call"}"#.into(),
                ),
            ]))
            .with_status(201)
            .with_body(
                json!({
                    "sid": "CH7",
                    "friendly_name": "Ops",
                    "attributes": "{\"createdBy\":\"wagroups\",\"description\":\"on call\"}",
                    "state": "active"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let conversation = store(&server, Some("IS9"))
            .create_conversation(
                "Ops",
                &json!({"description": "on call", "createdBy": "wagroups"}),
            )
            .await
            .unwrap();
        assert_eq!(conversation.sid, "CH7");
        assert_eq!(conversation.attributes["description"], "on call");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_and_remove_address_the_conversation() {
        let mut server = mockito::Server::new_async().await;
        let update = server
            .mock("POST", "/Conversations/CH7")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("FriendlyName".into(), "Ops 2".into()),
                Matcher::UrlEncoded("Attributes".into(), r#"{"description":"rota"}"#.into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"sid":"CH7","friendly_name":"Ops 2","attributes":"{\"description\":\"rota\"}"}"#,
            )
            .create_async()
            .await;
        let remove = server
            .mock("DELETE", "/Conversations/CH7")
            .with_status(204)
            .create_async()
            .await;

        let conversations = store(&server, None);
        let updated = conversations
            .update_conversation("CH7", "Ops 2", &json!({"description": "rota"}))
            .await
            .unwrap();
        assert_eq!(updated.friendly_name.as_deref(), Some("Ops 2"));
        conversations.remove_conversation("CH7").await.unwrap();

        update.assert_async().await;
        remove.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_conversation_parses_attributes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/Services/IS9/Conversations/CH7")
            .with_status(200)
            .with_body(
                r#"{"sid":"CH7","friendly_name":"Ops","attributes":"{\"groupTwilioPhoneNumber\":\"whatsapp:+15550000000\"}","state":"inactive"}"#,
            )
            .create_async()
            .await;

        let conversation = store(&server, Some("IS9"))
            .fetch_conversation("CH7")
            .await
            .unwrap();
        assert_eq!(
            conversation.attributes["groupTwilioPhoneNumber"],
            "whatsapp:+15550000000"
        );
        assert_eq!(conversation.state, Some(ConversationState::Inactive));
    }

    #[tokio::test]
    async fn removing_missing_conversation_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/Conversations/CH404")
            .with_status(404)
            .with_body(r#"{"code":20404,"message":"not found","status":404}"#)
            .create_async()
            .await;

        let err = store(&server, None)
            .remove_conversation("CH404")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
