use {
    serde::{Deserialize, Serialize},
    serde_json::{Value, json},
    wagroups_store::MapItem,
};

/// A directory entry as handed to callers.
///
/// `id` is the canonical key; it is repeated as `data.identifier` for
/// display convenience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub data: ContactData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactData {
    pub name: Option<String>,
    pub identifier: String,
    pub team: Option<String>,
}

/// Result of an add-or-update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    pub contact: Contact,
    /// `true` when the key was new, `false` when an existing entry was updated.
    pub created: bool,
}

impl Contact {
    pub fn key(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    pub fn team(&self) -> Option<&str> {
        self.data.team.as_deref()
    }
}

impl From<MapItem> for Contact {
    fn from(item: MapItem) -> Self {
        let field = |name: &str| {
            item.data
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            data: ContactData {
                name: field("name"),
                identifier: item.key.clone(),
                team: field("team"),
            },
            id: item.key,
        }
    }
}

/// Payload stored under each directory key.
pub(crate) fn stored_payload(name: &str, team: Option<&str>) -> Value {
    json!({ "name": name, "team": team })
}
