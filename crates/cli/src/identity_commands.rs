use {
    serde::Serialize,
    wagroups_identity::{IdentityKind, normalize},
};

use crate::print_json;

#[derive(Debug, PartialEq, Eq, Serialize)]
struct Normalized<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<IdentityKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

fn normalize_one(raw: &str) -> Normalized<'_> {
    match normalize(raw) {
        Ok(id) => Normalized {
            input: raw,
            kind: Some(id.kind()),
            canonical: Some(id.into_string()),
            error: None,
        },
        Err(rejection) => Normalized {
            input: raw,
            canonical: None,
            kind: None,
            error: Some(rejection.code()),
        },
    }
}

/// Rejections are reported per input; the command itself still succeeds.
pub fn handle_normalize(raw: &[String]) -> anyhow::Result<()> {
    let rows: Vec<Normalized<'_>> = raw.iter().map(|r| normalize_one(r)).collect();
    print_json(&rows)
}
