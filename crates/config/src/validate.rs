//! Configuration validation.
//!
//! Flags syntax errors, unknown or misspelled keys, and settings that would
//! make every directory or group operation fail at runtime.

use std::path::{Path, PathBuf};

use {secrecy::ExposeSecret, serde_json::Value};

use crate::{
    env_subst::substitute_env,
    loader::{apply_env_overrides, find_config_file},
    schema::WaGroupsConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "credentials", "range"
    pub category: &'static str,
    /// Dotted path, e.g. "twilio.account_sid"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Known keys ──────────────────────────────────────────────────────────────

const SECTIONS: &[(&str, &[&str])] = &[
    ("twilio", &[
        "account_sid",
        "auth_token",
        "sync_service_sid",
        "conversations_service_sid",
        "sync_base_url",
        "conversations_base_url",
        "timeout_secs",
    ]),
    ("directory", &["map_name", "page_size"]),
    ("groups", &["skip_existing", "list_limit"]),
];

/// Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within two edits, if any.
fn suggest<'a>(needle: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .into_iter()
        .map(|c| (c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= 2)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

fn unknown_key(path: String, key: &str, candidates: &[&str]) -> Diagnostic {
    let message = match suggest(key, candidates.iter().copied()) {
        Some(hint) => format!("unknown field `{key}` (did you mean `{hint}`?)"),
        None => format!("unknown field `{key}`"),
    };
    Diagnostic::new(Severity::Warning, "unknown-field", path, message)
}

fn check_unknown_fields(root: &Value, diagnostics: &mut Vec<Diagnostic>) {
    let Some(root) = root.as_object() else {
        return;
    };
    let section_names: Vec<&str> = SECTIONS.iter().map(|(name, _)| *name).collect();

    for (key, value) in root {
        let Some((_, fields)) = SECTIONS.iter().find(|(name, _)| name == key) else {
            diagnostics.push(unknown_key(key.clone(), key, &section_names));
            continue;
        };
        let Some(table) = value.as_object() else {
            continue;
        };
        for field in table.keys() {
            if !fields.contains(&field.as_str()) {
                diagnostics.push(unknown_key(format!("{key}.{field}"), field, fields));
            }
        }
    }
}

// ── Semantic checks ─────────────────────────────────────────────────────────

fn blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Check a loaded (and env-overridden) config for settings that cannot work.
#[must_use]
pub fn validate_config(config: &WaGroupsConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let twilio = &config.twilio;

    if blank(twilio.account_sid.as_deref()) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "credentials",
            "twilio.account_sid",
            "account SID is not set (config or TWILIO_ACCOUNT_SID)",
        ));
    }
    let token = twilio.auth_token.as_ref().map(|t| t.expose_secret().as_str());
    if blank(token) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "credentials",
            "twilio.auth_token",
            "auth token is not set (config or TWILIO_AUTH_TOKEN)",
        ));
    }
    if blank(twilio.sync_service_sid.as_deref()) {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "credentials",
            "twilio.sync_service_sid",
            "sync service is not set; contact commands will fail",
        ));
    }
    if twilio.timeout_secs == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "range",
            "twilio.timeout_secs",
            "timeout must be at least one second",
        ));
    }
    if config.directory.map_name.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "range",
            "directory.map_name",
            "map name must not be empty",
        ));
    }
    for (path, value) in [
        ("directory.page_size", config.directory.page_size),
        ("groups.list_limit", config.groups.list_limit),
    ] {
        if !(1..=1000).contains(&value) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "range",
                path,
                format!("{value} is outside 1..=1000 and will be clamped"),
            ));
        }
    }

    diagnostics
}

/// Parse a document, flag unknown keys, and deserialize it.
fn check_document(raw: &str, format: &str) -> (Vec<Diagnostic>, Option<WaGroupsConfig>) {
    let mut diagnostics = Vec::new();

    let parsed: Result<Value, String> = match format {
        "toml" => toml::from_str::<toml::Table>(raw)
            .map_err(|e| e.to_string())
            .and_then(|v| serde_json::to_value(v).map_err(|e| e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str::<Value>(raw).map_err(|e| e.to_string()),
        "json" => serde_json::from_str::<Value>(raw).map_err(|e| e.to_string()),
        other => Err(format!("unsupported config format: .{other}")),
    };
    let value = match parsed {
        Ok(Value::Null) => Value::Object(Default::default()),
        Ok(value) => value,
        Err(e) => {
            diagnostics.push(Diagnostic::new(Severity::Error, "syntax", "", e));
            return (diagnostics, None);
        },
    };

    check_unknown_fields(&value, &mut diagnostics);

    match serde_json::from_value::<WaGroupsConfig>(value) {
        Ok(config) => (diagnostics, Some(config)),
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("type error: {e}"),
            ));
            (diagnostics, None)
        },
    }
}

/// Validate raw config text of the given format without touching the file
/// system or the environment.
#[must_use]
pub fn validate_str(raw: &str, format: &str) -> ValidationResult {
    let (mut diagnostics, config) = check_document(raw, format);
    if let Some(config) = config {
        diagnostics.extend(validate_config(&config));
    }
    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Validate a config file at the given path, or the discovered one when
/// `path` is `None`. Environment overrides are applied before the semantic
/// checks, so credentials supplied only through the environment pass.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path.map(Path::to_path_buf).or_else(find_config_file);

    let Some(actual_path) = config_path else {
        let mut diagnostics = vec![Diagnostic::new(
            Severity::Info,
            "syntax",
            "",
            "no config file found; using defaults",
        )];
        let config = apply_env_overrides(WaGroupsConfig::default());
        diagnostics.extend(validate_config(&config));
        return ValidationResult {
            diagnostics,
            config_path: None,
        };
    };

    let raw = match std::fs::read_to_string(&actual_path) {
        Ok(raw) => substitute_env(&raw),
        Err(e) => {
            return ValidationResult {
                diagnostics: vec![Diagnostic::new(
                    Severity::Error,
                    "syntax",
                    "",
                    format!("failed to read config file: {e}"),
                )],
                config_path: Some(actual_path),
            };
        },
    };
    let format = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("toml");

    let (mut diagnostics, config) = check_document(&raw, format);
    if let Some(config) = config {
        diagnostics.extend(validate_config(&apply_env_overrides(config)));
    }
    ValidationResult {
        diagnostics,
        config_path: Some(actual_path),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, secrecy::Secret};

    fn paths(result: &ValidationResult) -> Vec<&str> {
        result.diagnostics.iter().map(|d| d.path.as_str()).collect()
    }

    #[test]
    fn complete_config_is_clean() {
        let result = validate_str(
            r#"
            [twilio]
            account_sid = "AC123"
            auth_token = "token"
            sync_service_sid = "IS1"
            "#,
            "toml",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn missing_credentials_are_errors() {
        let result = validate_str("", "toml");
        assert!(result.has_errors());
        let found = paths(&result);
        assert!(found.contains(&"twilio.account_sid"));
        assert!(found.contains(&"twilio.auth_token"));
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn misspelled_keys_get_suggestions() {
        let result = validate_str(
            r#"
            [directry]
            map_name = "x"

            [groups]
            skip_exsting = false
            "#,
            "toml",
        );
        let messages: Vec<&str> = result
            .diagnostics
            .iter()
            .filter(|d| d.category == "unknown-field")
            .map(|d| d.message.as_str())
            .collect();
        assert!(messages.contains(&"unknown field `directry` (did you mean `directory`?)"));
        assert!(messages.contains(&"unknown field `skip_exsting` (did you mean `skip_existing`?)"));
    }

    #[test]
    fn syntax_errors_stop_validation() {
        let result = validate_str("[twilio", "toml");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].category, "syntax");

        let result = validate_str("{not json", "json");
        assert!(result.has_errors());
    }

    #[test]
    fn out_of_range_sizes_warn() {
        let mut config = WaGroupsConfig::default();
        config.twilio.account_sid = Some("AC1".into());
        config.twilio.auth_token = Some(Secret::new("t".into()));
        config.twilio.sync_service_sid = Some("IS1".into());
        config.directory.page_size = 0;
        config.groups.list_limit = 5000;
        config.directory.map_name = " ".into();

        let diagnostics = validate_config(&config);
        let warned: Vec<&str> = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(warned, vec!["directory.page_size", "groups.list_limit"]);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.path == "directory.map_name" && d.severity == Severity::Error)
        );
    }

    #[test]
    fn yaml_documents_are_checked_too() {
        let result = validate_str("twilio:\n  acount_sid: AC1\n", "yaml");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "twilio.acount_sid")
        );
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate(Some(&dir.path().join("missing.toml")));
        assert!(result.has_errors());
        assert!(result.config_path.is_some());
    }
}
