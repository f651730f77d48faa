use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::WaGroupsConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "wagroups.toml",
    "wagroups.yaml",
    "wagroups.yml",
    "wagroups.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<WaGroupsConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./wagroups.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/wagroups/wagroups.{toml,yaml,yml,json}` (user-global)
///
/// Returns `WaGroupsConfig::default()` if no config file is found or the
/// one found does not parse.
pub fn discover_and_load() -> WaGroupsConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    WaGroupsConfig::default()
}

/// Load the explicit file when given (errors propagate), otherwise discover,
/// then apply environment overrides.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<WaGroupsConfig> {
    let config = match explicit {
        Some(path) => load_config(path)?,
        None => discover_and_load(),
    };
    Ok(apply_env_overrides(config))
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/wagroups/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "wagroups").map(|d| d.config_dir().to_path_buf())
}

/// Overlay credentials and service identifiers from the process environment.
///
/// The prefixed names win over the bare `ACCOUNT_SID` / `AUTH_TOKEN` used by
/// hosted function runtimes.
pub fn apply_env_overrides(config: WaGroupsConfig) -> WaGroupsConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

pub(crate) fn apply_env_overrides_with(
    mut config: WaGroupsConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> WaGroupsConfig {
    let get = |names: &[&str]| {
        names
            .iter()
            .filter_map(|name| lookup(name))
            .find(|v| !v.trim().is_empty())
    };

    if let Some(sid) = get(&["TWILIO_ACCOUNT_SID", "ACCOUNT_SID"]) {
        config.twilio.account_sid = Some(sid);
    }
    if let Some(token) = get(&["TWILIO_AUTH_TOKEN", "AUTH_TOKEN"]) {
        config.twilio.auth_token = Some(Secret::new(token));
    }
    if let Some(svc) = get(&["SYNC_SERVICE_SID"]) {
        config.twilio.sync_service_sid = Some(svc);
    }
    if let Some(svc) = get(&["CONVERSATIONS_SERVICE_SID"]) {
        config.twilio.conversations_service_sid = Some(svc);
    }
    if let Some(name) = get(&["SYNC_MAP_UNIQUE_NAME"]) {
        config.directory.map_name = name;
    }
    config
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> anyhow::Result<WaGroupsConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
