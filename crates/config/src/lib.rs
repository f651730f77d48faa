//! Configuration loading, validation and env substitution.
//!
//! Config files: `wagroups.toml`, `wagroups.yaml`, or `wagroups.json`
//! Searched in `./` then `~/.config/wagroups/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file text; credentials can also come straight from the environment.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load, load_config},
    schema::{DirectoryConfig, GroupsConfig, TwilioConfig, WaGroupsConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_config, validate_str},
};
