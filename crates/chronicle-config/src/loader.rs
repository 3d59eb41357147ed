// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./chronicle.toml` > `~/.config/chronicle/chronicle.toml`
//! > `/etc/chronicle/chronicle.toml` with environment variable overrides via the
//! `CHRONICLE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ChronicleConfig;

/// Top-level sections, longest first so `long_term_` wins over shorter prefixes.
const SECTIONS: &[&str] = &["working_memory", "long_term", "storage", "agent"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chronicle/chronicle.toml` (system-wide)
/// 3. `~/.config/chronicle/chronicle.toml` (user XDG config)
/// 4. `./chronicle.toml` (local directory)
/// 5. `CHRONICLE_*` environment variables
pub fn load_config() -> Result<ChronicleConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ChronicleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChronicleConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChronicleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChronicleConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ChronicleConfig::default()))
        .merge(Toml::file("/etc/chronicle/chronicle.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("chronicle/chronicle.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("chronicle.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because both section and
/// key names contain underscores: `CHRONICLE_LONG_TERM_BATCH_SIZE` must map
/// to `long_term.batch_size`.
fn env_provider() -> Env {
    Env::prefixed("CHRONICLE_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a prefix-stripped env var name to a dotted config path. Matching is
/// case-insensitive and the result is lowercase.
pub fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("agent_id"), "agent.id");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(
            map_env_key("working_memory_window_size"),
            "working_memory.window_size"
        );
        assert_eq!(map_env_key("long_term_batch_size"), "long_term.batch_size");
    }

    #[test]
    fn nested_section_names_are_not_split_twice() {
        assert_eq!(
            map_env_key("long_term_storage_scope"),
            "long_term.storage_scope"
        );
    }

    #[test]
    fn uppercase_env_names_are_lowercased() {
        assert_eq!(map_env_key("LONG_TERM_BATCH_SIZE"), "long_term.batch_size");
        assert_eq!(map_env_key("STORAGE_DATABASE_PATH"), "storage.database_path");
        assert_eq!(map_env_key("Agent_Log_Level"), "agent.log_level");
        assert_eq!(map_env_key("TELEMETRY"), "telemetry");
    }

    #[test]
    fn unknown_prefix_passes_through() {
        assert_eq!(map_env_key("telemetry"), "telemetry");
    }
}
