// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express, such as ratio ranges and
//! non-empty identifiers. All errors are collected, not just the first.

use crate::diagnostic::ConfigError;
use crate::model::{ChronicleConfig, StrategyKind};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &ChronicleConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.agent.id.trim().is_empty() {
        errors.push(ConfigError::invalid("agent.id", "must not be empty"));
    }
    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::invalid(
            "agent.log_level",
            format!(
                "`{}` is not one of {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid("storage.database_path", "must not be empty"));
    }

    validate_working_memory(config, &mut errors);
    validate_long_term(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_working_memory(config: &ChronicleConfig, errors: &mut Vec<ConfigError>) {
    let wm = &config.working_memory;

    if wm.strategy == StrategyKind::BufferWindow && wm.window_size == 0 {
        errors.push(ConfigError::invalid(
            "working_memory.window_size",
            "must be at least 1",
        ));
    }
    if wm.budget == 0 {
        errors.push(ConfigError::invalid("working_memory.budget", "must be positive"));
    }
    if !(wm.threshold > 0.0 && wm.threshold <= 1.0) {
        errors.push(ConfigError::invalid(
            "working_memory.threshold",
            format!("must be in (0, 1], got {}", wm.threshold),
        ));
    }
    if !(wm.target > 0.0 && wm.target < wm.threshold) {
        errors.push(ConfigError::invalid(
            "working_memory.target",
            format!(
                "must be positive and below threshold {}, got {}",
                wm.threshold, wm.target
            ),
        ));
    }
    if !(wm.recent_budget_ratio > 0.0 && wm.recent_budget_ratio <= 1.0) {
        errors.push(ConfigError::invalid(
            "working_memory.recent_budget_ratio",
            format!("must be in (0, 1], got {}", wm.recent_budget_ratio),
        ));
    }
    if wm.min_recent_messages == 0 {
        errors.push(ConfigError::invalid(
            "working_memory.min_recent_messages",
            "must be at least 1",
        ));
    }
    if wm.max_load_without_checkpoint < wm.min_recent_messages {
        errors.push(ConfigError::invalid(
            "working_memory.max_load_without_checkpoint",
            format!(
                "must be at least min_recent_messages ({})",
                wm.min_recent_messages
            ),
        ));
    }
}

fn validate_long_term(config: &ChronicleConfig, errors: &mut Vec<ConfigError>) {
    let lt = &config.long_term;
    if !lt.enabled {
        return;
    }

    if lt.batch_size == 0 {
        errors.push(ConfigError::invalid("long_term.batch_size", "must be at least 1"));
    }
    if lt.auto_recall && lt.recall_limit == 0 {
        errors.push(ConfigError::invalid(
            "long_term.recall_limit",
            "must be at least 1 when auto_recall is on",
        ));
    }
    if lt.collection.trim().is_empty() {
        errors.push(ConfigError::invalid("long_term.collection", "must not be empty"));
    }
    if lt.max_flush_attempts == 0 {
        errors.push(ConfigError::invalid(
            "long_term.max_flush_attempts",
            "must be at least 1",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(errors: &[ConfigError]) -> Vec<String> {
        errors
            .iter()
            .filter_map(|e| match e {
                ConfigError::Validation { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&ChronicleConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = ChronicleConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(keys(&errors), vec!["storage.database_path"]);
    }

    #[test]
    fn target_must_stay_below_threshold() {
        let mut config = ChronicleConfig::default();
        config.working_memory.target = 0.9;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(keys(&errors), vec!["working_memory.target"]);
    }

    #[test]
    fn collects_every_error() {
        let mut config = ChronicleConfig::default();
        config.agent.id = String::new();
        config.agent.log_level = "loud".into();
        config.working_memory.threshold = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            keys(&errors),
            vec!["agent.id", "agent.log_level", "working_memory.threshold"]
        );
    }

    #[test]
    fn long_term_checks_skipped_when_disabled() {
        let mut config = ChronicleConfig::default();
        config.long_term.batch_size = 0;
        assert!(validate_config(&config).is_ok());

        config.long_term.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(keys(&errors), vec!["long_term.batch_size"]);
    }

    #[test]
    fn window_size_only_checked_for_buffer_window() {
        let mut config = ChronicleConfig::default();
        config.working_memory.window_size = 0;
        assert!(validate_config(&config).is_ok());

        config.working_memory.strategy = StrategyKind::BufferWindow;
        assert!(validate_config(&config).is_err());
    }
}
