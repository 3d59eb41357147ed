// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Chronicle configuration system.

use chronicle_config::diagnostic::ConfigError;
use chronicle_config::model::{ChronicleConfig, LongTermIndex, StorageScope, StrategyKind};
use chronicle_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_chronicle_config() {
    let toml = r#"
[agent]
id = "support-bot"
log_level = "debug"

[storage]
database_path = "/tmp/chronicle-test.db"
wal_mode = false
busy_timeout_ms = 250

[working_memory]
strategy = "buffer_window"
window_size = 3
model = "gpt-4"
budget = 4000
threshold = 0.9
target = 0.5
min_messages_before_summary = 12
min_recent_messages = 4
recent_budget_ratio = 0.5
max_load_without_checkpoint = 50

[long_term]
enabled = true
index = "keyword"
storage_scope = "conversational"
batch_size = 8
auto_recall = true
recall_limit = 3
collection = "support_memory"
max_flush_attempts = 5
clear_on_delete = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.id, "support-bot");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/chronicle-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.busy_timeout_ms, 250);
    assert_eq!(config.working_memory.strategy, StrategyKind::BufferWindow);
    assert_eq!(config.working_memory.window_size, 3);
    assert_eq!(config.working_memory.budget, 4000);
    assert_eq!(config.working_memory.min_recent_messages, 4);
    assert_eq!(config.working_memory.max_load_without_checkpoint, 50);
    assert!(config.long_term.enabled);
    assert_eq!(config.long_term.index, LongTermIndex::Keyword);
    assert_eq!(config.long_term.storage_scope, StorageScope::Conversational);
    assert_eq!(config.long_term.batch_size, 8);
    assert_eq!(config.long_term.recall_limit, 3);
    assert_eq!(config.long_term.collection, "support_memory");
    assert_eq!(config.long_term.max_flush_attempts, 5);
    assert!(config.long_term.clear_on_delete);
}

/// Missing sections fall back to compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("[agent]\nid = \"a\"\n").expect("should parse");
    assert_eq!(config.working_memory.strategy, StrategyKind::SummaryBuffer);
    assert_eq!(config.working_memory.window_size, 20);
    assert_eq!(config.working_memory.budget, 8000);
    assert!((config.working_memory.threshold - 0.85).abs() < f64::EPSILON);
    assert!((config.working_memory.target - 0.70).abs() < f64::EPSILON);
    assert_eq!(config.working_memory.min_messages_before_summary, 20);
    assert_eq!(config.working_memory.min_recent_messages, 10);
    assert_eq!(config.working_memory.max_load_without_checkpoint, 100);
    assert!(!config.long_term.enabled);
    assert_eq!(config.long_term.batch_size, 1);
    assert_eq!(config.long_term.recall_limit, 5);
    assert_eq!(config.long_term.collection, "chronicle_session_memory");
    assert_eq!(config.long_term.storage_scope, StorageScope::All);
}

/// The spelled-out scope name is accepted as an alias.
#[test]
fn conversational_only_alias_is_accepted() {
    let config = load_config_from_str("[long_term]\nstorage_scope = \"conversational_only\"\n")
        .expect("alias should parse");
    assert_eq!(config.long_term.storage_scope, StorageScope::Conversational);

    let config = load_config_from_str("[long_term]\nstorage_scope = \"summaries_only\"\n")
        .expect("should parse");
    assert_eq!(config.long_term.storage_scope, StorageScope::SummariesOnly);
}

/// A dotted override (what the env provider produces) wins over TOML.
#[test]
fn dotted_override_beats_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: ChronicleConfig = Figment::new()
        .merge(Serialized::defaults(ChronicleConfig::default()))
        .merge(Toml::string("[long_term]\nbatch_size = 2\n"))
        .merge(("long_term.batch_size", 16))
        .extract()
        .expect("should merge override");

    assert_eq!(config.long_term.batch_size, 16);
}

#[test]
fn unknown_field_in_working_memory_is_rejected() {
    let err = load_config_from_str("[working_memory]\nbudgte = 10\n")
        .expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("budgte"),
        "error should mention the bad key, got: {err_str}"
    );
}

#[test]
fn unknown_top_level_section_is_rejected() {
    assert!(load_config_from_str("[telegram]\nbot_token = \"x\"\n").is_err());
}

#[test]
fn diagnostic_suggests_close_key() {
    let errors = load_and_validate_str("[long_term]\nbatch_sise = 4\n").unwrap_err();
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } if key == "batch_sise" => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("batch_size"));
}

#[test]
fn diagnostic_lists_valid_keys() {
    let errors = load_and_validate_str("[storage]\nzzz = 1\n").unwrap_err();
    match &errors[0] {
        ConfigError::UnknownKey { valid_keys, .. } => {
            assert!(valid_keys.contains("database_path"));
            assert!(valid_keys.contains("busy_timeout_ms"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn diagnostic_reports_invalid_type() {
    let errors = load_and_validate_str("[working_memory]\nbudget = \"lots\"\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "expected InvalidType, got {errors:?}"
    );
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let errors = load_and_validate_str("[long_term]\nenabeld = true\n").unwrap_err();
    let mut out = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut out, &errors[0] as &dyn Diagnostic)
        .expect("render should succeed");
    assert!(out.contains("enabeld"));
}

#[test]
fn validation_runs_after_parse() {
    let errors = load_and_validate_str("[working_memory]\nthreshold = 0.5\ntarget = 0.6\n")
        .unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::Validation { key, .. } if key == "working_memory.target"
    )));
}

#[test]
fn load_and_validate_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.agent.id, "chronicle");
}

fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("chronicle.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial_test::serial]
fn env_var_overrides_file_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[long_term]\nbatch_size = 4\nstorage_scope = \"all\"\n");

    // SAFETY: serialized with every other test touching the environment.
    unsafe {
        std::env::set_var("CHRONICLE_LONG_TERM_BATCH_SIZE", "9");
        std::env::set_var("CHRONICLE_LONG_TERM_STORAGE_SCOPE", "summaries_only");
    }
    let loaded = chronicle_config::load_config_from_path(&path);
    unsafe {
        std::env::remove_var("CHRONICLE_LONG_TERM_BATCH_SIZE");
        std::env::remove_var("CHRONICLE_LONG_TERM_STORAGE_SCOPE");
    }

    let config = loaded.expect("env overrides should parse");
    assert_eq!(config.long_term.batch_size, 9);
    assert_eq!(config.long_term.storage_scope, StorageScope::SummariesOnly);
}

#[test]
#[serial_test::serial]
fn file_values_apply_without_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[working_memory]\nstrategy = \"buffer_window\"\nwindow_size = 7\n");

    let config = chronicle_config::load_and_validate_path(&path).expect("file should validate");
    assert_eq!(config.working_memory.strategy, StrategyKind::BufferWindow);
    assert_eq!(config.working_memory.window_size, 7);
}
