// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite session store for the Chronicle memory runtime.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! connection via `tokio-rusqlite`, and transactional, tenant-scoped message
//! logs with store-assigned sequence numbers.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteSessionStore;
pub use database::{Database, DatabaseOptions};
pub use models::{AppendOutcome, StoredMessage};
