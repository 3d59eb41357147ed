// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory service for conversational agents.
//!
//! [`MemoryService`] ties together the durable session store, the
//! configured working-memory strategy, and optional long-term memory. Callers
//! add turns with [`MemoryService::add_batch`] and read the model's view of a
//! session with [`MemoryService::get_recent_history`].

pub mod builder;
pub mod pending;
pub mod service;

pub use builder::MemoryServiceBuilder;
pub use service::{DEFAULT_SESSION_ID, MemoryService};
