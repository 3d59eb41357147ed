// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules for the session store tables.

pub mod messages;
pub mod sessions;
