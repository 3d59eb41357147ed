// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Racing futures against a caller's cancellation token.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::ChronicleError;

/// Runs `fut` until it completes or `cancel` fires.
///
/// An already-cancelled token short-circuits without polling the future.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, ChronicleError>
where
    F: Future<Output = Result<T, ChronicleError>>,
{
    if cancel.is_cancelled() {
        return Err(ChronicleError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ChronicleError::Cancelled),
        result = fut => result,
    }
}
