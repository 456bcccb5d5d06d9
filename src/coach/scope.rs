// ABOUTME: Per-turn cancellation scope merging the turn deadline with client disconnect
// ABOUTME: Records which source fired first and aborts its watcher tasks on release
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::constants::messages::{DEADLINE_MESSAGE, DISCONNECT_MESSAGE};

/// Source that cancelled a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The wall-clock deadline elapsed
    Deadline,
    /// The client went away
    Disconnect,
}

impl CancelReason {
    /// Stable identifier for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deadline => "deadline",
            Self::Disconnect => "disconnect",
        }
    }

    /// User-facing description
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Deadline => DEADLINE_MESSAGE,
            Self::Disconnect => DISCONNECT_MESSAGE,
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cancellation scope owned by exactly one turn
///
/// The token is cancelled by whichever source fires first; later sources are
/// ignored. Dropping or releasing the scope aborts both watcher tasks.
pub struct TurnScope {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
    deadline_task: Option<JoinHandle<()>>,
    disconnect_task: Option<JoinHandle<()>>,
}

impl TurnScope {
    /// Scope bounded only by a deadline
    #[must_use]
    pub fn new(deadline: Duration) -> Self {
        let token = CancellationToken::new();
        let reason = Arc::new(OnceLock::new());
        let deadline_task = spawn_watcher(
            token.clone(),
            Arc::clone(&reason),
            CancelReason::Deadline,
            tokio::time::sleep(deadline),
        );
        Self {
            token,
            reason,
            deadline_task: Some(deadline_task),
            disconnect_task: None,
        }
    }

    /// Scope bounded by a deadline and a disconnect signal
    #[must_use]
    pub fn with_disconnect<F>(deadline: Duration, disconnected: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut scope = Self::new(deadline);
        scope.disconnect_task = Some(spawn_watcher(
            scope.token.clone(),
            Arc::clone(&scope.reason),
            CancelReason::Disconnect,
            disconnected,
        ));
        scope
    }

    /// Token observed by the planner and the fallback
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether either source has fired
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The source that fired first, if any
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().copied()
    }

    /// Deregister both watchers
    pub fn release(mut self) {
        self.abort_watchers();
    }

    fn abort_watchers(&mut self) {
        for task in [self.deadline_task.take(), self.disconnect_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

impl Drop for TurnScope {
    fn drop(&mut self) {
        self.abort_watchers();
    }
}

impl fmt::Debug for TurnScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnScope")
            .field("cancelled", &self.token.is_cancelled())
            .field("reason", &self.reason())
            .finish_non_exhaustive()
    }
}

/// The reason is recorded before the token fires so observers always see it
fn fire(token: &CancellationToken, cell: &OnceLock<CancelReason>, reason: CancelReason) {
    if cell.set(reason).is_ok() {
        debug!(coach.cancel_reason = %reason, "Turn scope cancelled");
    }
    token.cancel();
}

fn spawn_watcher<F>(
    token: CancellationToken,
    cell: Arc<OnceLock<CancelReason>>,
    reason: CancelReason,
    source: F,
) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {}
            () = source => fire(&token, &cell, reason),
        }
    })
}
