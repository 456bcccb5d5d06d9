// ABOUTME: Single-writer event sink for streamed coach turns over a bounded mpsc channel
// ABOUTME: Enforces start-first and single-terminal ordering and exposes the disconnect signal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::{CoachBlock, StreamEvent};
use crate::tools::ProgressSink;

/// Writer half of a streamed turn
///
/// Only one task writes. After the terminal event or `close` every write is
/// refused; writes before `start` are refused too. Once bound to a turn's
/// token, a write never waits for buffer space after that token fires.
#[derive(Debug)]
pub struct TurnEventSink {
    tx: Mutex<Option<mpsc::Sender<StreamEvent>>>,
    cancel: OnceLock<CancellationToken>,
    started: AtomicBool,
    terminated: AtomicBool,
}

impl TurnEventSink {
    /// Create a sink and the receiver feeding the response body
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx: Mutex::new(Some(tx)),
                cancel: OnceLock::new(),
                started: AtomicBool::new(false),
                terminated: AtomicBool::new(false),
            },
            rx,
        )
    }

    fn sender(&self) -> Option<mpsc::Sender<StreamEvent>> {
        self.tx.lock().ok().and_then(|guard| guard.clone())
    }

    /// Race every later write against `token`; only the first binding sticks
    pub fn bind_cancellation(&self, token: CancellationToken) {
        if self.cancel.set(token).is_err() {
            debug!("Event sink already bound to a cancellation token");
        }
    }

    /// Write one event; returns whether it was delivered
    ///
    /// After the bound token fires the event is only queued if the buffer has
    /// room, so a reader that stopped draining cannot hold the turn open.
    pub async fn emit(&self, event: StreamEvent) -> bool {
        if self.terminated.load(Ordering::Acquire) {
            debug!(event = event.event_name(), "Dropping event after terminal event");
            return false;
        }
        match event {
            StreamEvent::Start { .. } => {
                if self.started.swap(true, Ordering::AcqRel) {
                    debug!("Dropping duplicate start event");
                    return false;
                }
            }
            _ if !self.started.load(Ordering::Acquire) => {
                debug!(event = event.event_name(), "Dropping event emitted before start");
                return false;
            }
            _ => {}
        }
        if event.is_terminal() && self.terminated.swap(true, Ordering::AcqRel) {
            return false;
        }

        let Some(tx) = self.sender() else {
            return false;
        };
        let reserved = match self.cancel.get() {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => None,
                permit = tx.reserve() => Some(permit),
            },
            None => Some(tx.reserve().await),
        };

        match reserved {
            Some(Ok(permit)) => {
                permit.send(event);
                true
            }
            Some(Err(_)) => {
                debug!("Event receiver dropped; client disconnected");
                self.close();
                false
            }
            None => match tx.try_send(event) {
                Ok(()) => true,
                Err(TrySendError::Full(event)) => {
                    debug!(
                        event = event.event_name(),
                        "Dropping event for a stalled reader after cancellation"
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    self.close();
                    false
                }
            },
        }
    }

    /// Close the stream; later calls are no-ops
    pub fn close(&self) {
        self.terminated.store(true, Ordering::Release);
        if let Ok(mut guard) = self.tx.lock() {
            guard.take();
        }
    }

    /// Whether the sink no longer accepts events
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender().map_or(true, |tx| tx.is_closed())
    }

    /// Resolves once the reader has gone away
    ///
    /// Holds a sender clone until it resolves, so the watcher running it
    /// must be aborted for the stream to end.
    #[must_use]
    pub fn disconnected(&self) -> impl Future<Output = ()> + Send + 'static {
        let tx = self.sender();
        async move {
            if let Some(tx) = tx {
                tx.closed().await;
            }
        }
    }

    /// Progress adapter tagging partial output with `tool`
    #[must_use]
    pub const fn progress_for<'a>(&'a self, tool: &'a str) -> ToolProgressForwarder<'a> {
        ToolProgressForwarder { sink: self, tool }
    }
}

/// Forwards a running tool's partial output as `tool_progress` events
pub struct ToolProgressForwarder<'a> {
    sink: &'a TurnEventSink,
    tool: &'a str,
}

#[async_trait]
impl ProgressSink for ToolProgressForwarder<'_> {
    async fn report(&self, blocks: Vec<CoachBlock>) {
        self.sink
            .emit(StreamEvent::ToolProgress {
                tool: self.tool.to_owned(),
                blocks,
            })
            .await;
    }
}
