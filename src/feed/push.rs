use super::accumulator::BatchAccumulator;
use super::dispatcher::{PendingAppend, ThrottledDispatcher};
use super::reducer::{lock, Generation, SharedReducer};
use super::status_sync::StatusSynchronizer;
use crate::event::status_from_events;
use crate::transport::{PushBatch, PushPayload, PushTransport};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Feeds a live push session into the log.
///
/// Every payload is queued and signalled to the dispatcher. Statuses are
/// only synced once the server has finished replaying history.
#[derive(Debug)]
pub struct PushAdapter {
    run_id: String,
    accumulator: BatchAccumulator,
    dispatcher: ThrottledDispatcher,
    status_sync: StatusSynchronizer,
}

impl PushAdapter {
    pub fn new(
        run_id: impl Into<String>,
        window: Duration,
        status_sync: StatusSynchronizer,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            accumulator: BatchAccumulator::new(),
            dispatcher: ThrottledDispatcher::new(window),
            status_sync,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Number of events waiting for the next commit
    pub fn queued(&self) -> usize {
        self.accumulator.len()
    }

    /// Take one inbound payload
    pub fn handle(&mut self, payload: PushPayload, now: Instant) {
        let PushBatch {
            messages,
            has_more_past_events,
            cursor,
        } = match payload {
            PushPayload::Success(batch) => batch,
            PushPayload::Failure(failure) => {
                warn!(
                    run_id = %self.run_id,
                    missing_run_id = failure.missing_run_id,
                    message = %failure.message,
                    "Push transport reported failure"
                );
                return;
            }
        };

        if let Some(status) = status_from_events(&messages) {
            if has_more_past_events {
                debug!(
                    run_id = %self.run_id,
                    status = %status,
                    "Backfill in progress, not syncing status"
                );
            } else {
                self.status_sync.sync(&self.run_id, status);
            }
        }

        trace!(
            run_id = %self.run_id,
            count = messages.len(),
            has_more = has_more_past_events,
            cursor = %cursor,
            "Queued pushed events"
        );
        self.accumulator.enqueue(messages);
        self.dispatcher.signal(has_more_past_events, cursor, now);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.dispatcher.deadline()
    }

    /// The pending commit, if the dispatch window has closed
    pub fn poll_due(&mut self, now: Instant) -> Option<PendingAppend> {
        self.dispatcher.fire(now, &self.accumulator)
    }

    /// The pending commit, without waiting for the window
    pub fn flush(&mut self) -> Option<PendingAppend> {
        self.dispatcher.flush(&self.accumulator)
    }

    /// Drop everything not yet committed. Returns the number of discarded events.
    pub fn discard(&mut self) -> usize {
        self.dispatcher.cancel();
        self.accumulator.clear()
    }

    /// Drive push sessions until cancelled or superseded.
    ///
    /// A session that ends or fails to open is retried after
    /// `reconnect_delay`, resuming from the reducer's cursor. Anything
    /// queued is committed first, when its dispatch window closes, so that
    /// cursor covers it.
    pub async fn run(
        mut self,
        transport: Arc<dyn PushTransport>,
        reducer: SharedReducer,
        generation: Generation,
        reconnect_delay: Duration,
        cancel: CancellationToken,
    ) {
        info!(run_id = %self.run_id, generation = %generation, "Push adapter started");

        'session: loop {
            let cursor = lock(&reducer).cursor();
            let subscribed = tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'session,
                result = transport.subscribe(&self.run_id, cursor.as_ref()) => result,
            };

            match subscribed {
                Ok(mut stream) => {
                    info!(run_id = %self.run_id, cursor = ?cursor, "Push session opened");

                    loop {
                        let deadline = self.deadline();
                        let wake = deadline.unwrap_or_else(Instant::now);
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break 'session,
                            _ = sleep_until(wake), if deadline.is_some() => {
                                if let Some(pending) = self.poll_due(Instant::now()) {
                                    if !lock(&reducer).dispatch(generation, pending.into()) {
                                        break 'session;
                                    }
                                }
                            }
                            payload = stream.next() => match payload {
                                Some(payload) => self.handle(payload, Instant::now()),
                                None => break,
                            },
                        }
                    }

                    info!(run_id = %self.run_id, "Push session ended");
                }
                Err(e) => {
                    warn!(run_id = %self.run_id, error = %e, "Failed to open push session");
                }
            }

            // Commit what is queued once its window closes, never earlier
            if let Some(deadline) = self.deadline() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = sleep_until(deadline) => {}
                }
            }
            if let Some(pending) = self.flush() {
                if !lock(&reducer).dispatch(generation, pending.into()) {
                    break;
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = sleep(reconnect_delay) => {}
            }
        }

        let discarded = self.discard();
        info!(
            run_id = %self.run_id,
            generation = %generation,
            discarded = discarded,
            "Push adapter stopped"
        );
    }
}
