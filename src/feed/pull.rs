use super::reducer::{lock, Generation, LogAction, SharedReducer};
use crate::transport::{PullResponse, PullTransport, RunPage};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls a run's events page by page.
///
/// Fetches are strictly sequential: the next poll is only scheduled after
/// the previous page has been committed, so it always asks for events
/// after the freshest cursor.
pub struct PullAdapter {
    run_id: String,
    transport: Arc<dyn PullTransport>,
    poll_interval: Duration,
}

impl PullAdapter {
    pub fn new(
        run_id: impl Into<String>,
        transport: Arc<dyn PullTransport>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            transport,
            poll_interval,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Poll until the run is terminal, unknown, cancelled or superseded
    pub async fn run(
        self,
        reducer: SharedReducer,
        generation: Generation,
        cancel: CancellationToken,
    ) {
        info!(
            run_id = %self.run_id,
            generation = %generation,
            poll_interval_ms = self.poll_interval.as_millis(),
            "Pull adapter started"
        );

        loop {
            let cursor = lock(&reducer).cursor();
            debug!(run_id = %self.run_id, after = ?cursor, "Polling run events");

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.transport.fetch(&self.run_id, cursor.as_ref()) => result,
            };

            match result {
                Ok(PullResponse::Run(page)) => {
                    let status = page.status;
                    let (action, has_more) = page_action(page);
                    if !lock(&reducer).dispatch(generation, action) {
                        break;
                    }
                    if !has_more {
                        info!(
                            run_id = %self.run_id,
                            status = %status,
                            "Run finished, polling stopped"
                        );
                        break;
                    }
                }
                Ok(PullResponse::RunNotFound { message }) => {
                    warn!(
                        run_id = %self.run_id,
                        message = %message,
                        "Run not found, polling stopped"
                    );
                    break;
                }
                Err(e) => {
                    warn!(run_id = %self.run_id, error = %e, "Poll failed, retrying next interval");
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }

        info!(run_id = %self.run_id, generation = %generation, "Pull adapter stopped");
    }
}

impl std::fmt::Debug for PullAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PullAdapter")
            .field("run_id", &self.run_id)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

/// The append action for one page, plus whether more events can follow.
///
/// Liveness comes from the run status alone: anything short of a terminal
/// status may still produce events.
pub fn page_action(page: RunPage) -> (LogAction, bool) {
    let has_more = !page.status.is_terminal();
    let action = LogAction::Append {
        events: page.events,
        has_more,
        cursor: page.cursor,
    };
    (action, has_more)
}
