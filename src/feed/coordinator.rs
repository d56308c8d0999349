use super::pull::PullAdapter;
use super::push::PushAdapter;
use super::reducer::{lock, Generation, LogReducer, LogsView, SharedReducer};
use super::selector::{select_mode, AvailabilitySignal, TransportMode};
use super::status_sync::StatusSynchronizer;
use crate::cache::RunCache;
use crate::config::types::FeedConfig;
use crate::event::{classify, Classifier, Cursor};
use crate::transport::{PullTransport, PushTransport};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// The two event sources a coordinator can pick from
#[derive(Clone)]
pub struct Transports {
    pub push: Arc<dyn PushTransport>,
    pub pull: Arc<dyn PullTransport>,
}

struct ActiveAdapter {
    mode: TransportMode,
    generation: Generation,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ActiveAdapter {
    fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Keeps one run's log view fed from whichever transport is usable.
///
/// Changing the run or the transport mode cancels the running adapter and
/// resets the log under a new generation, so nothing from the previous run
/// can reach the new view. Methods that start adapters must be called from
/// inside a tokio runtime.
pub struct LogsCoordinator {
    config: FeedConfig,
    transports: Transports,
    status_sync: StatusSynchronizer,
    reducer: SharedReducer,
    signal: AvailabilitySignal,
    run_id: Option<String>,
    active: Option<ActiveAdapter>,
}

impl LogsCoordinator {
    pub fn new(
        config: FeedConfig,
        transports: Transports,
        cache: Arc<dyn RunCache>,
        signal: AvailabilitySignal,
    ) -> Self {
        Self::with_classifier(config, transports, cache, signal, classify)
    }

    pub fn with_classifier(
        config: FeedConfig,
        transports: Transports,
        cache: Arc<dyn RunCache>,
        signal: AvailabilitySignal,
        classify: Classifier,
    ) -> Self {
        Self {
            config,
            transports,
            status_sync: StatusSynchronizer::new(cache),
            reducer: LogReducer::new(classify).shared(),
            signal,
            run_id: None,
            active: None,
        }
    }

    /// Receiver updated on every change to the view
    pub fn watch(&self) -> watch::Receiver<LogsView> {
        lock(&self.reducer).subscribe()
    }

    pub fn view(&self) -> LogsView {
        lock(&self.reducer).view()
    }

    pub fn cursor(&self) -> Option<Cursor> {
        lock(&self.reducer).cursor()
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn signal(&self) -> AvailabilitySignal {
        self.signal
    }

    /// Mode of the running adapter, None when no run is followed
    pub fn mode(&self) -> Option<TransportMode> {
        self.active.as_ref().map(|active| active.mode)
    }

    /// Follow a run. Switching to a different run starts over from an empty log.
    pub fn set_run(&mut self, run_id: impl Into<String>) {
        let run_id = run_id.into();
        if self.run_id.as_deref() == Some(run_id.as_str()) {
            return;
        }

        info!(run_id = %run_id, previous = ?self.run_id, "Following run");
        self.run_id = Some(run_id);
        self.restart();
    }

    /// Stop following any run and clear the log
    pub fn clear_run(&mut self) {
        self.stop_active();
        self.run_id = None;
        lock(&self.reducer).begin(None);
    }

    /// React to a change in push availability. A change that keeps the
    /// same transport mode leaves the running adapter alone.
    pub fn set_availability(&mut self, signal: AvailabilitySignal) {
        self.signal = signal;
        let mode = select_mode(signal);

        if self.run_id.is_none() || self.mode() == Some(mode) {
            debug!(mode = %mode, "Availability changed without a mode switch");
            return;
        }

        info!(
            run_id = ?self.run_id,
            from = ?self.mode(),
            to = %mode,
            "Switching transport mode"
        );
        self.restart();
    }

    /// Cancel the running adapter and wait for it to wind down
    pub async fn shutdown(mut self) {
        if let Some(mut active) = self.active.take() {
            active.stop();
            if let Some(handle) = active.handle.take() {
                let _ = handle.await;
            }
        }
        lock(&self.reducer).begin(None);
    }

    fn stop_active(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(mode = %active.mode, generation = %active.generation, "Stopping adapter");
            active.stop();
        }
    }

    fn restart(&mut self) {
        self.stop_active();

        let Some(run_id) = self.run_id.clone() else {
            return;
        };

        let mode = select_mode(self.signal);
        let generation = lock(&self.reducer).begin(Some(&run_id));
        let cancel = CancellationToken::new();

        let handle = match mode {
            TransportMode::Connecting => None,
            TransportMode::Push => {
                let adapter = PushAdapter::new(
                    run_id.clone(),
                    self.config.dispatch_window,
                    self.status_sync.clone(),
                );
                Some(tokio::spawn(adapter.run(
                    Arc::clone(&self.transports.push),
                    Arc::clone(&self.reducer),
                    generation,
                    self.config.reconnect_delay,
                    cancel.clone(),
                )))
            }
            TransportMode::Pull => {
                let adapter = PullAdapter::new(
                    run_id.clone(),
                    Arc::clone(&self.transports.pull),
                    self.config.poll_interval,
                );
                Some(tokio::spawn(adapter.run(
                    Arc::clone(&self.reducer),
                    generation,
                    cancel.clone(),
                )))
            }
        };

        info!(run_id = %run_id, mode = %mode, generation = %generation, "Transport selected");
        self.active = Some(ActiveAdapter {
            mode,
            generation,
            cancel,
            handle,
        });
    }
}

impl Drop for LogsCoordinator {
    fn drop(&mut self) {
        self.stop_active();
    }
}

impl std::fmt::Debug for LogsCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogsCoordinator")
            .field("run_id", &self.run_id)
            .field("signal", &self.signal)
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}
