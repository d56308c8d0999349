use super::dispatcher::PendingAppend;
use crate::event::{classify, Classifier, Cursor, LevelCounts, RunEvent};
use serde::Serialize;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Identifies one (run, transport mode) lifetime of the feed.
///
/// Every reset starts a new generation. Actions tagged with an older one
/// belong to a superseded run and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A committed event with its client-side key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogNode {
    pub client_key: String,
    #[serde(flatten)]
    pub event: RunEvent,
}

impl Deref for LogNode {
    type Target = RunEvent;

    fn deref(&self) -> &RunEvent {
        &self.event
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogAction {
    Reset,
    Append {
        events: Vec<RunEvent>,
        has_more: bool,
        cursor: Cursor,
    },
    SetCursor(Cursor),
}

impl From<PendingAppend> for LogAction {
    fn from(pending: PendingAppend) -> Self {
        LogAction::Append {
            events: pending.events,
            has_more: pending.has_more,
            cursor: pending.cursor,
        }
    }
}

/// The ordered node log of one run
#[derive(Debug, Clone)]
pub struct LogState {
    pub nodes: Arc<Vec<LogNode>>,
    pub counts: LevelCounts,
    pub cursor: Option<Cursor>,
    pub loading: bool,
    /// Bumped on every applied action
    pub revision: u64,
}

impl Default for LogState {
    fn default() -> Self {
        Self {
            nodes: Arc::new(Vec::new()),
            counts: LevelCounts::default(),
            cursor: None,
            loading: true,
            revision: 0,
        }
    }
}

impl LogState {
    pub fn apply(&mut self, action: LogAction, classify: Classifier) {
        match action {
            LogAction::Reset => {
                let revision = self.revision;
                *self = LogState::default();
                self.revision = revision;
            }
            LogAction::Append {
                events,
                has_more,
                cursor,
            } => {
                let nodes = Arc::make_mut(&mut self.nodes);
                nodes.reserve(events.len());
                for event in events {
                    self.counts.increment(classify(&event));
                    nodes.push(LogNode {
                        client_key: client_key(&event),
                        event,
                    });
                }
                self.cursor = Some(cursor);
                self.loading = has_more;
            }
            LogAction::SetCursor(cursor) => {
                self.cursor = Some(cursor);
            }
        }
        self.revision += 1;
    }

    pub fn view(&self) -> LogsView {
        LogsView {
            all_nodes: Arc::clone(&self.nodes),
            counts: self.counts,
            loading: self.loading,
            revision: self.revision,
        }
    }
}

/// Key suffixes are shared by every log in the process, across batches and resets
static NODE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn client_key(event: &RunEvent) -> String {
    let sequence = NODE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("csk{}-{}", event.timestamp.timestamp_millis(), sequence)
}

/// What the rendering side reads
#[derive(Debug, Clone)]
pub struct LogsView {
    pub all_nodes: Arc<Vec<LogNode>>,
    pub counts: LevelCounts,
    pub loading: bool,
    pub revision: u64,
}

impl Default for LogsView {
    fn default() -> Self {
        LogState::default().view()
    }
}

/// Single writer of consumer-visible state.
///
/// Wraps [`LogState`] with the generation guard and publishes a fresh
/// [`LogsView`] on every change.
#[derive(Debug)]
pub struct LogReducer {
    state: LogState,
    generation: Generation,
    run_id: Option<String>,
    classify: Classifier,
    tx: watch::Sender<LogsView>,
}

pub type SharedReducer = Arc<Mutex<LogReducer>>;

impl Default for LogReducer {
    fn default() -> Self {
        Self::new(classify)
    }
}

impl LogReducer {
    pub fn new(classify: Classifier) -> Self {
        let state = LogState::default();
        let (tx, _rx) = watch::channel(state.view());
        Self {
            state,
            generation: Generation(0),
            run_id: None,
            classify,
            tx,
        }
    }

    pub fn shared(self) -> SharedReducer {
        Arc::new(Mutex::new(self))
    }

    pub fn subscribe(&self) -> watch::Receiver<LogsView> {
        self.tx.subscribe()
    }

    pub fn view(&self) -> LogsView {
        self.state.view()
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.state.cursor.clone()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// Reset for a new run (or a new transport for the same run) and
    /// return the generation its actions must carry.
    pub fn begin(&mut self, run_id: Option<&str>) -> Generation {
        self.generation = Generation(self.generation.0 + 1);
        self.run_id = run_id.map(str::to_string);
        self.state.apply(LogAction::Reset, self.classify);
        self.publish();

        debug!(
            run_id = ?self.run_id,
            generation = %self.generation,
            "Reset log state"
        );
        self.generation
    }

    /// Apply an action from the given generation.
    ///
    /// Returns false, without touching state, when the generation has been
    /// superseded.
    pub fn dispatch(&mut self, generation: Generation, action: LogAction) -> bool {
        if generation != self.generation {
            warn!(
                action_generation = %generation,
                current_generation = %self.generation,
                run_id = ?self.run_id,
                "Discarding action from superseded run"
            );
            return false;
        }

        if let LogAction::Append { events, has_more, .. } = &action {
            debug!(
                run_id = ?self.run_id,
                count = events.len(),
                has_more = *has_more,
                "Committing batch"
            );
        }

        self.state.apply(action, self.classify);
        self.publish();
        true
    }

    fn publish(&self) {
        self.tx.send_replace(self.state.view());
    }
}

/// Lock a shared reducer. The reducer never panics while holding the lock,
/// so a poisoned lock still guards consistent state.
pub fn lock(reducer: &SharedReducer) -> MutexGuard<'_, LogReducer> {
    reducer.lock().unwrap_or_else(PoisonError::into_inner)
}
