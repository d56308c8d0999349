#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::channel::mpsc;
use futures::StreamExt;
use runlog::cache::MemoryRunCache;
use runlog::config::FeedConfig;
use runlog::event::{Cursor, EventKind, Level, RunEvent, RunStatus};
use runlog::feed::{Availability, AvailabilitySignal, LogsCoordinator, Transports};
use runlog::transport::{
    PullResponse, PullTransport, PushBatch, PushPayload, PushStream, PushTransport,
    RunPage, TransportError,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct PushSession {
    pub run_id: String,
    pub cursor: Option<Cursor>,
    pub tx: mpsc::UnboundedSender<PushPayload>,
}

/// Push transport whose sessions are fed by the test
#[derive(Default)]
pub struct FakePush {
    sessions: Mutex<Vec<PushSession>>,
}

impl FakePush {
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn run_id(&self, index: usize) -> String {
        self.sessions.lock().unwrap()[index].run_id.clone()
    }

    pub fn cursor(&self, index: usize) -> Option<Cursor> {
        self.sessions.lock().unwrap()[index].cursor.clone()
    }

    /// Deliver a payload on a session. Sends to a closed session are ignored.
    pub fn send(&self, index: usize, payload: PushPayload) {
        let _ = self.sessions.lock().unwrap()[index].tx.unbounded_send(payload);
    }

    /// End a session from the server side
    pub fn close(&self, index: usize) {
        self.sessions.lock().unwrap()[index].tx.close_channel();
    }
}

#[async_trait]
impl PushTransport for FakePush {
    async fn subscribe(
        &self,
        run_id: &str,
        cursor: Option<&Cursor>,
    ) -> Result<PushStream, TransportError> {
        let (tx, rx) = mpsc::unbounded();
        self.sessions.lock().unwrap().push(PushSession {
            run_id: run_id.to_string(),
            cursor: cursor.cloned(),
            tx,
        });
        Ok(rx.boxed())
    }
}

/// Pull transport answering from a script, with a fixed response latency
pub struct FakePull {
    script: Mutex<VecDeque<Result<PullResponse, TransportError>>>,
    calls: Mutex<Vec<Option<Cursor>>>,
    run_ids: Mutex<Vec<String>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakePull {
    pub fn new(latency: Duration, script: Vec<Result<PullResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            run_ids: Mutex::new(Vec::new()),
            latency,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Duration::ZERO, Vec::new())
    }

    pub fn calls(&self) -> Vec<Option<Cursor>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn run_ids(&self) -> Vec<String> {
        self.run_ids.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PullTransport for FakePull {
    async fn fetch(
        &self,
        run_id: &str,
        after: Option<&Cursor>,
    ) -> Result<PullResponse, TransportError> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        self.calls.lock().unwrap().push(after.cloned());
        self.run_ids.lock().unwrap().push(run_id.to_string());

        // The answer is fixed when the request is issued
        let response = self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(TransportError::Status {
                status: 503,
                message: "script exhausted".to_string(),
            })
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

pub struct Harness {
    pub coordinator: LogsCoordinator,
    pub push: Arc<FakePush>,
    pub pull: Arc<FakePull>,
    pub cache: Arc<MemoryRunCache>,
}

pub fn harness(availability: Availability, pull: FakePull) -> Harness {
    let push = Arc::new(FakePush::default());
    let pull = Arc::new(pull);
    let cache = Arc::new(MemoryRunCache::new());

    let coordinator = LogsCoordinator::new(
        FeedConfig::default(),
        Transports {
            push: push.clone(),
            pull: pull.clone(),
        },
        cache.clone(),
        AvailabilitySignal::new(availability, false),
    );

    Harness {
        coordinator,
        push,
        pull,
        cache,
    }
}

/// Let spawned adapters run until they block
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

pub async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    settle().await;
}

pub fn event(run_id: &str, kind: EventKind, message: &str) -> RunEvent {
    RunEvent {
        run_id: run_id.to_string(),
        timestamp: Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap(),
        kind,
        level: if kind == EventKind::LogMessage { Some(Level::Info) } else { None },
        message: message.to_string(),
        step_key: None,
    }
}

pub fn pushed(messages: Vec<RunEvent>, has_more_past_events: bool, cursor: &str) -> PushPayload {
    PushPayload::Success(PushBatch {
        messages,
        has_more_past_events,
        cursor: Cursor::new(cursor),
    })
}

pub fn page(
    status: RunStatus,
    events: Vec<RunEvent>,
    cursor: &str,
) -> Result<PullResponse, TransportError> {
    Ok(PullResponse::Run(RunPage {
        status,
        can_terminate: !status.is_terminal(),
        events,
        cursor: Cursor::new(cursor),
    }))
}
