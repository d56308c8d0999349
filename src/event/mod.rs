pub mod level;
pub mod status;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use level::{classify, Classifier, Level, LevelCounts};
pub use status::{status_from_events, RunStatus};

/// One occurrence in a run's life, as delivered by either transport.
///
/// Events carry no identity of their own; their position in the stream is
/// what distinguishes two otherwise equal records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Only meaningful for `EventKind::LogMessage`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RunEnqueued,
    RunStarting,
    RunStart,
    RunCanceling,
    RunCanceled,
    RunSuccess,
    RunFailure,
    LogMessage,
    StepStart,
    StepSuccess,
    StepFailure,
    #[serde(other)]
    Other,
}

impl EventKind {
    /// Lifecycle status implied by this kind of event, if any
    pub fn implied_status(self) -> Option<RunStatus> {
        match self {
            EventKind::RunStart => Some(RunStatus::Started),
            EventKind::RunEnqueued => Some(RunStatus::Queued),
            EventKind::RunStarting => Some(RunStatus::Starting),
            EventKind::RunCanceling => Some(RunStatus::Canceling),
            EventKind::RunCanceled => Some(RunStatus::Canceled),
            EventKind::RunSuccess => Some(RunStatus::Success),
            EventKind::RunFailure => Some(RunStatus::Failure),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::RunEnqueued => "run_enqueued",
            EventKind::RunStarting => "run_starting",
            EventKind::RunStart => "run_start",
            EventKind::RunCanceling => "run_canceling",
            EventKind::RunCanceled => "run_canceled",
            EventKind::RunSuccess => "run_success",
            EventKind::RunFailure => "run_failure",
            EventKind::LogMessage => "log_message",
            EventKind::StepStart => "step_start",
            EventKind::StepSuccess => "step_success",
            EventKind::StepFailure => "step_failure",
            EventKind::Other => "other",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Opaque resumption token issued by a transport.
///
/// Cursors are never compared, only replaced by the most recently issued one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
