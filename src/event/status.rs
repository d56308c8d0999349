use super::RunEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Queued,
    Starting,
    Started,
    Canceling,
    Canceled,
    Success,
    Failure,
}

impl RunStatus {
    /// Terminal statuses accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Success | RunStatus::Failure | RunStatus::Canceled
        )
    }

    /// Whether a run in this status can no longer be asked to terminate
    pub fn revokes_termination(self) -> bool {
        matches!(
            self,
            RunStatus::Failure
                | RunStatus::Success
                | RunStatus::Starting
                | RunStatus::Canceling
                | RunStatus::Canceled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "QUEUED",
            RunStatus::Starting => "STARTING",
            RunStatus::Started => "STARTED",
            RunStatus::Canceling => "CANCELING",
            RunStatus::Canceled => "CANCELED",
            RunStatus::Success => "SUCCESS",
            RunStatus::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Most recent status implied by a batch of events ordered oldest to newest.
///
/// Scans newest first and stops at the first event whose kind implies a
/// status. Returns `None` when no event in the batch does.
pub fn status_from_events(events: &[RunEvent]) -> Option<RunStatus> {
    events
        .iter()
        .rev()
        .find_map(|event| event.kind.implied_status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use chrono::Utc;

    fn make_event(kind: EventKind) -> RunEvent {
        RunEvent {
            run_id: "run-1".to_string(),
            timestamp: Utc::now(),
            kind,
            level: None,
            message: String::new(),
            step_key: None,
        }
    }

    #[test]
    fn test_newest_recognized_event_wins() {
        let events = vec![
            make_event(EventKind::RunEnqueued),
            make_event(EventKind::RunStart),
            make_event(EventKind::RunFailure),
        ];
        assert_eq!(status_from_events(&events), Some(RunStatus::Failure));
    }

    #[test]
    fn test_unrecognized_events_are_transparent() {
        let events = vec![
            make_event(EventKind::RunStarting),
            make_event(EventKind::LogMessage),
            make_event(EventKind::StepSuccess),
        ];
        assert_eq!(status_from_events(&events), Some(RunStatus::Starting));

        assert_eq!(status_from_events(&[make_event(EventKind::Other)]), None);
        assert_eq!(status_from_events(&[]), None);
    }

    #[test]
    fn test_every_lifecycle_kind_maps() {
        let cases = [
            (EventKind::RunEnqueued, RunStatus::Queued),
            (EventKind::RunStarting, RunStatus::Starting),
            (EventKind::RunStart, RunStatus::Started),
            (EventKind::RunCanceling, RunStatus::Canceling),
            (EventKind::RunCanceled, RunStatus::Canceled),
            (EventKind::RunSuccess, RunStatus::Success),
            (EventKind::RunFailure, RunStatus::Failure),
        ];
        for (kind, expected) in cases {
            assert_eq!(status_from_events(&[make_event(kind)]), Some(expected));
        }
    }

    #[test]
    fn test_terminal_and_revoking_sets() {
        assert!(RunStatus::Canceled.is_terminal());
        assert!(!RunStatus::Canceling.is_terminal());
        assert!(RunStatus::Starting.revokes_termination());
        assert!(!RunStatus::Started.revokes_termination());
        assert!(!RunStatus::Queued.revokes_termination());
    }
}
