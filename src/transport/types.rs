use crate::event::{Cursor, RunEvent, RunStatus};
use serde::{Deserialize, Serialize};

/// One message of a push session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PushPayload {
    Success(PushBatch),
    Failure(PushFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushBatch {
    #[serde(default)]
    pub messages: Vec<RunEvent>,
    /// Set while the server is still replaying history
    pub has_more_past_events: bool,
    pub cursor: Cursor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushFailure {
    #[serde(default)]
    pub missing_run_id: bool,
    pub message: String,
}

/// Result of one poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PullResponse {
    Run(RunPage),
    RunNotFound {
        #[serde(default)]
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPage {
    pub status: RunStatus,
    pub can_terminate: bool,
    #[serde(default)]
    pub events: Vec<RunEvent>,
    pub cursor: Cursor,
}
