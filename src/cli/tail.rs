use crate::cache::{MemoryRunCache, RunCache, RunRecord};
use crate::config::{load_config, Config, ConfigError};
use crate::feed::{Availability, AvailabilitySignal, LogNode, LogsCoordinator, LogsView, Transports};
use crate::transport::{HttpRunClient, PullResponse, TransportError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum TailError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to encode node: {0}")]
    Json(#[from] serde_json::Error),

    #[error("run not found: {0}")]
    RunNotFound(String),
}

#[derive(Debug, Clone)]
pub struct TailOptions {
    pub run_id: String,
    /// Keep printing after the backlog has been delivered
    pub follow: bool,
    /// Poll instead of opening a push session
    pub pull: bool,
    /// Print nodes as JSON lines
    pub json: bool,
}

pub async fn tail(config_path: Option<PathBuf>, options: TailOptions) -> Result<(), TailError> {
    let config = match config_path {
        Some(path) => {
            info!(config_path = %path.display(), "Loading configuration");
            load_config(&path)?
        }
        None => Config::default(),
    };

    let client = Arc::new(HttpRunClient::new(&config.server)?);
    let cache = Arc::new(MemoryRunCache::new());
    seed_cache(&client, &cache, &options.run_id).await?;

    let disabled = options.pull || config.transport.disable_push;
    let transports = Transports {
        push: client.clone(),
        pull: client.clone(),
    };
    let mut coordinator = LogsCoordinator::new(
        config.feed.clone(),
        transports,
        cache.clone(),
        AvailabilitySignal::new(Availability::AttemptingToConnect, disabled),
    );

    let mut views = coordinator.watch();
    coordinator.set_run(options.run_id.clone());

    if !disabled {
        let availability = if client.probe().await {
            Availability::Available
        } else {
            warn!(url = %client.base_url(), "Push unavailable, falling back to polling");
            Availability::Unavailable
        };
        coordinator.set_availability(AvailabilitySignal::new(availability, false));
    }

    let mut printed = Printed::default();
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                print_new_nodes(&view, &mut printed, options.json)?;
                if !options.follow && !view.loading {
                    break;
                }
            }
        }
    }

    print_summary(&coordinator.view(), cache.as_ref(), &options.run_id);
    coordinator.shutdown().await;
    Ok(())
}

/// Put the run's current record in the cache so pushed statuses have
/// something to update. Fails only when the server does not know the run.
async fn seed_cache(
    client: &HttpRunClient,
    cache: &MemoryRunCache,
    run_id: &str,
) -> Result<(), TailError> {
    match client.get_events(run_id, None).await {
        Ok(PullResponse::Run(page)) => {
            if let Err(e) = cache.insert(run_id, RunRecord::new(page.status, page.can_terminate)) {
                warn!(run_id = %run_id, error = %e, "Failed to cache run status");
            }
            Ok(())
        }
        Ok(PullResponse::RunNotFound { message }) => Err(TailError::RunNotFound(message)),
        Err(e) => {
            warn!(run_id = %run_id, error = %e, "Could not read run status");
            Ok(())
        }
    }
}

/// How far through the log the terminal has got
#[derive(Debug, Default)]
struct Printed {
    count: usize,
    first_key: Option<String>,
}

impl Printed {
    /// Index of the first node not printed yet. A different first node
    /// means the log was reset, so printing starts over.
    fn start(&self, view: &LogsView) -> usize {
        let first_key = view.all_nodes.first().map(|node| node.client_key.as_str());
        if first_key == self.first_key.as_deref() {
            self.count.min(view.all_nodes.len())
        } else {
            0
        }
    }

    fn record(&mut self, view: &LogsView) {
        self.count = view.all_nodes.len();
        self.first_key = view.all_nodes.first().map(|node| node.client_key.clone());
    }
}

fn print_new_nodes(view: &LogsView, printed: &mut Printed, json: bool) -> Result<(), TailError> {
    for node in &view.all_nodes[printed.start(view)..] {
        if json {
            println!("{}", serde_json::to_string(node)?);
        } else {
            println!("{}", format_node(node));
        }
    }
    printed.record(view);
    Ok(())
}

fn format_node(node: &LogNode) -> String {
    let level = crate::event::classify(node);
    let mut line = format!(
        "{} {:<8} {:<14}",
        node.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
        level,
        node.kind
    );
    if let Some(step) = &node.step_key {
        line.push_str(&format!(" [{}]", step));
    }
    if !node.message.is_empty() {
        line.push(' ');
        line.push_str(&node.message);
    }
    line
}

fn print_summary(view: &LogsView, cache: &dyn RunCache, run_id: &str) {
    let counts: Vec<String> = view
        .counts
        .iter()
        .map(|(level, count)| format!("{}={}", level, count))
        .collect();
    eprintln!("{} nodes ({})", view.all_nodes.len(), counts.join(" "));

    if let Ok(Some(record)) = cache.read(run_id) {
        eprintln!(
            "run {} status {}{}",
            run_id,
            record.status,
            if record.can_terminate { " (can terminate)" } else { "" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{classify, Cursor, EventKind, Level, RunEvent};
    use crate::feed::{LogAction, LogState};
    use chrono::{TimeZone, Utc};

    fn make_event(message: &str) -> RunEvent {
        RunEvent {
            run_id: "run-1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap(),
            kind: EventKind::LogMessage,
            level: None,
            message: message.to_string(),
            step_key: None,
        }
    }

    fn append(state: &mut LogState, messages: &[&str]) {
        state.apply(
            LogAction::Append {
                events: messages.iter().map(|m| make_event(m)).collect(),
                has_more: true,
                cursor: Cursor::new("c"),
            },
            classify,
        );
    }

    #[test]
    fn test_printing_resumes_after_printed_nodes() {
        let mut state = LogState::default();
        append(&mut state, &["a", "b"]);
        let mut printed = Printed::default();
        assert_eq!(printed.start(&state.view()), 0);
        printed.record(&state.view());

        append(&mut state, &["c"]);
        assert_eq!(printed.start(&state.view()), 2);
    }

    #[test]
    fn test_reset_log_that_outgrew_printed_count_starts_over() {
        let mut state = LogState::default();
        append(&mut state, &["a", "b"]);
        let mut printed = Printed::default();
        printed.record(&state.view());

        // Reset and regrown past the printed count before the printer looked
        state.apply(LogAction::Reset, classify);
        append(&mut state, &["x", "y", "z"]);
        assert_eq!(printed.start(&state.view()), 0);
    }

    #[test]
    fn test_format_log_message_node() {
        let node = LogNode {
            client_key: "csk0-0".to_string(),
            event: RunEvent {
                run_id: "run-1".to_string(),
                timestamp: Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap(),
                kind: EventKind::LogMessage,
                level: Some(Level::Warning),
                message: "retrying".to_string(),
                step_key: Some("extract".to_string()),
            },
        };

        let line = format_node(&node);
        assert!(line.starts_with("2026-01-28T10:00:00.000Z WARNING"));
        assert!(line.contains("log_message"));
        assert!(line.ends_with("[extract] retrying"));
    }
}
