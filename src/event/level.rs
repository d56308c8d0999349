use super::{EventKind, RunEvent};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Event,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Event,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Event => "EVENT",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Severity classifier applied to every committed event
pub type Classifier = fn(&RunEvent) -> Level;

/// Default classifier: log messages keep their own level, every other
/// event kind counts as `EVENT`.
pub fn classify(event: &RunEvent) -> Level {
    match event.kind {
        EventKind::LogMessage => event.level.unwrap_or(Level::Info),
        _ => Level::Event,
    }
}

/// Rolling number of nodes per severity level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelCounts {
    counts: [usize; 6],
}

impl LevelCounts {
    pub fn get(&self, level: Level) -> usize {
        self.counts[level.index()]
    }

    pub fn increment(&mut self, level: Level) {
        self.counts[level.index()] += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Level, usize)> + '_ {
        Level::ALL.iter().map(move |level| (*level, self.get(*level)))
    }
}

impl Serialize for LevelCounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(Level::ALL.len()))?;
        for (level, count) in self.iter() {
            map.serialize_entry(level.as_str(), &count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_event(kind: EventKind, level: Option<Level>) -> RunEvent {
        RunEvent {
            run_id: "run-1".to_string(),
            timestamp: Utc::now(),
            kind,
            level,
            message: String::new(),
            step_key: None,
        }
    }

    #[test]
    fn test_log_message_keeps_its_level() {
        let event = make_event(EventKind::LogMessage, Some(Level::Error));
        assert_eq!(classify(&event), Level::Error);
    }

    #[test]
    fn test_log_message_without_level_is_info() {
        let event = make_event(EventKind::LogMessage, None);
        assert_eq!(classify(&event), Level::Info);
    }

    #[test]
    fn test_structured_events_classify_as_event() {
        // A stray level on a lifecycle event is ignored
        let event = make_event(EventKind::RunFailure, Some(Level::Critical));
        assert_eq!(classify(&event), Level::Event);
    }

    #[test]
    fn test_counts_serialize_every_level() {
        let mut counts = LevelCounts::default();
        counts.increment(Level::Info);
        counts.increment(Level::Info);
        counts.increment(Level::Event);

        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["INFO"], 2);
        assert_eq!(json["EVENT"], 1);
        assert_eq!(json["DEBUG"], 0);
        assert_eq!(counts.total(), 3);
    }
}
