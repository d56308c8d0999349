use serde::{Deserialize, Serialize};
use std::fmt;

/// Reachability of the push transport as reported by its connection owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    Unavailable,
    AttemptingToConnect,
    Available,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySignal {
    pub availability: Availability,
    /// Push is switched off regardless of availability
    #[serde(default)]
    pub disabled: bool,
}

impl AvailabilitySignal {
    pub fn new(availability: Availability, disabled: bool) -> Self {
        Self {
            availability,
            disabled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportMode {
    Push,
    Pull,
    /// Waiting for the push transport to settle; shows an empty, loading log
    Connecting,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Push => f.write_str("push"),
            TransportMode::Pull => f.write_str("pull"),
            TransportMode::Connecting => f.write_str("connecting"),
        }
    }
}

pub fn select_mode(signal: AvailabilitySignal) -> TransportMode {
    if signal.disabled {
        return TransportMode::Pull;
    }

    match signal.availability {
        Availability::Unavailable => TransportMode::Pull,
        Availability::AttemptingToConnect => TransportMode::Connecting,
        Availability::Available => TransportMode::Push,
    }
}
