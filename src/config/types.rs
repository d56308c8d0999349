use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout: default_timeout(),
        }
    }
}

fn default_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Timing knobs of the log feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Minimum spacing between commits of pushed events
    #[serde(default = "default_dispatch_window", with = "humantime_serde")]
    pub dispatch_window: Duration,
    /// Period between polls when the push transport is unavailable
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Pause before re-opening a push session that ended
    #[serde(default = "default_reconnect_delay", with = "humantime_serde")]
    pub reconnect_delay: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            dispatch_window: default_dispatch_window(),
            poll_interval: default_poll_interval(),
            reconnect_delay: default_reconnect_delay(),
        }
    }
}

fn default_dispatch_window() -> Duration {
    Duration::from_millis(100)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(5000)
}

fn default_reconnect_delay() -> Duration {
    Duration::from_secs(1)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Never use the push transport, poll instead
    #[serde(default)]
    pub disable_push: bool,
}
