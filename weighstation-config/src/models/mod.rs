pub mod sources;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CARD_POLL_INTERVAL, DEFAULT_REFRESH_DELAY,
    DEFAULT_SCALE_FAILURE_THRESHOLD, DEFAULT_SCALE_POLL_INTERVAL,
    DEFAULT_SERVER_URL,
};

/// Effective kiosk configuration after all layers have been applied.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub scale: ScaleConfig,
    pub card_reader: CardReaderConfig,
    pub tickets: TicketConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Normalised base URL of the ticket backend, without trailing slash.
    pub base_url: String,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScaleConfig {
    pub poll_interval: Duration,
    /// Consecutive failed reads before the scale is reported disconnected.
    pub failure_threshold: u32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_SCALE_POLL_INTERVAL,
            failure_threshold: DEFAULT_SCALE_FAILURE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CardReaderConfig {
    pub poll_interval: Duration,
    pub injection_policy: InjectionPolicy,
    /// Start polling the reader as soon as the session starts.
    pub autostart: bool,
}

impl Default for CardReaderConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_CARD_POLL_INTERVAL,
            injection_policy: InjectionPolicy::default(),
            autostart: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TicketConfig {
    /// Delay between a successful ticket mutation and the view refresh.
    pub refresh_delay: Duration,
    /// Optional JSON snapshot of open tickets used to seed the view.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            refresh_delay: DEFAULT_REFRESH_DELAY,
            snapshot_path: None,
        }
    }
}

/// How manual and quick-select card injections interact with the
/// edge-triggered polling memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InjectionPolicy {
    /// Injections never touch the last polled card. A poll that returns the
    /// same ID as the previous poll stays silent even if a different card was
    /// injected in between.
    #[default]
    PolledOnly,
    /// An injection also becomes the last polled card, so the reader reporting
    /// that same card afterwards does not fire a second event.
    SyncPolled,
}

impl FromStr for InjectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polled-only" | "polled_only" => Ok(Self::PolledOnly),
            "sync-polled" | "sync_polled" => Ok(Self::SyncPolled),
            other => Err(format!(
                "unknown injection policy `{other}` (expected `polled-only` or `sync-polled`)"
            )),
        }
    }
}

impl std::fmt::Display for InjectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PolledOnly => write!(f, "polled-only"),
            Self::SyncPolled => write!(f, "sync-polled"),
        }
    }
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
