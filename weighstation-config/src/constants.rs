//! Defaults and environment variable names.

use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "weighstation.toml";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

pub const DEFAULT_SCALE_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_SCALE_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_CARD_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_secs(1);

/// Poll intervals below this hammer the backend and earn a warning.
pub const MIN_RECOMMENDED_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub mod env {
    pub const CONFIG_PATH: &str = "WEIGHSTATION_CONFIG";
    pub const SERVER_URL: &str = "WEIGHSTATION_SERVER_URL";
    pub const REQUEST_TIMEOUT: &str = "WEIGHSTATION_REQUEST_TIMEOUT";
    pub const SCALE_POLL_INTERVAL: &str = "WEIGHSTATION_SCALE_POLL_INTERVAL";
    pub const SCALE_FAILURE_THRESHOLD: &str =
        "WEIGHSTATION_SCALE_FAILURE_THRESHOLD";
    pub const CARD_POLL_INTERVAL: &str = "WEIGHSTATION_CARD_POLL_INTERVAL";
    pub const INJECTION_POLICY: &str = "WEIGHSTATION_INJECTION_POLICY";
    pub const CARD_AUTOSTART: &str = "WEIGHSTATION_CARD_AUTOSTART";
    pub const REFRESH_DELAY: &str = "WEIGHSTATION_REFRESH_DELAY";
    pub const TICKET_SNAPSHOT: &str = "WEIGHSTATION_TICKET_SNAPSHOT";
}
