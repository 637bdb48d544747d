use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::env;
use crate::models::InjectionPolicy;
use crate::util::non_blank;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub scale: FileScaleConfig,
    #[serde(default)]
    pub card_reader: FileCardReaderConfig,
    #[serde(default)]
    pub tickets: FileTicketConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileScaleConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCardReaderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injection_policy: Option<InjectionPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autostart: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileTicketConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_delay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

/// Environment-derived configuration values.
///
/// Values stay raw strings here; the loader parses them so that a malformed
/// variable is reported with its name.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_url: Option<String>,
    pub request_timeout: Option<String>,
    pub scale_poll_interval: Option<String>,
    pub scale_failure_threshold: Option<String>,
    pub card_poll_interval: Option<String>,
    pub injection_policy: Option<String>,
    pub card_autostart: Option<String>,
    pub refresh_delay: Option<String>,
    pub ticket_snapshot: Option<PathBuf>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::gather_from(|key| std::env::var(key).ok())
    }

    /// Gather values through an arbitrary lookup, e.g. a map in tests.
    pub fn gather_from<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_blank(lookup(key));
        Self {
            config_path: var(env::CONFIG_PATH).map(PathBuf::from),
            server_url: var(env::SERVER_URL),
            request_timeout: var(env::REQUEST_TIMEOUT),
            scale_poll_interval: var(env::SCALE_POLL_INTERVAL),
            scale_failure_threshold: var(env::SCALE_FAILURE_THRESHOLD),
            card_poll_interval: var(env::CARD_POLL_INTERVAL),
            injection_policy: var(env::INJECTION_POLICY),
            card_autostart: var(env::CARD_AUTOSTART),
            refresh_delay: var(env::REFRESH_DELAY),
            ticket_snapshot: var(env::TICKET_SNAPSHOT).map(PathBuf::from),
        }
    }
}
