pub mod base_url;
pub mod error;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_CONFIG_FILE, env};
use crate::models::sources::{EnvConfig, FileConfig};
use crate::models::{Config, ConfigMetadata, InjectionPolicy};
use crate::util::{parse_bool, parse_duration};
use crate::validation::{ConfigWarnings, apply_guard_rails};

pub use base_url::normalize_base_url;
use error::ConfigLoadError;

/// Result of a successful load: the effective config plus warnings.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Clone)]
pub struct ConfigLoaderOptions {
    /// Explicit config file. When set the file must exist.
    pub config_path: Option<PathBuf>,
    /// `.env` file to load before reading the environment.
    pub env_file: Option<PathBuf>,
}

impl Default for ConfigLoaderOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            env_file: Some(PathBuf::from(".env")),
        }
    }
}

/// Composes defaults, the TOML file and the environment into a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
    env_override: Option<EnvConfig>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self {
            options,
            env_override: None,
        }
    }

    /// Use a pre-gathered environment instead of the process environment.
    /// Also skips `.env` loading.
    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.env_override = Some(env);
        self
    }

    pub fn load(self) -> Result<ConfigLoad, ConfigLoadError> {
        let mut metadata = ConfigMetadata::default();

        let env = match self.env_override {
            Some(env) => env,
            None => {
                if let Some(path) = self.options.env_file.as_deref() {
                    metadata.env_file_loaded = load_env_file(path)?;
                }
                EnvConfig::gather()
            }
        };

        let (file, config_path) =
            read_file_config(self.options.config_path.as_deref(), &env)?;
        metadata.config_path = config_path;

        let mut config = compose(file, &env)?;
        config.metadata = metadata;

        let warnings = apply_guard_rails(&mut config);
        Ok(ConfigLoad { config, warnings })
    }
}

fn load_env_file(path: &Path) -> Result<bool, ConfigLoadError> {
    if !path.exists() {
        return Ok(false);
    }
    // dotenvy never overrides variables already present in the environment.
    dotenvy::from_path(path).map_err(|source| ConfigLoadError::EnvFile {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded env file");
    Ok(true)
}

fn read_file_config(
    explicit: Option<&Path>,
    env: &EnvConfig,
) -> Result<(FileConfig, Option<PathBuf>), ConfigLoadError> {
    let (path, required) = match explicit.or(env.config_path.as_deref()) {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    if !path.exists() {
        if required {
            return Err(ConfigLoadError::MissingFile { path });
        }
        return Ok((FileConfig::default(), None));
    }

    let raw = fs::read_to_string(&path).map_err(|source| {
        ConfigLoadError::Io {
            path: path.clone(),
            source,
        }
    })?;
    let parsed: FileConfig =
        toml::from_str(&raw).map_err(|source| ConfigLoadError::Parse {
            path: path.clone(),
            source,
        })?;
    Ok((parsed, Some(path)))
}

fn compose(file: FileConfig, env: &EnvConfig) -> Result<Config, ConfigLoadError> {
    let mut config = Config::default();

    if let Some(url) = env.server_url.as_ref().or(file.server.base_url.as_ref())
    {
        config.server.base_url = normalize_base_url(url)?;
    }
    if let Some(raw) = env.request_timeout.as_ref() {
        config.server.request_timeout =
            Some(duration(env::REQUEST_TIMEOUT, raw)?);
    } else if let Some(raw) = file.server.request_timeout.as_ref() {
        config.server.request_timeout =
            Some(duration("server.request_timeout", raw)?);
    }

    if let Some(raw) = env.scale_poll_interval.as_ref() {
        config.scale.poll_interval = duration(env::SCALE_POLL_INTERVAL, raw)?;
    } else if let Some(raw) = file.scale.poll_interval.as_ref() {
        config.scale.poll_interval = duration("scale.poll_interval", raw)?;
    }
    if let Some(raw) = env.scale_failure_threshold.as_ref() {
        config.scale.failure_threshold = raw.trim().parse().map_err(
            |err: std::num::ParseIntError| ConfigLoadError::InvalidValue {
                key: env::SCALE_FAILURE_THRESHOLD,
                value: raw.clone(),
                reason: err.to_string(),
            },
        )?;
    } else if let Some(threshold) = file.scale.failure_threshold {
        config.scale.failure_threshold = threshold;
    }

    if let Some(raw) = env.card_poll_interval.as_ref() {
        config.card_reader.poll_interval =
            duration(env::CARD_POLL_INTERVAL, raw)?;
    } else if let Some(raw) = file.card_reader.poll_interval.as_ref() {
        config.card_reader.poll_interval =
            duration("card_reader.poll_interval", raw)?;
    }
    if let Some(raw) = env.injection_policy.as_ref() {
        config.card_reader.injection_policy =
            raw.parse::<InjectionPolicy>().map_err(|reason| {
                ConfigLoadError::InvalidValue {
                    key: env::INJECTION_POLICY,
                    value: raw.clone(),
                    reason,
                }
            })?;
    } else if let Some(policy) = file.card_reader.injection_policy {
        config.card_reader.injection_policy = policy;
    }
    if let Some(raw) = env.card_autostart.as_ref() {
        config.card_reader.autostart =
            parse_bool(raw).ok_or_else(|| ConfigLoadError::InvalidValue {
                key: env::CARD_AUTOSTART,
                value: raw.clone(),
                reason: "expected true/false, yes/no, on/off or 1/0"
                    .to_string(),
            })?;
    } else if let Some(autostart) = file.card_reader.autostart {
        config.card_reader.autostart = autostart;
    }

    if let Some(raw) = env.refresh_delay.as_ref() {
        config.tickets.refresh_delay = duration(env::REFRESH_DELAY, raw)?;
    } else if let Some(raw) = file.tickets.refresh_delay.as_ref() {
        config.tickets.refresh_delay = duration("tickets.refresh_delay", raw)?;
    }
    config.tickets.snapshot_path = env
        .ticket_snapshot
        .clone()
        .or(file.tickets.snapshot_path);

    Ok(config)
}

fn duration(key: &'static str, raw: &str) -> Result<Duration, ConfigLoadError> {
    parse_duration(raw).map_err(|source| ConfigLoadError::InvalidDuration {
        key,
        value: raw.to_string(),
        source,
    })
}
