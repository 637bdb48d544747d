use std::time::Duration;

use crate::constants::MIN_RECOMMENDED_POLL_INTERVAL;
use crate::models::Config;

/// A non-fatal configuration issue worth logging at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn push(&mut self, message: impl Into<String>, hint: Option<&str>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: hint.map(str::to_string),
        });
    }
}

/// Apply guard rails to a composed config, coercing values that would stall
/// the kiosk and recording a warning for each adjustment or smell.
pub fn apply_guard_rails(config: &mut Config) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();

    check_interval(
        &mut warnings,
        "scale.poll_interval",
        config.scale.poll_interval,
    );
    check_interval(
        &mut warnings,
        "card_reader.poll_interval",
        config.card_reader.poll_interval,
    );

    if config.scale.failure_threshold == 0 {
        config.scale.failure_threshold = 1;
        warnings.push(
            "scale.failure_threshold of 0 coerced to 1",
            Some("the scale is reported disconnected after this many consecutive failed reads"),
        );
    }

    if config.server.request_timeout.is_some_and(|t| t.is_zero()) {
        config.server.request_timeout = None;
        warnings.push(
            "server.request_timeout of 0 disables the timeout",
            None,
        );
    }

    warnings
}

fn check_interval(warnings: &mut ConfigWarnings, key: &str, value: Duration) {
    if value.is_zero() {
        warnings.push(
            format!("{key} is zero; polling will run back to back"),
            Some("use at least 250ms"),
        );
    } else if value < MIN_RECOMMENDED_POLL_INTERVAL {
        warnings.push(
            format!(
                "{key} of {} is below the recommended minimum",
                humantime::format_duration(value)
            ),
            Some("use at least 250ms"),
        );
    }
}
