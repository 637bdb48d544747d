use url::Url;

use crate::ConfigLoadError;

/// Normalise an operator-supplied server URL.
///
/// Operators tend to type `localhost:5000`; a scheme is added when missing and
/// any trailing slash is trimmed so path joins never double up.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigLoadError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_scheme = if trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
    {
        trimmed.to_string()
    } else if trimmed.contains("://") {
        return Err(ConfigLoadError::UnsupportedScheme {
            value: raw.to_string(),
        });
    } else {
        format!("http://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme).map_err(|source| {
        ConfigLoadError::InvalidBaseUrl {
            value: raw.to_string(),
            source,
        }
    })?;
    if parsed.host_str().is_none() {
        return Err(ConfigLoadError::InvalidBaseUrl {
            value: raw.to_string(),
            source: url::ParseError::EmptyHost,
        });
    }

    if with_scheme != raw {
        tracing::debug!(
            original = raw,
            normalized = %with_scheme,
            "normalized server base url"
        );
    }
    Ok(with_scheme)
}
