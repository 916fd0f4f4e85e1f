use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/api";
pub const ENV_API_URL: &str = "FUNDBOARD_API_URL";
pub const ENV_API_TIMEOUT_MS: &str = "FUNDBOARD_API_TIMEOUT_MS";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const MIN_TIMEOUT_MS: u64 = 250;

pub const API_BASE_SOURCE_EXPLICIT: &str = "explicit";
pub const API_BASE_SOURCE_DEFAULT: &str = "default_local";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientConfigError {
    #[error("api base url must not be empty")]
    EmptyBaseUrl,
    #[error("api base url must use http:// or https:// and include a host")]
    InvalidBaseUrl,
    #[error("invalid {ENV_API_TIMEOUT_MS}: {0}")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedApiBaseUrl {
    pub base_url: String,
    pub source: String,
}

/// Picks the API base URL: explicit value, then `FUNDBOARD_API_URL`, then the
/// local default.
pub fn resolve_api_base_url(explicit: Option<&str>) -> Result<ResolvedApiBaseUrl, ClientConfigError> {
    if let Some(base_url) = explicit.map(str::trim).filter(|value| !value.is_empty()) {
        return Ok(ResolvedApiBaseUrl {
            base_url: normalize_base_url(base_url)?,
            source: API_BASE_SOURCE_EXPLICIT.to_string(),
        });
    }

    if let Some(base_url) = env_non_empty(ENV_API_URL) {
        return Ok(ResolvedApiBaseUrl {
            base_url: normalize_base_url(&base_url)?,
            source: ENV_API_URL.to_string(),
        });
    }

    Ok(ResolvedApiBaseUrl {
        base_url: normalize_base_url(DEFAULT_API_BASE_URL)?,
        source: API_BASE_SOURCE_DEFAULT.to_string(),
    })
}

pub fn resolve_timeout_ms(explicit: Option<u64>) -> Result<u64, ClientConfigError> {
    if let Some(timeout_ms) = explicit {
        return Ok(timeout_ms.max(MIN_TIMEOUT_MS));
    }
    match env_non_empty(ENV_API_TIMEOUT_MS) {
        Some(raw) => raw
            .parse::<u64>()
            .map(|timeout_ms| timeout_ms.max(MIN_TIMEOUT_MS))
            .map_err(|error| ClientConfigError::InvalidTimeout(format!("{raw}: {error}"))),
        None => Ok(DEFAULT_TIMEOUT_MS),
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String, ClientConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientConfigError::EmptyBaseUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ClientConfigError::InvalidBaseUrl);
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(ClientConfigError::InvalidBaseUrl);
    };
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ClientConfigError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
