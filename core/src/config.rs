//! Client configuration resolved once at startup.

use url::Url;

/// Environment variable that overrides the backend base URL.
pub const BASE_URL_ENV: &str = "STOREFRONT_API_URL";

/// Base URL used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Immutable client configuration, passed explicitly to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read the base URL from `STOREFRONT_API_URL`, falling back to the local
    /// default when unset or blank.
    pub fn from_env() -> Self {
        Self::from_override(std::env::var(BASE_URL_ENV).ok().as_deref())
    }

    /// An explicit base URL if it has content, the default otherwise.
    pub fn from_override(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(url) if !url.is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join an endpoint path (with or without a leading `/`) onto the base URL.
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}", self.base_url)
        }
    }

    /// Resolve an image reference for display.
    ///
    /// Absolute `http`/`https` URLs are returned unchanged; anything else is
    /// treated as a path relative to the backend.
    pub fn resolve_image(&self, reference: &str) -> String {
        match Url::parse(reference) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => reference.to_string(),
            _ => self.url(reference),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
