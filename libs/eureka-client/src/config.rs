use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RegistryError;

/// Where the registry lives.
///
/// An explicit `uri` wins; otherwise the base is composed as
/// `{scheme}://{host}:{port}/{context}`. A `host` that already names a scheme
/// (`https://registry`) keeps it and `scheme` is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Full base URI, e.g. `http://registry:8761/eureka`.
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_context")]
    pub context: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            uri: None,
            host: None,
            port: default_port(),
            context: default_context(),
            scheme: default_scheme(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_port() -> u16 {
    8761
}

fn default_context() -> String {
    "eureka".to_owned()
}

fn default_scheme() -> String {
    "http".to_owned()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl RegistryConfig {
    #[must_use]
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_host(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the base URI string without parsing it.
    ///
    /// # Errors
    /// Returns [`RegistryError::Config`] when neither `uri` nor `host` is set.
    pub fn base_uri(&self) -> Result<String, RegistryError> {
        if let Some(uri) = self.uri.as_deref().filter(|u| !u.is_empty()) {
            return Ok(uri.to_owned());
        }
        let Some(host) = self.host.as_deref().filter(|h| !h.is_empty()) else {
            return Err(RegistryError::Config(
                "either `uri` or `host` must be set".to_owned(),
            ));
        };

        // A host given as `https://registry` carries its own scheme.
        let origin = if host.contains("://") {
            format!("{}:{}", host.trim_end_matches('/'), self.port)
        } else {
            format!("{}://{host}:{}", self.scheme, self.port)
        };
        let context = self.context.trim_matches('/');
        if context.is_empty() {
            Ok(origin)
        } else {
            Ok(format!("{origin}/{context}"))
        }
    }

    /// Resolve and parse the base URI.
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidUrl`] if the URI does not parse and
    /// [`RegistryError::Config`] if it is not an absolute `http`/`https` URL.
    pub fn base_url(&self) -> Result<Url, RegistryError> {
        let raw = self.base_uri()?;
        let url = Url::parse(&raw).map_err(|source| RegistryError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;

        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(RegistryError::Config(format!(
                "registry URL '{raw}' must be an absolute http or https URL"
            )));
        }
        Ok(url)
    }

    /// # Errors
    /// Returns the error [`base_url`](Self::base_url) would return.
    pub fn validate(&self) -> Result<(), RegistryError> {
        self.base_url().map(|_| ())
    }
}
