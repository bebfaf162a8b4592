use eureka_http::HttpError;
use thiserror::Error;

/// Errors returned by [`RegistryClient`](crate::RegistryClient) and
/// [`RegistryConfig`](crate::RegistryConfig).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// Transport failure, timeout, non-2xx status or undecodable body.
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("invalid registry URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("registry configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// Status of the registry's response, when the failure was a non-2xx answer.
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            RegistryError::Http(err) => err.status(),
            _ => None,
        }
    }

    /// The registry answered 404, e.g. a heartbeat for a lease it no longer holds.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(http::StatusCode::NOT_FOUND)
    }
}
