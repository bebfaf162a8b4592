use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use serde::de::DeserializeOwned;

use crate::error::HttpError;

/// Bytes of a rejected response kept in [`HttpError::HttpStatus`]; registry
/// error pages can be whole HTML documents.
const ERROR_PREVIEW_LIMIT: usize = 8 * 1024;

pub type ResponseBody = BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// A registry answer with its body still unread.
///
/// Reads are capped; a body over the cap fails with
/// [`HttpError::BodyTooLarge`].
#[derive(Debug)]
pub struct HttpResponse {
    inner: Response<ResponseBody>,
    body_limit: usize,
}

impl HttpResponse {
    pub(crate) fn new(inner: Response<ResponseBody>, body_limit: usize) -> Self {
        Self { inner, body_limit }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Pass 2xx through untouched; turn anything else into
    /// [`HttpError::HttpStatus`] carrying the start of the body, where
    /// registries put the rejection reason.
    ///
    /// # Errors
    /// `HttpStatus` for non-2xx, or a transport error while reading its body.
    pub async fn error_for_status(self) -> Result<Self, HttpError> {
        if self.inner.status().is_success() {
            Ok(self)
        } else {
            Err(rejection(self.inner, self.body_limit).await)
        }
    }

    /// Check the status, then decode the body as JSON.
    ///
    /// # Errors
    /// `HttpStatus` for non-2xx, `BodyTooLarge`, or `Json` for a body that
    /// does not decode as `T`.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let Self { inner, body_limit } = self.error_for_status().await?;
        let body = read_capped(inner.into_body(), body_limit).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

async fn rejection(response: Response<ResponseBody>, body_limit: usize) -> HttpError {
    let (parts, body) = response.into_parts();
    let content_type = parts
        .headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let body_preview = match read_capped(body, body_limit.min(ERROR_PREVIEW_LIMIT)).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(HttpError::BodyTooLarge { .. }) => "<body too large for preview>".to_owned(),
        Err(e) => return e,
    };

    HttpError::HttpStatus {
        status: parts.status,
        body_preview,
        content_type,
    }
}

async fn read_capped(mut body: ResponseBody, limit: usize) -> Result<Bytes, HttpError> {
    let mut collected = Vec::new();
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        let Some(chunk) = frame.data_ref() else {
            continue;
        };
        let actual = collected.len() + chunk.len();
        if actual > limit {
            return Err(HttpError::BodyTooLarge { limit, actual });
        }
        collected.extend_from_slice(chunk);
    }
    Ok(Bytes::from(collected))
}
