use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{Method, Request, Uri};
use http_body_util::Full;
use serde::Serialize;
use tower::ServiceExt;

use crate::builder::TransportSecurity;
use crate::client::ClientService;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::HttpResponse;

/// Largest response body read into memory. A full `/apps` listing from a
/// busy registry runs to several megabytes.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// A pending request; nothing is sent until [`send`](Self::send) is awaited.
///
/// The URL is taken as given. Query strings are composed by the caller
/// (e.g. with `url::Url::query_pairs_mut`).
#[must_use = "a request does nothing until .send() is awaited"]
pub struct RequestBuilder {
    service: ClientService,
    transport: TransportSecurity,
    method: Method,
    url: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    json: Option<Bytes>,
    error: Option<HttpError>,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: ClientService,
        transport: TransportSecurity,
        method: Method,
        url: &str,
    ) -> Self {
        Self {
            service,
            transport,
            method,
            url: url.to_owned(),
            headers: Vec::new(),
            json: None,
            error: None,
        }
    }

    /// Add a header. A malformed name or value fails the later `send()`.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_none() {
            match parse_header(name, value) {
                Ok(pair) => self.headers.push(pair),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    /// Serialize `body` as the request payload. `Content-Type:
    /// application/json` is added unless a content type header was set.
    ///
    /// # Errors
    /// A header error recorded earlier, or [`HttpError::Json`].
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.json = Some(Bytes::from(serde_json::to_vec(body)?));
        Ok(self)
    }

    /// Send the request. Any HTTP status counts as success here; see
    /// [`HttpResponse::error_for_status`].
    ///
    /// # Errors
    /// Invalid headers or URL, a scheme the transport does not allow,
    /// connection failures and timeouts.
    pub async fn send(self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let uri = checked_uri(&self.url, self.transport)?;
        let mut request = Request::builder().method(self.method).uri(uri);

        let has_content_type = self.headers.iter().any(|(name, _)| name == CONTENT_TYPE);
        for (name, value) in self.headers {
            request = request.header(name, value);
        }

        let body = match self.json {
            Some(json) => {
                if !has_content_type {
                    request = request.header(CONTENT_TYPE, "application/json");
                }
                json
            }
            None => Bytes::new(),
        };

        let response = self.service.oneshot(request.body(Full::new(body))?).await?;
        Ok(HttpResponse::new(response, MAX_BODY_SIZE))
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), HttpError> {
    Ok((HeaderName::try_from(name)?, HeaderValue::try_from(value)?))
}

/// Parse `url` and check its scheme against `transport`.
fn checked_uri(url: &str, transport: TransportSecurity) -> Result<Uri, HttpError> {
    let invalid = |kind: InvalidUriKind, reason: String| HttpError::InvalidUri {
        url: url.to_owned(),
        kind,
        reason,
    };

    let uri: Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| invalid(InvalidUriKind::ParseError, e.to_string()))?;

    if uri.authority().is_none() {
        return Err(invalid(
            InvalidUriKind::MissingAuthority,
            "no host".to_owned(),
        ));
    }

    match (uri.scheme_str(), transport) {
        (Some("https"), _) | (Some("http"), TransportSecurity::AllowInsecureHttp) => Ok(uri),
        (Some("http"), TransportSecurity::TlsOnly) => Err(HttpError::InvalidScheme {
            scheme: "http".to_owned(),
            reason: "plain HTTP is not allowed by this client".to_owned(),
        }),
        (Some(other), _) => Err(HttpError::InvalidScheme {
            scheme: other.to_owned(),
            reason: "only http and https are supported".to_owned(),
        }),
        (None, _) => Err(invalid(
            InvalidUriKind::MissingScheme,
            "no scheme".to_owned(),
        )),
    }
}
