use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{Entry, USER_AGENT};
use http::{HeaderValue, Request, Response};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneSyncService;
use tower::{ServiceBuilder, ServiceExt};

use crate::client::HttpClient;
use crate::error::HttpError;
use crate::response::ResponseBody;

/// User-Agent stamped on requests that do not carry one.
pub const DEFAULT_USER_AGENT: &str = concat!("eureka-http/", env!("CARGO_PKG_VERSION"));

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// URL schemes a client is allowed to dial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportSecurity {
    /// `https://` only.
    #[default]
    TlsOnly,
    /// `http://` as well. Registries inside a private network commonly run
    /// without TLS.
    AllowInsecureHttp,
}

/// Configures and builds an [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: String,
    transport: TransportSecurity,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::default(),
        }
    }
}

impl HttpClientBuilder {
    /// 30 second timeout, [`DEFAULT_USER_AGENT`], TLS only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upper bound for one request, connect through last body byte.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: TransportSecurity) -> Self {
        self.transport = transport;
        self
    }

    /// Assemble `Timeout -> User-Agent -> hyper`.
    ///
    /// The hyper pool keeps no idle connections, so each request dials anew.
    ///
    /// # Errors
    /// [`HttpError::InvalidHeaderValue`] for an unusable user agent and
    /// [`HttpError::Tls`] if the rustls connector cannot be set up.
    pub fn build(self) -> Result<HttpClient, HttpError> {
        if self.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                target: "eureka_http::security",
                "plain HTTP allowed; registry traffic is not encrypted"
            );
        }

        let user_agent = HeaderValue::from_str(&self.user_agent)?;
        let timeout = self.timeout;

        let mut pool = Client::builder(TokioExecutor::new());
        pool.pool_max_idle_per_host(0);
        let hyper_client = pool.build::<_, Full<Bytes>>(https_connector(self.transport)?);

        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(timeout))
            .map_request(move |mut request: Request<Full<Bytes>>| {
                if let Entry::Vacant(slot) = request.headers_mut().entry(USER_AGENT) {
                    slot.insert(user_agent.clone());
                }
                request
            })
            .service(hyper_client)
            .map_response(erase_body)
            .map_err(move |e: tower::BoxError| classify(e, timeout));

        Ok(HttpClient {
            service: BoxCloneSyncService::new(service),
            transport: self.transport,
        })
    }
}

fn classify(err: tower::BoxError, timeout: Duration) -> HttpError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return HttpError::Timeout(timeout);
    }
    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(other) => HttpError::Transport(other),
    }
}

fn erase_body<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    response.map(|body| body.map_err(Into::into).boxed())
}

/// rustls over webpki roots. A process-wide crypto provider is used when one
/// is installed; otherwise aws-lc-rs, without installing it globally.
fn https_connector(
    transport: TransportSecurity,
) -> Result<HttpsConnector<HttpConnector>, HttpError> {
    let provider = rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()));

    let builder = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(provider)
        .map_err(|e| HttpError::Tls(Box::new(e)))?;

    Ok(match transport {
        TransportSecurity::AllowInsecureHttp => {
            builder.https_or_http().enable_all_versions().build()
        }
        TransportSecurity::TlsOnly => builder.https_only().enable_all_versions().build(),
    })
}
