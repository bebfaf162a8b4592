use std::sync::Arc;

use eureka_http::{HttpClient, HttpClientBuilder, HttpResponse, RequestBuilder, TransportSecurity};
use http::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::instance::{InstanceDescriptor, InstanceStatus, Metadata, attr};

const ACCEPT_JSON: &str = "application/json";

#[derive(Serialize)]
struct RegistrationBody<'a> {
    instance: &'a Map<String, Value>,
}

/// Client for one registry, bound to one instance.
///
/// The app id, instance id and exported descriptor are captured when the
/// client is built; later changes to the descriptor are not sent. Every
/// operation is a single HTTP exchange with no retries. Non-2xx answers are
/// returned as [`RegistryError::Http`].
///
/// Cheap to clone; share it across tasks directly or behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: HttpClient,
    base: Url,
    app: String,
    instance_id: String,
    snapshot: Arc<Map<String, Value>>,
}

/// Builder for [`RegistryClient`].
#[derive(Debug)]
pub struct RegistryClientBuilder {
    app: String,
    instance_id: String,
    snapshot: Map<String, Value>,
    config: RegistryConfig,
    http: Option<HttpClient>,
}

impl RegistryClientBuilder {
    /// Replace the registry address configuration.
    #[must_use]
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an explicit registry base URI.
    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.config.uri = Some(uri.into());
        self
    }

    /// Use a preconfigured HTTP client instead of deriving one from the config.
    #[must_use]
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// # Errors
    /// Returns [`RegistryError::Config`] or [`RegistryError::InvalidUrl`] if the
    /// registry address does not resolve, and [`RegistryError::Http`] if the
    /// HTTP client cannot be initialised.
    pub fn build(self) -> Result<RegistryClient, RegistryError> {
        let base = self.config.base_url()?;

        let http = match self.http {
            Some(http) => http,
            None => {
                let transport = if base.scheme() == "http" {
                    TransportSecurity::AllowInsecureHttp
                } else {
                    TransportSecurity::TlsOnly
                };
                HttpClientBuilder::new()
                    .timeout(self.config.request_timeout())
                    .transport(transport)
                    .build()?
            }
        };

        Ok(RegistryClient {
            http,
            base,
            app: self.app,
            instance_id: self.instance_id,
            snapshot: Arc::new(self.snapshot),
        })
    }
}

impl RegistryClient {
    /// Start building a client bound to `instance`.
    ///
    /// The descriptor's app id, instance id and export are captured here.
    #[must_use]
    pub fn builder(instance: &InstanceDescriptor) -> RegistryClientBuilder {
        RegistryClientBuilder {
            app: instance.get_str(attr::APP).unwrap_or_default().to_owned(),
            instance_id: instance
                .get_str(attr::INSTANCE_ID)
                .unwrap_or_default()
                .to_owned(),
            snapshot: instance.export(),
            config: RegistryConfig::default(),
            http: None,
        }
    }

    /// Shorthand for `builder(instance).config(config.clone()).build()`.
    ///
    /// # Errors
    /// See [`RegistryClientBuilder::build`].
    pub fn new(
        config: &RegistryConfig,
        instance: &InstanceDescriptor,
    ) -> Result<Self, RegistryError> {
        Self::builder(instance).config(config.clone()).build()
    }

    #[must_use]
    pub fn app(&self) -> &str {
        &self.app
    }

    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The payload `register` sends under `instance`.
    #[must_use]
    pub fn snapshot(&self) -> &Map<String, Value> {
        &self.snapshot
    }

    /// `POST /apps/{app}` with the captured descriptor.
    ///
    /// # Errors
    /// Transport failures and non-2xx answers.
    pub async fn register(&self) -> Result<HttpResponse, RegistryError> {
        let url = self.endpoint(&["apps", &self.app])?;
        let body = RegistrationBody {
            instance: &self.snapshot,
        };
        let request = self.request("register", Method::POST, &url).json(&body)?;
        finish(request).await
    }

    /// `DELETE /apps/{app}/{instanceId}`.
    ///
    /// # Errors
    /// Transport failures and non-2xx answers.
    pub async fn deregister(&self) -> Result<HttpResponse, RegistryError> {
        let url = self.endpoint(&["apps", &self.app, &self.instance_id])?;
        finish(self.request("deregister", Method::DELETE, &url)).await
    }

    /// `PUT /apps/{app}/{instanceId}`, renewing the lease.
    ///
    /// A 404 means the registry no longer knows the instance and it should
    /// register again; see [`RegistryError::is_not_found`].
    ///
    /// # Errors
    /// Transport failures and non-2xx answers.
    pub async fn heartbeat(&self) -> Result<HttpResponse, RegistryError> {
        let url = self.endpoint(&["apps", &self.app, &self.instance_id])?;
        finish(self.request("heartbeat", Method::PUT, &url)).await
    }

    /// `GET /apps`.
    ///
    /// # Errors
    /// Transport failures, non-2xx answers and malformed JSON.
    pub async fn get_all_apps(&self) -> Result<Value, RegistryError> {
        let url = self.endpoint(&["apps"])?;
        self.fetch_json("get_all_apps", &url).await
    }

    /// `GET /apps/{app}`; `None` or empty targets the bound app.
    ///
    /// # Errors
    /// Transport failures, non-2xx answers and malformed JSON.
    pub async fn get_app(&self, app: Option<&str>) -> Result<Value, RegistryError> {
        let url = self.endpoint(&["apps", self.app_or_bound(app)])?;
        self.fetch_json("get_app", &url).await
    }

    /// `GET /apps/{app}/{id}`; missing arguments target the bound instance.
    ///
    /// # Errors
    /// Transport failures, non-2xx answers and malformed JSON.
    pub async fn get_app_instance(
        &self,
        app: Option<&str>,
        instance_id: Option<&str>,
    ) -> Result<Value, RegistryError> {
        let url = self.endpoint(&[
            "apps",
            self.app_or_bound(app),
            self.id_or_bound(instance_id),
        ])?;
        self.fetch_json("get_app_instance", &url).await
    }

    /// `GET /instances/{id}`.
    ///
    /// # Errors
    /// Transport failures, non-2xx answers and malformed JSON.
    pub async fn get_instance(&self, instance_id: Option<&str>) -> Result<Value, RegistryError> {
        let url = self.endpoint(&["instances", self.id_or_bound(instance_id)])?;
        self.fetch_json("get_instance", &url).await
    }

    /// Override the status to `OUT_OF_SERVICE`.
    ///
    /// # Errors
    /// Transport failures and non-2xx answers.
    pub async fn take_instance_out(
        &self,
        app: Option<&str>,
        instance_id: Option<&str>,
    ) -> Result<HttpResponse, RegistryError> {
        self.update_status(app, instance_id, InstanceStatus::OutOfService)
            .await
    }

    /// Override the status back to `UP`.
    ///
    /// # Errors
    /// Transport failures and non-2xx answers.
    pub async fn put_instance_back(
        &self,
        app: Option<&str>,
        instance_id: Option<&str>,
    ) -> Result<HttpResponse, RegistryError> {
        self.update_status(app, instance_id, InstanceStatus::Up)
            .await
    }

    /// `PUT /apps/{app}/{id}/status?value={status}`.
    ///
    /// # Errors
    /// Transport failures and non-2xx answers.
    pub async fn update_status(
        &self,
        app: Option<&str>,
        instance_id: Option<&str>,
        status: InstanceStatus,
    ) -> Result<HttpResponse, RegistryError> {
        let mut url = self.instance_endpoint(app, instance_id, "status")?;
        url.query_pairs_mut().append_pair("value", status.as_str());
        finish(self.request("update_status", Method::PUT, &url)).await
    }

    /// `DELETE /apps/{app}/{id}/status`, dropping a status override.
    ///
    /// # Errors
    /// Transport failures and non-2xx answers.
    pub async fn remove_status_override(
        &self,
        app: Option<&str>,
        instance_id: Option<&str>,
    ) -> Result<HttpResponse, RegistryError> {
        let url = self.instance_endpoint(app, instance_id, "status")?;
        finish(self.request("remove_status_override", Method::DELETE, &url)).await
    }

    /// `PUT /apps/{app}/{id}/metadata?k=v&...`.
    ///
    /// # Errors
    /// Transport failures and non-2xx answers.
    pub async fn update_app_instance_metadata(
        &self,
        app: Option<&str>,
        instance_id: Option<&str>,
        metadata: &Metadata,
    ) -> Result<HttpResponse, RegistryError> {
        let mut url = self.instance_endpoint(app, instance_id, "metadata")?;
        if !metadata.is_empty() {
            url.query_pairs_mut().extend_pairs(metadata.iter());
        }
        finish(self.request("update_app_instance_metadata", Method::PUT, &url)).await
    }

    /// `GET /vips/{vip}`.
    ///
    /// # Errors
    /// Transport failures, non-2xx answers and malformed JSON.
    pub async fn get_instances_by_vip_address(&self, vip: &str) -> Result<Value, RegistryError> {
        let url = self.endpoint(&["vips", vip])?;
        self.fetch_json("get_instances_by_vip_address", &url).await
    }

    /// `GET /svips/{svip}`.
    ///
    /// # Errors
    /// Transport failures, non-2xx answers and malformed JSON.
    pub async fn get_instances_by_secure_vip_address(
        &self,
        svip: &str,
    ) -> Result<Value, RegistryError> {
        let url = self.endpoint(&["svips", svip])?;
        self.fetch_json("get_instances_by_secure_vip_address", &url)
            .await
    }

    fn app_or_bound<'a>(&'a self, app: Option<&'a str>) -> &'a str {
        app.filter(|a| !a.is_empty()).unwrap_or(&self.app)
    }

    fn id_or_bound<'a>(&'a self, instance_id: Option<&'a str>) -> &'a str {
        instance_id
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.instance_id)
    }

    fn instance_endpoint(
        &self,
        app: Option<&str>,
        instance_id: Option<&str>,
        leaf: &str,
    ) -> Result<Url, RegistryError> {
        self.endpoint(&[
            "apps",
            self.app_or_bound(app),
            self.id_or_bound(instance_id),
            leaf,
        ])
    }

    /// Append path segments (percent-encoded) to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RegistryError::Config(format!("registry URL '{}' cannot be a base", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, operation: &'static str, method: Method, url: &Url) -> RequestBuilder {
        tracing::debug!(
            operation,
            method = %method,
            url = %url,
            app = %self.app,
            instance_id = %self.instance_id,
            "registry call"
        );
        self.http.request(method, url.as_str())
    }

    async fn fetch_json(&self, operation: &'static str, url: &Url) -> Result<Value, RegistryError> {
        let value = self
            .request(operation, Method::GET, url)
            .header("accept", ACCEPT_JSON)
            .send()
            .await?
            .json::<Value>()
            .await?;
        Ok(value)
    }
}

async fn finish(request: RequestBuilder) -> Result<HttpResponse, RegistryError> {
    Ok(request.send().await?.error_for_status().await?)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn instance() -> InstanceDescriptor {
        InstanceDescriptor::new()
            .app("SVCA")
            .instance_id("a1")
            .vip_address("svc-a")
    }

    fn client_for(server: &MockServer) -> RegistryClient {
        RegistryClient::builder(&instance())
            .uri(format!("{}/eureka", server.base_url()))
            .build()
            .unwrap()
    }

    #[test]
    fn captures_identity_at_build_time() {
        let client = RegistryClient::builder(&instance())
            .uri("http://registry:8761/eureka")
            .build()
            .unwrap();
        assert_eq!(client.app(), "SVCA");
        assert_eq!(client.instance_id(), "a1");
        assert_eq!(client.snapshot()["vipAddress"], json!("svc-a"));
        assert_eq!(client.base_url().as_str(), "http://registry:8761/eureka");
    }

    #[test]
    fn endpoint_appends_segments() {
        let client = RegistryClient::builder(&instance())
            .uri("http://registry:8761/eureka/")
            .build()
            .unwrap();
        let url = client
            .endpoint(&["apps", "SVCA", "svcA:10.0.0.5:8000"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://registry:8761/eureka/apps/SVCA/svcA:10.0.0.5:8000"
        );
    }

    #[test]
    fn endpoint_encodes_reserved_characters() {
        let client = RegistryClient::builder(&instance())
            .uri("http://registry:8761")
            .build()
            .unwrap();
        let url = client.endpoint(&["vips", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://registry:8761/vips/a%2Fb%20c");
    }

    #[test]
    fn plain_http_registry_gets_insecure_transport() {
        let client =
            RegistryClient::new(&RegistryConfig::from_host("registry"), &instance()).unwrap();
        assert_eq!(
            client.http.transport_security(),
            TransportSecurity::AllowInsecureHttp
        );
    }

    #[test]
    fn https_registry_stays_tls_only() {
        let client = RegistryClient::new(
            &RegistryConfig::from_uri("https://registry.example.com/eureka"),
            &instance(),
        )
        .unwrap();
        assert_eq!(client.http.transport_security(), TransportSecurity::TlsOnly);
    }

    #[test]
    fn missing_registry_address_fails_build() {
        let err = RegistryClient::builder(&instance()).build().unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[tokio::test]
    async fn register_posts_snapshot() {
        let server = MockServer::start();
        let expected = json!({"instance": Value::Object(instance().export())});
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/eureka/apps/SVCA")
                .header("content-type", "application/json")
                .json_body(expected);
            then.status(204);
        });

        let resp = client_for(&server).register().await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::NO_CONTENT);
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn deregister_and_heartbeat_target_bound_instance() {
        let server = MockServer::start();
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/eureka/apps/SVCA/a1");
            then.status(200);
        });
        let put = server.mock(|when, then| {
            when.method(PUT).path("/eureka/apps/SVCA/a1");
            then.status(200);
        });

        let client = client_for(&server);
        client.heartbeat().await.unwrap();
        client.deregister().await.unwrap();

        put.assert_calls(1);
        delete.assert_calls(1);
    }

    #[tokio::test]
    async fn heartbeat_404_is_not_found() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(PUT).path("/eureka/apps/SVCA/a1");
            then.status(404);
        });

        let err = client_for(&server).heartbeat().await.unwrap_err();
        assert!(err.is_not_found(), "got {err:?}");
    }

    #[tokio::test]
    async fn get_operations_send_accept_json() {
        let server = MockServer::start();
        let apps = server.mock(|when, then| {
            when.method(GET)
                .path("/eureka/apps")
                .header("accept", "application/json");
            then.status(200)
                .json_body(json!({"applications": {"application": []}}));
        });
        let app = server.mock(|when, then| {
            when.method(GET)
                .path("/eureka/apps/SVCA")
                .header("accept", "application/json");
            then.status(200)
                .json_body(json!({"application": {"name": "SVCA"}}));
        });

        let client = client_for(&server);
        let all = client.get_all_apps().await.unwrap();
        assert!(all["applications"]["application"].is_array());
        let one = client.get_app(None).await.unwrap();
        assert_eq!(one["application"]["name"], "SVCA");

        apps.assert();
        app.assert();
    }

    #[tokio::test]
    async fn empty_arguments_fall_back_to_bound_identity() {
        let server = MockServer::start();
        let by_app = server.mock(|when, then| {
            when.method(GET).path("/eureka/apps/SVCA/a1");
            then.status(200).json_body(json!({"instance": {}}));
        });
        let by_id = server.mock(|when, then| {
            when.method(GET).path("/eureka/instances/a1");
            then.status(200).json_body(json!({"instance": {}}));
        });

        let client = client_for(&server);
        client.get_app_instance(Some(""), None).await.unwrap();
        client.get_instance(Some("")).await.unwrap();

        by_app.assert();
        by_id.assert();
    }

    #[tokio::test]
    async fn explicit_arguments_override_bound_identity() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/eureka/apps/OTHER/b2");
            then.status(200)
                .json_body(json!({"instance": {"app": "OTHER"}}));
        });

        let value = client_for(&server)
            .get_app_instance(Some("OTHER"), Some("b2"))
            .await
            .unwrap();
        assert_eq!(value["instance"]["app"], "OTHER");
        mock.assert();
    }

    #[tokio::test]
    async fn status_overrides_use_query_value() {
        let server = MockServer::start();
        let out = server.mock(|when, then| {
            when.method(PUT)
                .path("/eureka/apps/SVCA/a1/status")
                .query_param("value", "OUT_OF_SERVICE");
            then.status(200);
        });
        let back = server.mock(|when, then| {
            when.method(PUT)
                .path("/eureka/apps/SVCA/a1/status")
                .query_param("value", "UP");
            then.status(200);
        });
        let removed = server.mock(|when, then| {
            when.method(DELETE).path("/eureka/apps/SVCA/a1/status");
            then.status(200);
        });

        let client = client_for(&server);
        client.take_instance_out(None, None).await.unwrap();
        client.put_instance_back(None, None).await.unwrap();
        client.remove_status_override(None, None).await.unwrap();

        out.assert_calls(1);
        back.assert_calls(1);
        removed.assert_calls(1);
    }

    #[tokio::test]
    async fn metadata_update_uses_query_pairs() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/eureka/apps/SVCA/a1/metadata")
                .query_param("zone", "eu-west-1a")
                .query_param("weight", "10");
            then.status(200);
        });

        let metadata = Metadata::new()
            .with("zone", "eu-west-1a")
            .with("weight", "10");
        client_for(&server)
            .update_app_instance_metadata(None, None, &metadata)
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn vip_lookups() {
        let server = MockServer::start();
        let vip = server.mock(|when, then| {
            when.method(GET).path("/eureka/vips/svc-a");
            then.status(200).json_body(json!({"applications": {}}));
        });
        let svip = server.mock(|when, then| {
            when.method(GET).path("/eureka/svips/svc-a-secure");
            then.status(200).json_body(json!({"applications": {}}));
        });

        let client = client_for(&server);
        client.get_instances_by_vip_address("svc-a").await.unwrap();
        client
            .get_instances_by_secure_vip_address("svc-a-secure")
            .await
            .unwrap();

        vip.assert();
        svip.assert();
    }

    #[tokio::test]
    async fn non_2xx_surfaces_status_and_preview() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST).path("/eureka/apps/SVCA");
            then.status(500).body("registry overloaded");
        });

        let err = client_for(&server).register().await.unwrap_err();
        match err {
            RegistryError::Http(eureka_http::HttpError::HttpStatus {
                status,
                body_preview,
                ..
            }) => {
                assert_eq!(status, http::StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body_preview, "registry overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_json_error() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/eureka/apps");
            then.status(200).body("<applications/>");
        });

        let err = client_for(&server).get_all_apps().await.unwrap_err();
        assert!(
            matches!(err, RegistryError::Http(eureka_http::HttpError::Json(_))),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn injected_http_client_is_used() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/eureka/apps/SVCA/a1")
                .header("user-agent", "svc-a-agent/1.0");
            then.status(200);
        });

        let http = HttpClient::builder()
            .transport(TransportSecurity::AllowInsecureHttp)
            .user_agent("svc-a-agent/1.0")
            .build()
            .unwrap();
        let client = RegistryClient::builder(&instance())
            .uri(format!("{}/eureka", server.base_url()))
            .http_client(http)
            .build()
            .unwrap();

        client.heartbeat().await.unwrap();
        mock.assert();
    }
}
