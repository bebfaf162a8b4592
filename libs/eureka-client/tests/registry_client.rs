#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

use eureka_client::{
    DataCenterInfo, InstanceDescriptor, Metadata, RegistryClient, RegistryConfig, RegistryError,
};
use httpmock::prelude::*;
use serde_json::{Value, json};

fn svc_a() -> InstanceDescriptor {
    InstanceDescriptor::new()
        .instance_id("svcA:10.0.0.5:8000")
        .app("SVCA")
        .host_name("svca")
        .ip_addr("10.0.0.5")
        .home_page_url("http://10.0.0.5:8000")
        .status_page_url("http://10.0.0.5:8000/status")
        .health_check_url("http://10.0.0.5:8000/health-check")
}

fn envelope(instance: &InstanceDescriptor) -> Value {
    json!({"instance": Value::Object(instance.export())})
}

#[tokio::test]
async fn register_sends_instance_envelope() {
    let expected = envelope(&svc_a());
    assert_eq!(expected["instance"]["instanceId"], "svcA:10.0.0.5:8000");
    assert_eq!(
        expected["instance"]["port"],
        json!({"$": 8000, "@enabled": "true"})
    );

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/eureka/apps/SVCA")
            .header("content-type", "application/json")
            .json_body(expected);
        then.status(204);
    });

    let config = RegistryConfig::from_uri(format!("{}/eureka", server.base_url()));
    let client = RegistryClient::new(&config, &svc_a()).unwrap();
    client.register().await.unwrap();

    mock.assert_calls(1);
}

#[tokio::test]
async fn descriptor_changes_after_binding_are_not_sent() {
    let instance = svc_a().vip_address("svc-a");
    let expected = envelope(&instance);

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/eureka/apps/SVCA")
            .json_body(expected);
        then.status(204);
    });

    let client = RegistryClient::builder(&instance)
        .uri(format!("{}/eureka", server.base_url()))
        .build()
        .unwrap();
    let _changed = instance.vip_address("svc-b").app("SVCB");

    client.register().await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn full_lifecycle_against_mock_registry() {
    let server = MockServer::start();
    let id_path = "/eureka/apps/SVCA/svcA:10.0.0.5:8000";

    let register = server.mock(|when, then| {
        when.method(POST).path("/eureka/apps/SVCA");
        then.status(204);
    });
    let heartbeat = server.mock(|when, then| {
        when.method(PUT).path(id_path);
        then.status(200);
    });
    let lookup = server.mock(|when, then| {
        when.method(GET)
            .path(id_path)
            .header("accept", "application/json");
        then.status(200).json_body(json!({
            "instance": {"instanceId": "svcA:10.0.0.5:8000", "status": "UP"}
        }));
    });
    let out_of_service = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("{id_path}/status"))
            .query_param("value", "OUT_OF_SERVICE");
        then.status(200);
    });
    let metadata = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("{id_path}/metadata"))
            .query_param("build", "42");
        then.status(200);
    });
    let deregister = server.mock(|when, then| {
        when.method(DELETE).path(id_path);
        then.status(200);
    });

    let client = RegistryClient::builder(&svc_a())
        .config(RegistryConfig::from_uri(format!(
            "{}/eureka",
            server.base_url()
        )))
        .build()
        .unwrap();

    client.register().await.unwrap();
    client.heartbeat().await.unwrap();

    let found = client.get_app_instance(None, None).await.unwrap();
    assert_eq!(found["instance"]["status"], "UP");

    client.take_instance_out(None, None).await.unwrap();
    client
        .update_app_instance_metadata(None, None, &Metadata::new().with("build", "42"))
        .await
        .unwrap();
    client.deregister().await.unwrap();

    register.assert_calls(1);
    heartbeat.assert_calls(1);
    lookup.assert_calls(1);
    out_of_service.assert_calls(1);
    metadata.assert_calls(1);
    deregister.assert_calls(1);
}

#[tokio::test]
async fn composed_base_uri_reaches_registry() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/registry/apps");
        then.status(200).json_body(json!({"applications": {}}));
    });

    let config = RegistryConfig {
        port: server.port(),
        context: "registry".to_owned(),
        ..RegistryConfig::from_host(server.host())
    };
    let apps = RegistryClient::new(&config, &svc_a())
        .unwrap()
        .get_all_apps()
        .await
        .unwrap();

    assert!(apps["applications"].is_object());
    mock.assert();
}

#[tokio::test]
async fn amazon_datacenter_is_registered_verbatim() {
    let dci = DataCenterInfo::amazon().metadata(&Metadata::new().with("instance-id", "i-0abc"));
    let instance = svc_a().data_center_info(&dci);
    let expected = envelope(&instance);
    assert_eq!(
        expected["instance"]["dataCenterInfo"],
        json!({
            "name": "Amazon",
            "@class": "com.netflix.appinfo.AmazonInfo",
            "metadata": {"instance-id": "i-0abc"}
        })
    );

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/eureka/apps/SVCA")
            .json_body(expected);
        then.status(204);
    });

    let client = RegistryClient::new(
        &RegistryConfig::from_uri(format!("{}/eureka", server.base_url())),
        &instance,
    )
    .unwrap();

    client.register().await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn unreachable_registry_is_transport_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let client = RegistryClient::new(
        &RegistryConfig::from_uri(format!("http://127.0.0.1:{port}/eureka")),
        &svc_a(),
    )
    .unwrap();

    let err = client.heartbeat().await.unwrap_err();
    assert!(
        matches!(
            err,
            RegistryError::Http(eureka_client::HttpError::Transport(_))
        ),
        "got {err:?}"
    );
}

#[test]
fn base_url_for_documented_registry_address() {
    let client = RegistryClient::new(
        &RegistryConfig::from_uri("http://registry:8761/eureka"),
        &svc_a(),
    )
    .unwrap();
    assert_eq!(client.base_url().as_str(), "http://registry:8761/eureka");
    assert_eq!(client.app(), "SVCA");
    assert_eq!(client.instance_id(), "svcA:10.0.0.5:8000");
    assert_eq!(
        client.snapshot()["port"],
        json!({"$": 8000, "@enabled": "true"})
    );
}

#[test]
fn fresh_descriptor_exports_published_defaults() {
    use eureka_client::instance::{
        DEFAULT_HEALTH_CHECK_URL, DEFAULT_HOME_PAGE_URL, DEFAULT_IDENTITY, DEFAULT_IP_ADDR,
        DEFAULT_PORT, DEFAULT_SECURE_HEALTH_CHECK_URL, DEFAULT_SECURE_PORT,
        DEFAULT_SECURE_VIP_ADDRESS, DEFAULT_STATUS_PAGE_URL, DEFAULT_VIP_ADDRESS,
    };

    let exported = Value::Object(InstanceDescriptor::new().export());
    assert_eq!(exported["instanceId"], DEFAULT_IDENTITY);
    assert_eq!(exported["hostName"], DEFAULT_IDENTITY);
    assert_eq!(exported["app"], DEFAULT_IDENTITY);
    assert_eq!(exported["ipAddr"], DEFAULT_IP_ADDR);
    assert_eq!(exported["port"]["$"], DEFAULT_PORT);
    assert_eq!(exported["securePort"]["$"], DEFAULT_SECURE_PORT);
    assert_eq!(exported["homePageUrl"], DEFAULT_HOME_PAGE_URL);
    assert_eq!(exported["statusPageUrl"], DEFAULT_STATUS_PAGE_URL);
    assert_eq!(exported["healthCheckUrl"], DEFAULT_HEALTH_CHECK_URL);
    assert_eq!(
        exported["secureHealthCheckUrl"],
        DEFAULT_SECURE_HEALTH_CHECK_URL
    );
    assert_eq!(exported["vipAddress"], DEFAULT_VIP_ADDRESS);
    assert_eq!(exported["secureVipAddress"], DEFAULT_SECURE_VIP_ADDRESS);
}

#[tokio::test]
async fn host_carrying_scheme_reaches_registry() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/eureka/apps/SVCA/svcA:10.0.0.5:8000");
        then.status(200);
    });

    let config = RegistryConfig {
        port: server.port(),
        ..RegistryConfig::from_host(format!("http://{}", server.host()))
    };
    let client = RegistryClient::new(&config, &svc_a()).unwrap();
    assert_eq!(client.base_url().host_str(), Some(server.host().as_str()));

    client.heartbeat().await.unwrap();
    mock.assert_calls(1);
}
