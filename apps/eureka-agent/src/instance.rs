use eureka_client::InstanceDescriptor;

use crate::config::AppSection;

/// Describe the local service from its deployment settings.
///
/// The address `{local_ip}:{port}` keys everything else: the instance id is
/// `{name}:{address}` and the page URLs hang off `http://{address}`.
#[must_use]
pub fn build_instance(app: &AppSection) -> InstanceDescriptor {
    let address = format!("{}:{}", app.local_ip, app.port);
    let home = format!("http://{address}");

    InstanceDescriptor::new()
        .instance_id(format!("{}:{address}", app.name))
        .host_name(app.host_name.as_deref().unwrap_or(&app.name))
        .app(app.name.as_str())
        .ip_addr(app.local_ip.as_str())
        .port(app.port, true)
        .home_page_url(home.as_str())
        .status_page_url(format!("{home}/status"))
        .health_check_url(format!("{home}/health-check"))
        .secure_health_check_url(format!("https://{address}/health-check"))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn descriptor_follows_deployment_settings() {
        let app = AppSection {
            name: "svcA".to_owned(),
            local_ip: "10.0.0.5".to_owned(),
            port: 8000,
            host_name: Some("svca.internal".to_owned()),
        };

        let exported = Value::Object(build_instance(&app).export());
        assert_eq!(exported["instanceId"], "svcA:10.0.0.5:8000");
        assert_eq!(exported["app"], "svcA");
        assert_eq!(exported["hostName"], "svca.internal");
        assert_eq!(exported["ipAddr"], "10.0.0.5");
        assert_eq!(exported["port"], json!({"$": 8000, "@enabled": "true"}));
        assert_eq!(exported["homePageUrl"], "http://10.0.0.5:8000");
        assert_eq!(exported["statusPageUrl"], "http://10.0.0.5:8000/status");
        assert_eq!(
            exported["healthCheckUrl"],
            "http://10.0.0.5:8000/health-check"
        );
        assert_eq!(
            exported["secureHealthCheckUrl"],
            "https://10.0.0.5:8000/health-check"
        );
    }

    #[test]
    fn host_name_defaults_to_app_name() {
        let exported = build_instance(&AppSection::default()).export();
        assert_eq!(exported["hostName"], "UNKNOWN");
        assert_eq!(exported["instanceId"], "UNKNOWN:127.0.0.1:8000");
        assert_eq!(exported["vipAddress"], "unknown_vip_address");
    }
}
