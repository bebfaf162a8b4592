use serde_json::{Map, Value};

use super::data_center::DataCenterInfo;
use super::metadata::Metadata;
use super::parameters::{ParamValue, Parameters, PortValue};
use super::status::InstanceStatus;

/// Attribute names as they appear in the registration payload.
pub mod attr {
    pub const INSTANCE_ID: &str = "instanceId";
    pub const HOST_NAME: &str = "hostName";
    pub const APP: &str = "app";
    pub const IP_ADDR: &str = "ipAddr";
    pub const PORT: &str = "port";
    pub const SECURE_PORT: &str = "securePort";
    pub const HOME_PAGE_URL: &str = "homePageUrl";
    pub const STATUS_PAGE_URL: &str = "statusPageUrl";
    pub const HEALTH_CHECK_URL: &str = "healthCheckUrl";
    pub const SECURE_HEALTH_CHECK_URL: &str = "secureHealthCheckUrl";
    pub const VIP_ADDRESS: &str = "vipAddress";
    pub const SECURE_VIP_ADDRESS: &str = "secureVipAddress";
    pub const METADATA: &str = "metadata";
    pub const DATA_CENTER_INFO: &str = "dataCenterInfo";
    pub const STATUS: &str = "status";
    pub const OVERRIDDEN_STATUS: &str = "overriddenStatus";
}

pub const DEFAULT_IDENTITY: &str = "Unknown";
pub const DEFAULT_IP_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SECURE_PORT: u16 = 433;
pub const DEFAULT_HOME_PAGE_URL: &str = "http://localhost";
pub const DEFAULT_STATUS_PAGE_URL: &str = "http://localhost/status";
pub const DEFAULT_HEALTH_CHECK_URL: &str = "http://localhost/health-check";
pub const DEFAULT_SECURE_HEALTH_CHECK_URL: &str = "https://localhost/health-check";
pub const DEFAULT_VIP_ADDRESS: &str = "unknown_vip_address";
pub const DEFAULT_SECURE_VIP_ADDRESS: &str = "unknown_secure_vip_address";

/// Self-description of one service instance, sent to the registry on
/// registration.
///
/// Every attribute has a default, so a fresh descriptor already exports a
/// complete payload. Setters consume and return the descriptor:
///
/// ```
/// use eureka_client::InstanceDescriptor;
///
/// let instance = InstanceDescriptor::new()
///     .app("SVCA")
///     .instance_id("svcA:10.0.0.5:8000")
///     .ip_addr("10.0.0.5")
///     .port(8000, true);
///
/// assert_eq!(instance.get_str("app"), Some("SVCA"));
/// ```
///
/// Values are stored as given; nothing is validated or normalised.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDescriptor {
    params: Parameters,
}

impl Default for InstanceDescriptor {
    fn default() -> Self {
        let mut params = Parameters::new();
        params
            .set(attr::INSTANCE_ID, DEFAULT_IDENTITY)
            .set(attr::HOST_NAME, DEFAULT_IDENTITY)
            .set(attr::APP, DEFAULT_IDENTITY)
            .set(attr::IP_ADDR, DEFAULT_IP_ADDR)
            .set(attr::PORT, PortValue::new(DEFAULT_PORT, true))
            .set(attr::SECURE_PORT, PortValue::new(DEFAULT_SECURE_PORT, true))
            .set(attr::HOME_PAGE_URL, DEFAULT_HOME_PAGE_URL)
            .set(attr::STATUS_PAGE_URL, DEFAULT_STATUS_PAGE_URL)
            .set(attr::HEALTH_CHECK_URL, DEFAULT_HEALTH_CHECK_URL)
            .set(
                attr::SECURE_HEALTH_CHECK_URL,
                DEFAULT_SECURE_HEALTH_CHECK_URL,
            )
            .set(attr::VIP_ADDRESS, DEFAULT_VIP_ADDRESS)
            .set(attr::SECURE_VIP_ADDRESS, DEFAULT_SECURE_VIP_ADDRESS)
            .set(attr::METADATA, Metadata::new().export())
            .set(attr::DATA_CENTER_INFO, DataCenterInfo::new().export());
        Self { params }
    }
}

impl InstanceDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an arbitrary attribute. Typed setters below cover the standard set.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.set(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Text attribute lookup; `None` when absent or not text.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(ParamValue::as_str)
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Wire payload: the attribute map, in insertion order.
    #[must_use]
    pub fn export(&self) -> Map<String, Value> {
        self.params.export()
    }

    #[must_use]
    pub fn instance_id(self, id: impl Into<String>) -> Self {
        self.set(attr::INSTANCE_ID, id.into())
    }

    #[must_use]
    pub fn host_name(self, host_name: impl Into<String>) -> Self {
        self.set(attr::HOST_NAME, host_name.into())
    }

    #[must_use]
    pub fn app(self, app: impl Into<String>) -> Self {
        self.set(attr::APP, app.into())
    }

    #[must_use]
    pub fn ip_addr(self, ip: impl Into<String>) -> Self {
        self.set(attr::IP_ADDR, ip.into())
    }

    #[must_use]
    pub fn port(self, port: u16, enabled: bool) -> Self {
        self.set(attr::PORT, PortValue::new(port, enabled))
    }

    #[must_use]
    pub fn secure_port(self, port: u16, enabled: bool) -> Self {
        self.set(attr::SECURE_PORT, PortValue::new(port, enabled))
    }

    #[must_use]
    pub fn home_page_url(self, url: impl Into<String>) -> Self {
        self.set(attr::HOME_PAGE_URL, url.into())
    }

    #[must_use]
    pub fn status_page_url(self, url: impl Into<String>) -> Self {
        self.set(attr::STATUS_PAGE_URL, url.into())
    }

    #[must_use]
    pub fn health_check_url(self, url: impl Into<String>) -> Self {
        self.set(attr::HEALTH_CHECK_URL, url.into())
    }

    #[must_use]
    pub fn secure_health_check_url(self, url: impl Into<String>) -> Self {
        self.set(attr::SECURE_HEALTH_CHECK_URL, url.into())
    }

    #[must_use]
    pub fn vip_address(self, vip: impl Into<String>) -> Self {
        self.set(attr::VIP_ADDRESS, vip.into())
    }

    #[must_use]
    pub fn secure_vip_address(self, svip: impl Into<String>) -> Self {
        self.set(attr::SECURE_VIP_ADDRESS, svip.into())
    }

    /// Attach a snapshot of `metadata`; later changes to it are not seen.
    #[must_use]
    pub fn metadata(self, metadata: &Metadata) -> Self {
        self.set(attr::METADATA, metadata.export())
    }

    /// Attach a snapshot of `info`.
    #[must_use]
    pub fn data_center_info(self, info: &DataCenterInfo) -> Self {
        self.set(attr::DATA_CENTER_INFO, info.export())
    }

    #[must_use]
    pub fn status(self, status: InstanceStatus) -> Self {
        self.set(attr::STATUS, status.as_str())
    }

    #[must_use]
    pub fn overridden_status(self, status: InstanceStatus) -> Self {
        self.set(attr::OVERRIDDEN_STATUS, status.as_str())
    }
}
