//! Instance descriptor model and its wire encoding.

mod data_center;
mod descriptor;
mod metadata;
mod parameters;
mod status;

pub use data_center::{
    AMAZON_DATA_CENTER_CLASS, AMAZON_DATA_CENTER_NAME, CLASS_KEY, DEFAULT_DATA_CENTER_CLASS,
    DEFAULT_DATA_CENTER_NAME, DataCenterInfo,
};
pub use descriptor::{
    DEFAULT_HEALTH_CHECK_URL, DEFAULT_HOME_PAGE_URL, DEFAULT_IDENTITY, DEFAULT_IP_ADDR,
    DEFAULT_PORT, DEFAULT_SECURE_HEALTH_CHECK_URL, DEFAULT_SECURE_PORT, DEFAULT_SECURE_VIP_ADDRESS,
    DEFAULT_STATUS_PAGE_URL, DEFAULT_VIP_ADDRESS, InstanceDescriptor, attr,
};
pub use metadata::Metadata;
pub use parameters::{PORT_ENABLED_KEY, PORT_VALUE_KEY, ParamValue, Parameters, PortValue};
pub use status::InstanceStatus;
