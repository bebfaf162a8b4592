use serde_json::{Map, Value};

use super::metadata::Metadata;
use super::parameters::{ParamValue, Parameters};

pub const DEFAULT_DATA_CENTER_NAME: &str = "MyOwn";
pub const DEFAULT_DATA_CENTER_CLASS: &str =
    "com.netflix.appinfo.InstanceInfo$DefaultDataCenterInfo";
pub const AMAZON_DATA_CENTER_NAME: &str = "Amazon";
pub const AMAZON_DATA_CENTER_CLASS: &str = "com.netflix.appinfo.AmazonInfo";

/// Wire key naming the implementation class the registry uses to decode the block.
pub const CLASS_KEY: &str = "@class";

/// The `dataCenterInfo` block of an instance.
///
/// Only `name`, `@class` and `metadata` can be set; the default describes a
/// self-hosted ("MyOwn") deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct DataCenterInfo {
    params: Parameters,
}

impl Default for DataCenterInfo {
    fn default() -> Self {
        Self {
            params: Parameters::new(),
        }
        .name(DEFAULT_DATA_CENTER_NAME)
        .class(DEFAULT_DATA_CENTER_CLASS)
    }
}

impl DataCenterInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for instances running on AWS.
    #[must_use]
    pub fn amazon() -> Self {
        Self::default()
            .name(AMAZON_DATA_CENTER_NAME)
            .class(AMAZON_DATA_CENTER_CLASS)
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.params.set("name", name.into());
        self
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.params.set(CLASS_KEY, class.into());
        self
    }

    /// Attach a snapshot of `metadata`.
    #[must_use]
    pub fn metadata(mut self, metadata: &Metadata) -> Self {
        self.params.set("metadata", metadata.export());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    #[must_use]
    pub fn export(&self) -> Map<String, Value> {
        self.params.export()
    }
}
