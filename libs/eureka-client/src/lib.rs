#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Client for Eureka-style service registries
//!
//! Two halves:
//! - [`InstanceDescriptor`]: the ordered attribute set describing one running
//!   instance, exported as the registration payload
//! - [`RegistryClient`]: binds a descriptor snapshot to a registry address and
//!   issues the REST calls (register, heartbeat, queries, status and metadata
//!   updates)
//!
//! # Example
//!
//! ```ignore
//! use eureka_client::{InstanceDescriptor, RegistryClient, RegistryConfig};
//!
//! let instance = InstanceDescriptor::new()
//!     .app("SVCA")
//!     .instance_id("svcA:10.0.0.5:8000")
//!     .ip_addr("10.0.0.5");
//!
//! let client = RegistryClient::new(
//!     &RegistryConfig::from_uri("http://registry:8761/eureka"),
//!     &instance,
//! )?;
//! client.register().await?;
//! client.heartbeat().await?;
//! ```

mod client;
mod config;
mod error;
pub mod instance;

pub use client::{RegistryClient, RegistryClientBuilder};
pub use config::RegistryConfig;
pub use error::RegistryError;
pub use instance::{
    DataCenterInfo, InstanceDescriptor, InstanceStatus, Metadata, ParamValue, Parameters, PortValue,
};

pub use eureka_http::{HttpClient, HttpClientBuilder, HttpError, HttpResponse, TransportSecurity};
