#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP transport for the Eureka registry client
//!
//! A hyper client behind a small tower stack (`Timeout -> User-Agent`):
//! - TLS via rustls with webpki roots, plain HTTP only when asked for
//! - one attempt per request over a fresh connection, no retries
//! - non-2xx answers and oversized bodies surface as [`HttpError`]
//!
//! # Example
//!
//! ```ignore
//! use eureka_http::{HttpClient, TransportSecurity};
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(5))
//!     .transport(TransportSecurity::AllowInsecureHttp)
//!     .build()?;
//!
//! let apps: serde_json::Value = client
//!     .request(http::Method::GET, "http://registry:8761/eureka/apps")
//!     .header("accept", "application/json")
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! ```

mod builder;
mod client;
mod error;
mod request;
mod response;

pub use builder::{DEFAULT_USER_AGENT, HttpClientBuilder, TransportSecurity};
pub use client::HttpClient;
pub use error::{HttpError, InvalidUriKind};
pub use request::RequestBuilder;
pub use response::HttpResponse;
