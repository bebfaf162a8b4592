use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use eureka_client::RegistryConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Prefix for structured overrides, e.g. `EUREKA__LEASE__HEARTBEAT_INTERVAL_SECS=10`.
pub const ENV_PREFIX: &str = "EUREKA__";

/// Plain variables the deployment environment sets, with their config paths.
const BOOTSTRAP_VARS: [(&str, &str); 5] = [
    ("APP_NAME", "app.name"),
    ("APP_LOCAL_IP", "app.local_ip"),
    ("APP_PORT", "app.port"),
    ("APP_HOST_NAME", "app.host_name"),
    ("EUREKA_URL", "registry.uri"),
];

/// Effective agent configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub lease: LeaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The local service being announced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSection {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_local_ip")]
    pub local_ip: String,
    #[serde(default = "default_app_port")]
    pub port: u16,
    /// Defaults to `name` when unset.
    #[serde(default)]
    pub host_name: Option<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            local_ip: default_local_ip(),
            port: default_app_port(),
            host_name: None,
        }
    }
}

fn default_app_name() -> String {
    "UNKNOWN".to_owned()
}

fn default_local_ip() -> String {
    "127.0.0.1".to_owned()
}

const fn default_app_port() -> u16 {
    8000
}

/// What to do when the initial registration is rejected or unreachable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterFailurePolicy {
    /// Exit with an error.
    #[default]
    Abort,
    /// Log and keep going; heartbeats re-register once the registry answers.
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaseConfig {
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Keep renewing until shutdown instead of exiting after the first heartbeat.
    #[serde(default = "default_true")]
    pub keep_alive: bool,
    #[serde(default = "default_true")]
    pub deregister_on_shutdown: bool,
    #[serde(default)]
    pub on_register_failure: RegisterFailurePolicy,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            keep_alive: true,
            deregister_on_shutdown: true,
            on_register_failure: RegisterFailurePolicy::default(),
        }
    }
}

impl LeaseConfig {
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }
}

const fn default_heartbeat_interval_secs() -> u64 {
    30
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub registry_url: Option<String>,
    pub verbose: u8,
}

impl AgentConfig {
    /// Layered load: defaults, then the YAML file (if any), then the
    /// bootstrap variables, then `EUREKA__*` overrides.
    ///
    /// # Errors
    /// Returns an error if a source cannot be read or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(AgentConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(bootstrap_env())
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load agent configuration")
    }

    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(url) = &cli.registry_url {
            self.registry.uri = Some(url.clone());
        }
        match cli.verbose {
            0 => {}
            1 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
    }
}

fn bootstrap_env() -> Env {
    Env::raw()
        .only(&BOOTSTRAP_VARS.map(|(var, _)| var))
        .map(|key| {
            BOOTSTRAP_VARS
                .iter()
                .find(|(var, _)| key.as_str().eq_ignore_ascii_case(var))
                .map_or_else(|| key.into(), |(_, path)| (*path).into())
        })
}
