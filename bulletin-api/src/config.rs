use serde::Deserialize;
use std::{net::IpAddr, time::Duration};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

/// Process configuration, read from the environment.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct Env {
    pub server_address: IpAddr,
    pub server_port: u16,
    pub database_url: Option<String>,
    #[serde(default)]
    pub storage_backend: StorageBackend,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_shutdown_timeout_secs() -> u64 {
    3
}

impl Env {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// How long in-flight requests may keep running after a shutdown signal.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
