//! Notification bus (Redis pub/sub) configuration.

use serde::{Deserialize, Serialize};

/// Redis notification bus configuration.
///
/// All server instances share one fixed topic; the bus carries serialized
/// envelopes between instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Redis host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Redis port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Redis password, if the server requires one.
    #[serde(default)]
    pub password: Option<String>,
    /// Shared pub/sub topic for cross-instance notifications.
    #[serde(default = "default_topic")]
    pub topic: String,
}

impl BusConfig {
    /// Build the Redis connection URL from the host/port/password parts.
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!("redis://:{}@{}:{}", password, self.host, self.port),
            None => format!("redis://{}:{}", self.host, self.port),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            topic: default_topic(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_topic() -> String {
    "notif".to_string()
}
