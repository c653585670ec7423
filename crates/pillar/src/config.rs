//! Connection configuration for the document store.

use mongodb::options::ServerAddress;
use serde::{Deserialize, Serialize};

use crate::error::{PillarError, PillarResult};

/// Configuration for connecting to the MongoDB instance that holds pillar
/// documents.
///
/// `host` supports replica sets: list every host in the set, comma-delimited.
/// An entry may carry its own `host:port`; entries without a port use the
/// configured [`port`](MongoConfig::port).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// MongoDB host, or a comma-delimited list of replica set hosts.
    #[serde(default = "default_host")]
    pub host: String,

    /// MongoDB port, applied to host entries without an explicit port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database holding the pillar collections.
    #[serde(default = "default_db")]
    pub db: String,

    /// Username for authentication. Only needed when the store requires
    /// authentication; credentials are attached only when both `user` and
    /// `password` are non-empty.
    #[serde(default)]
    pub user: String,

    /// Password for authentication.
    #[serde(default)]
    pub password: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    27017
}

fn default_db() -> String {
    "pillar".to_string()
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: default_db(),
            user: String::new(),
            password: String::new(),
        }
    }
}

impl MongoConfig {
    /// Creates a configuration from environment variables.
    ///
    /// Reads the following variables:
    /// - `PILLAR_MONGO_HOST` (default: "localhost")
    /// - `PILLAR_MONGO_PORT` (default: 27017)
    /// - `PILLAR_MONGO_DB` (default: "pillar")
    /// - `PILLAR_MONGO_USER`
    /// - `PILLAR_MONGO_PASSWORD`
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("PILLAR_MONGO_HOST").unwrap_or_else(|_| default_host()),
            port: std::env::var("PILLAR_MONGO_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_port),
            db: std::env::var("PILLAR_MONGO_DB").unwrap_or_else(|_| default_db()),
            user: std::env::var("PILLAR_MONGO_USER").unwrap_or_default(),
            password: std::env::var("PILLAR_MONGO_PASSWORD").unwrap_or_default(),
        }
    }

    /// Validates configuration invariants.
    pub fn validate(&self) -> PillarResult<()> {
        if self.host.split(',').all(|h| h.trim().is_empty()) {
            return Err(PillarError::Config {
                message: "host must name at least one server".to_string(),
            });
        }

        if self.db.trim().is_empty() {
            return Err(PillarError::Config {
                message: "db must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Whether credentials should be attached to the connection.
    pub fn has_credentials(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }

    /// Resolves the configured host list into server addresses.
    pub fn server_addresses(&self) -> PillarResult<Vec<ServerAddress>> {
        let mut addresses = Vec::new();
        for entry in self.host.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (host, port) = match entry.rsplit_once(':') {
                Some((host, port)) => {
                    let port = port.parse::<u16>().map_err(|_| PillarError::Config {
                        message: format!("invalid port in host entry '{entry}'"),
                    })?;
                    (host.to_string(), port)
                }
                None => (entry.to_string(), self.port),
            };
            addresses.push(ServerAddress::Tcp {
                host,
                port: Some(port),
            });
        }

        if addresses.is_empty() {
            return Err(PillarError::Config {
                message: "host must name at least one server".to_string(),
            });
        }

        Ok(addresses)
    }
}
