//! Server configuration, read from the environment.

use sesam_auth::AuthConfig;
use sesam_store::{KvConfig, PgConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub listen_addr: String,
    pub pg: PgConfig,
    pub kv: KvConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Assemble the configuration from environment variables, falling
    /// back to local-development defaults.
    ///
    /// - `SESAM_ENV`: `production` or anything else (development)
    /// - `SESAM_LISTEN_ADDR`: bind address, default `0.0.0.0:8080`
    /// - `DATABASE_URL`, `REDIS_URL`: store endpoints
    /// - `SESAM_PEPPER`: optional password pepper
    pub fn from_env() -> Self {
        let environment = match std::env::var("SESAM_ENV").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        };

        let mut pg = PgConfig::default();
        if let Ok(url) = std::env::var("DATABASE_URL") {
            pg.url = url;
        }

        let mut kv = KvConfig::default();
        if let Ok(url) = std::env::var("REDIS_URL") {
            kv.url = url;
        }

        Self {
            environment,
            listen_addr: std::env::var("SESAM_LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".into()),
            pg,
            kv,
            auth: AuthConfig {
                pepper: std::env::var("SESAM_PEPPER").ok(),
            },
        }
    }
}
