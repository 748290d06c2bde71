// Configuration module
// Loads gateway settings from the config file and environment into typed
// structs. Only `addr` (plus the CLI-provided static root) feeds the core;
// the remaining fields describe external collaborators and are passed along.

use serde::Deserialize;

/// Gateway settings.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Deployment zone identifier.
    #[serde(default)]
    pub zone: String,
    /// Bind address for the HTTP listener. Mandatory; validated by server
    /// construction rather than here so the CLI can report a typed error.
    #[serde(default)]
    pub addr: String,
    /// Maximum log level (`error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default)]
    pub log: Option<String>,
    /// Database connection string, consumed by the migration subsystem.
    #[serde(default)]
    pub dsn: String,
    #[serde(default)]
    pub bus: BusSettings,
    #[serde(default)]
    pub push: PushSettings,
    #[serde(default)]
    pub jwks: JwksSettings,
}

/// Message-bus (pub/sub) endpoint.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BusSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub namespace: String,
}

/// Push-notification service endpoint.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PushSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub namespace: String,
}

/// JWKS endpoint for token validation.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct JwksSettings {
    #[serde(default)]
    pub url: String,
}

impl Settings {
    /// Load settings from `path`, an optional `<path>.local` overlay, and
    /// `APPGATE_`-prefixed environment variables (nested keys separated by
    /// `__`, e.g. `APPGATE_BUS__URL`).
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::File::with_name(&format!("{path}.local")).required(false))
            .add_source(config::Environment::with_prefix("APPGATE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
