use std::str::FromStr;

use crate::graph::GatewaySettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Process settings, read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub nats_url: String,
    pub graph: GatewaySettings,
    pub run_migrations: bool,
    pub loki_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &'static str| lookup(name).filter(|value| !value.is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            max_connections: parsed(var("MAX_CONNECTIONS"), "MAX_CONNECTIONS", 10)?,
            nats_url: required("NATS_URL")?,
            graph: GatewaySettings {
                gateway_url: required("NEBULA_GATEWAY_URL")?,
                graph_host: var("NEBULA_GRAPH_HOST").unwrap_or_else(|| "localhost".to_string()),
                graph_port: parsed(var("NEBULA_GRAPH_PORT"), "NEBULA_GRAPH_PORT", 9669)?,
                user: var("NEBULA_USER").unwrap_or_else(|| "root".to_string()),
                password: var("NEBULA_PASSWORD").unwrap_or_else(|| "nebula".to_string()),
            },
            run_migrations: flag(var("RUN_MIGRATIONS"), "RUN_MIGRATIONS", true)?,
            loki_url: var("LOKI_URL"),
        })
    }
}

fn parsed<T: FromStr>(
    value: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn flag(value: Option<String>, name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };

    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}
