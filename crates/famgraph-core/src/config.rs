use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{FamGraphError, Result, SeverityThresholds};

/// Connection settings for the bolt graph store.
///
/// The password never comes from a config file default; it must be supplied
/// explicitly or via `FAMGRAPH_NEO4J_PASSWORD`. Any code path that needs the
/// store fails fatally at construction when it is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStoreConfig {
    pub uri: String,
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default = "GraphStoreConfig::default_fetch_size")]
    pub fetch_size: usize,
    #[serde(default = "GraphStoreConfig::default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl GraphStoreConfig {
    fn default_fetch_size() -> usize {
        500
    }

    fn default_connect_timeout_secs() -> u64 {
        10
    }

    pub fn from_env() -> Result<Self> {
        let uri =
            env::var("FAMGRAPH_NEO4J_URI").unwrap_or_else(|_| "bolt://localhost:7687".to_string());
        let user = env::var("FAMGRAPH_NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string());
        let password = env::var("FAMGRAPH_NEO4J_PASSWORD").map_err(|_| {
            FamGraphError::Config(
                "FAMGRAPH_NEO4J_PASSWORD is required to connect to the graph store".to_string(),
            )
        })?;

        Ok(Self {
            uri,
            user,
            password,
            fetch_size: Self::default_fetch_size(),
            connect_timeout_secs: Self::default_connect_timeout_secs(),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            return Err(FamGraphError::Config(
                "graph store password must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            fetch_size: Self::default_fetch_size(),
            connect_timeout_secs: Self::default_connect_timeout_secs(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub graph: GraphStoreConfig,
    /// TTL for cached natural-language responses.
    #[serde(default = "EngineConfig::default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Upper bound on one language-model call before the router falls back.
    #[serde(default = "EngineConfig::default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    #[serde(default)]
    pub thresholds: SeverityThresholds,
}

impl EngineConfig {
    fn default_cache_ttl_secs() -> u64 {
        300
    }

    fn default_llm_timeout_secs() -> u64 {
        30
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            graph: GraphStoreConfig::default(),
            cache_ttl_secs: Self::default_cache_ttl_secs(),
            llm_timeout_secs: Self::default_llm_timeout_secs(),
            thresholds: SeverityThresholds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_password_is_a_config_error() {
        let config = GraphStoreConfig::default();
        assert!(matches!(
            config.validate(),
            Err(FamGraphError::Config(_))
        ));
    }

    #[test]
    fn engine_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.llm_timeout(), Duration::from_secs(30));
    }
}
