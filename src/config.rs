use crate::error::{LoadBalancerError, Result};
use crate::server::{Server, ServerPool, DEFAULT_WEIGHT};
use crate::strategy::StrategyKind;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Strategy the driver runs. All of them when unset.
    #[serde(default)]
    pub strategy: Option<StrategyKind>,
    pub servers: Vec<ServerConfig>,
    /// Client identifiers the driver replays against key-affine strategies.
    #[serde(default)]
    pub client_keys: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub address: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.servers.is_empty() {
            return Err(LoadBalancerError::ConfigError(
                "at least one server is required".to_string(),
            ));
        }
        if let Some(server) = self.servers.iter().find(|s| s.address.trim().is_empty()) {
            return Err(LoadBalancerError::ConfigError(format!(
                "server with weight {} has an empty address",
                server.weight
            )));
        }
        Ok(())
    }

    pub fn pool(&self) -> ServerPool {
        self.servers
            .iter()
            .map(|s| Server::with_weight(s.address.clone(), s.weight))
            .collect()
    }
}
