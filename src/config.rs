//! Engine and server configuration
//!
//! Every field has a default, so an empty TOML file (or none at all) gives a
//! working 3-dimensional HNSW engine listening on port 7878.
//!
//! ```toml
//! [engine]
//! dimension = 3
//! metric = "squared_l2"
//! strategy = "hnsw"
//!
//! [engine.hnsw]
//! m = 16
//! ef_construction = 200
//! ef_search = 50
//!
//! [server]
//! bind = "127.0.0.1:7878"
//! ```

use crate::error::{Result, VecError};
use crate::vector::Metric;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// HNSW construction and search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswConfig {
    /// Maximum neighbors per node per layer.
    pub m: usize,
    pub ef_construction: usize,
    /// Default candidate list size for queries.
    pub ef_search: usize,
    /// Highest layer a node can be promoted to.
    pub max_level: usize,
    /// Seed for layer assignment.
    pub seed: u64,
}

impl Default for HnswConfig {
    fn default() -> Self {
        HnswConfig {
            m: 16,
            ef_construction: 200,
            ef_search: 50,
            max_level: 16,
            seed: 42,
        }
    }
}

impl HnswConfig {
    pub fn validate(&self) -> Result<()> {
        if self.m < 2 {
            return Err(VecError::InvalidConfig(format!("m must be at least 2, got {}", self.m)));
        }
        if self.ef_construction == 0 {
            return Err(VecError::InvalidConfig("ef_construction must be positive".to_string()));
        }
        if self.ef_search == 0 {
            return Err(VecError::InvalidConfig("ef_search must be positive".to_string()));
        }
        Ok(())
    }
}

/// Which index backs the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStrategy {
    /// Exact linear scan.
    Flat,
    #[default]
    Hnsw,
}

impl IndexStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            IndexStrategy::Flat => "flat",
            IndexStrategy::Hnsw => "hnsw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dimension: usize,
    pub metric: Metric,
    pub strategy: IndexStrategy,
    pub hnsw: HnswConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            dimension: 3,
            metric: Metric::default(),
            strategy: IndexStrategy::default(),
            hnsw: HnswConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_dimension(dimension: usize) -> Self {
        EngineConfig { dimension, ..Default::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(VecError::InvalidDimension);
        }
        self.hnsw.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { bind: "0.0.0.0:7878".to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub server: ServerConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Config> {
        let config: Config = toml::from_str(text).map_err(|e| VecError::Config(e.to_string()))?;
        config.engine.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| VecError::Config(format!("cannot read '{}': {}", path.display(), e)))?;
        Config::from_toml_str(&text)
    }
}

#[cfg(test)]
mod config_test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.dimension, 3);
        assert_eq!(config.engine.metric, Metric::SquaredL2);
        assert_eq!(config.engine.strategy, IndexStrategy::Hnsw);
        assert_eq!(config.engine.hnsw.m, 16);
        assert_eq!(config.engine.hnsw.ef_construction, 200);
        assert_eq!(config.engine.hnsw.ef_search, 50);
        assert_eq!(config.server.bind, "0.0.0.0:7878");
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            [engine]
            dimension = 8
            metric = "cosine"
            strategy = "flat"

            [engine.hnsw]
            ef_search = 10

            [server]
            bind = "127.0.0.1:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.dimension, 8);
        assert_eq!(config.engine.metric, Metric::Cosine);
        assert_eq!(config.engine.strategy, IndexStrategy::Flat);
        assert_eq!(config.engine.hnsw.ef_search, 10);
        assert_eq!(config.engine.hnsw.m, 16);
        assert_eq!(config.server.bind, "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_dim = Config::from_toml_str("[engine]\ndimension = 0\n");
        assert!(matches!(zero_dim, Err(VecError::InvalidDimension)));

        let small_m = Config::from_toml_str("[engine.hnsw]\nm = 1\n");
        assert!(matches!(small_m, Err(VecError::InvalidConfig(_))));

        let bad_metric = Config::from_toml_str("[engine]\nmetric = \"manhattan\"\n");
        assert!(matches!(bad_metric, Err(VecError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("definitely_missing_config.toml");
        assert!(matches!(result, Err(VecError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annvec.toml");
        std::fs::write(&path, "[engine]\ndimension = 5\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.engine.dimension, 5);
    }
}
