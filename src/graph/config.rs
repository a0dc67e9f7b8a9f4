//! Store configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Whether several edges may run between the same ordered pair of nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMultiplicity {
    /// Multigraph: parallel edges are allowed
    #[default]
    Parallel,
    /// At most one edge per ordered pair
    Unique,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Parallel edge policy
    pub edge_multiplicity: EdgeMultiplicity,
    /// Initial node slot capacity
    pub node_capacity: usize,
    /// Initial edge slot capacity
    pub edge_capacity: usize,
    /// Initial graph slot capacity
    pub graph_capacity: usize,
    /// Name given to nodes created without one
    pub default_node_name: String,
    /// Name given to graphs created without one
    pub default_graph_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            edge_multiplicity: EdgeMultiplicity::Parallel,
            node_capacity: 1024,
            edge_capacity: 4096,
            graph_capacity: 16,
            default_node_name: "DEFAULT_NODE_NAME".to_string(),
            default_graph_name: "DEFAULT_GRAPH_NAME".to_string(),
        }
    }
}

impl StoreConfig {
    /// Parse a YAML document; missing keys take their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn with_edge_multiplicity(mut self, multiplicity: EdgeMultiplicity) -> Self {
        self.edge_multiplicity = multiplicity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.edge_multiplicity, EdgeMultiplicity::Parallel);
        assert_eq!(config.node_capacity, 1024);
        assert_eq!(config.edge_capacity, 4096);
        assert_eq!(config.graph_capacity, 16);
        assert_eq!(config.default_node_name, "DEFAULT_NODE_NAME");
    }

    #[test]
    fn test_partial_yaml() {
        let config =
            StoreConfig::from_yaml_str("edge_multiplicity: unique\nnode_capacity: 16\ngraph_capacity: 2\n").unwrap();
        assert_eq!(config.edge_multiplicity, EdgeMultiplicity::Unique);
        assert_eq!(config.node_capacity, 16);
        assert_eq!(config.graph_capacity, 2);
        assert_eq!(config.edge_capacity, 4096);
        assert_eq!(config.default_graph_name, "DEFAULT_GRAPH_NAME");
    }

    #[test]
    fn test_invalid_yaml() {
        let result = StoreConfig::from_yaml_str("edge_multiplicity: sometimes\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::default().with_edge_multiplicity(EdgeMultiplicity::Unique);
        assert_eq!(config.edge_multiplicity, EdgeMultiplicity::Unique);
    }
}
