//! # Node Configuration
//!
//! The daemon reads one TOML file describing the scheduler settings, the
//! node's role and the service tree.
//!
//! ## Format
//!
//! ```toml
//! [scheduler]
//! port = 7400
//! idle_poll_timeout_ms = 250
//! initial_groups = ["system"]
//!
//! [node]
//! master = false
//!
//! [restart]
//! ring_size = 3
//! window_secs = 60
//!
//! [[services]]
//! name = "db"
//! groups = ["system"]
//!
//! [[services]]
//! name = "api"
//! parent = "db"
//! groups = ["group2"]
//! roles = ["master"]
//! ring_size = 5
//! ```
//!
//! A service without `parent` hangs off the tree root. Parents must be
//! declared before their children.

use core_types::{Duration, Filter};
use node_api::{RestartHistory, Service, ServiceTree};
use serde::{Deserialize, Serialize};
use services_scheduler::SchedulerConfig;
use sim_node::MemoryServiceTree;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Name of the structural root of every configured tree
pub const ROOT_NAME: &str = "root";

/// Longest restart window a service may be configured with (one week)
pub const MAX_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Role of this node in the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Whether the node starts out holding the master role
    pub master: bool,
}

/// Restart ring defaults applied to services that do not override them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartSection {
    pub ring_size: usize,
    pub window_secs: u64,
}

impl Default for RestartSection {
    fn default() -> Self {
        Self {
            ring_size: 3,
            window_secs: 60,
        }
    }
}

fn default_groups() -> Vec<String> {
    vec!["system".to_string()]
}

fn default_roles() -> Vec<String> {
    vec!["any-node".to_string()]
}

/// One managed service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default = "default_groups")]
    pub groups: Vec<String>,
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    #[serde(default)]
    pub ring_size: Option<usize>,
    #[serde(default)]
    pub window_secs: Option<u64>,
}

impl ServiceEntry {
    /// Combines the entry's roles and groups into its membership filter
    pub fn filter(&self) -> Result<Filter, ConfigError> {
        let mut filter = Filter::NONE;
        for role in &self.roles {
            let bit = parse_name(&self.name, role)?;
            if bit.roles().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "service {}: {} is not a role",
                    self.name, role
                )));
            }
            filter |= bit;
        }
        for group in &self.groups {
            let bit = parse_name(&self.name, group)?;
            if bit.groups().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "service {}: {} is not a group",
                    self.name, group
                )));
            }
            filter |= bit;
        }
        Ok(filter)
    }
}

fn parse_name(service: &str, name: &str) -> Result<Filter, ConfigError> {
    name.parse()
        .map_err(|err| ConfigError::Validation(format!("service {}: {}", service, err)))
}

/// Complete node configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub scheduler: SchedulerConfig,
    pub node: NodeSection,
    pub restart: RestartSection,
    pub services: Vec<ServiceEntry>,
}

impl NodeConfig {
    /// Loads and validates a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses and validates a configuration string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for mistakes the tree builder cannot recover from
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler
            .validate()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;

        if self.restart.ring_size == 0 {
            return Err(ConfigError::Validation(
                "restart.ring_size must be at least 1".to_string(),
            ));
        }
        check_window("restart.window_secs", self.restart.window_secs)?;

        let mut seen: Vec<&str> = vec![ROOT_NAME];
        for entry in &self.services {
            if seen.contains(&entry.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate service name: {}",
                    entry.name
                )));
            }
            if let Some(parent) = &entry.parent {
                if !seen.contains(&parent.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "service {}: parent {} is not declared before it",
                        entry.name, parent
                    )));
                }
            }
            if entry.ring_size == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "service {}: ring_size must be at least 1",
                    entry.name
                )));
            }
            if let Some(window_secs) = entry.window_secs {
                check_window(&format!("service {}: window_secs", entry.name), window_secs)?;
            }
            entry.filter()?;
            seen.push(&entry.name);
        }
        Ok(())
    }

    /// Builds the service tree described by `[[services]]`
    pub fn build_tree(&self) -> Result<MemoryServiceTree, ConfigError> {
        let mut tree = MemoryServiceTree::new(ROOT_NAME);
        let mut ids = HashMap::new();
        ids.insert(ROOT_NAME.to_string(), tree.root());

        for entry in &self.services {
            let parent_name = entry.parent.as_deref().unwrap_or(ROOT_NAME);
            let parent = ids.get(parent_name).copied().ok_or_else(|| {
                ConfigError::Validation(format!(
                    "service {}: unknown parent {}",
                    entry.name, parent_name
                ))
            })?;

            let ring_size = entry.ring_size.unwrap_or(self.restart.ring_size);
            let window = Duration::from_secs(entry.window_secs.unwrap_or(self.restart.window_secs));
            let service = Service::new(
                entry.name.clone(),
                entry.filter()?,
                RestartHistory::new(ring_size, window),
            );

            let id = tree
                .add_service(parent, service)
                .map_err(|err| ConfigError::Validation(err.to_string()))?;
            ids.insert(entry.name.clone(), id);
        }
        Ok(tree)
    }
}

fn check_window(field: &str, window_secs: u64) -> Result<(), ConfigError> {
    if window_secs > MAX_WINDOW_SECS {
        return Err(ConfigError::Validation(format!(
            "{} must be at most {}",
            field, MAX_WINDOW_SECS
        )));
    }
    Ok(())
}
