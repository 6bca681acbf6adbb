//! Compose definition model

use crate::error::{BerthError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Compose file format version written by the builders
pub const COMPOSE_VERSION: &str = "3";

/// Compose document: a version tag and named services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeDefinition {
    /// Compose file version
    #[serde(default = "default_version")]
    pub version: String,
    /// Services by logical name
    #[serde(default)]
    pub services: BTreeMap<String, ServiceEntry>,
}

fn default_version() -> String {
    COMPOSE_VERSION.to_string()
}

impl Default for ComposeDefinition {
    fn default() -> Self {
        Self {
            version: default_version(),
            services: BTreeMap::new(),
        }
    }
}

impl ComposeDefinition {
    /// Create an empty definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a service entry
    pub fn with_service(mut self, name: &str, entry: ServiceEntry) -> Self {
        self.services.insert(name.to_string(), entry);
        self
    }

    /// Get a service entry by name
    pub fn service(&self, name: &str) -> Option<&ServiceEntry> {
        self.services.get(name)
    }

    /// Number of services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the definition has no services
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Check the structural invariants of the definition
    pub fn validate(&self) -> Result<()> {
        let key_pattern = regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$")
            .map_err(|e| BerthError::InvalidDefinition(e.to_string()))?;

        if self.version.trim().is_empty() {
            return Err(BerthError::InvalidDefinition(
                "Compose version must not be empty".to_string(),
            ));
        }

        for (name, entry) in &self.services {
            if name.trim().is_empty() {
                return Err(BerthError::InvalidDefinition(
                    "Service names must not be empty".to_string(),
                ));
            }

            if entry.image.trim().is_empty() {
                return Err(BerthError::InvalidDefinition(format!(
                    "Service '{}' has no image",
                    name
                )));
            }

            for assignment in &entry.environment {
                let (key, _) = assignment.split_once('=').ok_or_else(|| {
                    BerthError::InvalidDefinition(format!(
                        "Service '{}' has malformed environment entry '{}'",
                        name, assignment
                    ))
                })?;

                if !key_pattern.is_match(key) {
                    return Err(BerthError::InvalidDefinition(format!(
                        "Service '{}' has invalid environment key '{}'",
                        name, key
                    )));
                }
            }
        }

        Ok(())
    }
}

/// One service of a compose document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Image reference
    pub image: String,
    /// Restart policy
    #[serde(default)]
    pub restart: String,
    /// Exposed ports
    #[serde(default, deserialize_with = "deserialize_ports")]
    pub ports: Vec<String>,
    /// Environment as KEY=VALUE assignments
    #[serde(default, deserialize_with = "deserialize_environment")]
    pub environment: Vec<String>,
}

impl ServiceEntry {
    /// Create an entry for an image and restart policy
    pub fn new(image: &str, restart: &str) -> Self {
        Self {
            image: image.to_string(),
            restart: restart.to_string(),
            ports: Vec::new(),
            environment: Vec::new(),
        }
    }

    /// Add an exposed port
    pub fn port(mut self, port: &str) -> Self {
        self.ports.push(port.to_string());
        self
    }

    /// Add an environment assignment
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.environment.push(format!("{}={}", key, value));
        self
    }

    /// Value assigned to an environment key
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.environment.iter().find_map(|assignment| {
            assignment
                .split_once('=')
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| v)
        })
    }

    /// Whether an environment key is assigned
    pub fn has_env(&self, key: &str) -> bool {
        self.env_value(key).is_some()
    }
}

/// Port as written in a compose file
#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    /// Quoted form: "6379" or "8080:80"
    Text(String),
    /// Bare number: 6379
    Number(u64),
}

fn deserialize_ports<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ports = Vec::<PortValue>::deserialize(deserializer)?;
    Ok(ports
        .into_iter()
        .map(|p| match p {
            PortValue::Text(s) => s,
            PortValue::Number(n) => n.to_string(),
        })
        .collect())
}

/// Environment as written in a compose file
#[derive(Deserialize)]
#[serde(untagged)]
enum EnvironmentValue {
    /// Array of KEY=value strings
    Array(Vec<String>),
    /// Map of key to value
    Map(BTreeMap<String, Option<serde_yaml::Value>>),
}

fn deserialize_environment<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match EnvironmentValue::deserialize(deserializer)? {
        EnvironmentValue::Array(arr) => Ok(arr),
        EnvironmentValue::Map(map) => Ok(map
            .into_iter()
            .map(|(key, value)| match value {
                Some(serde_yaml::Value::String(s)) => format!("{}={}", key, s),
                Some(serde_yaml::Value::Bool(b)) => format!("{}={}", key, b),
                Some(serde_yaml::Value::Number(n)) => format!("{}={}", key, n),
                _ => format!("{}=", key),
            })
            .collect()),
    }
}
