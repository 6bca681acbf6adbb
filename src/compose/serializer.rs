//! Compose document serializer and parser

use super::definition::ComposeDefinition;
use crate::error::{BerthError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config bag key holding the YAML document
pub const CONFIG_DEFINITION: &str = "definition";
/// Config bag key holding the compose version
pub const CONFIG_VERSION: &str = "version";

/// Default compose file names
pub const DEFAULT_COMPOSE_FILES: &[&str] = &[
    "compose.yaml",
    "compose.yml",
    "docker-compose.yaml",
    "docker-compose.yml",
];

impl ComposeDefinition {
    /// Render the definition as a YAML compose document
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| BerthError::Serialization(e.to_string()))
    }

    /// Render the definition as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| BerthError::Serialization(e.to_string()))
    }

    /// Parse a YAML compose document
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| BerthError::ComposeParse(format!("Failed to parse YAML: {}", e)))
    }

    /// Parse a compose file from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BerthError::ComposeParse(format!("Failed to read file: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// Render the definition for a compose engine
    ///
    /// Compose interpolates `$` in values, so every literal `$` is written as
    /// `$$` and the container sees exactly the value that was built.
    pub fn to_compose_yaml(&self) -> Result<String> {
        self.map_values(|value| value.replace('$', "$$")).to_yaml()
    }

    /// Parse a document written by [`ComposeDefinition::to_compose_yaml`]
    pub fn from_compose_yaml(content: &str) -> Result<Self> {
        Ok(Self::from_yaml(content)?.map_values(|value| value.replace("$$", "$")))
    }

    fn map_values(&self, f: impl Fn(&str) -> String) -> Self {
        let mut definition = self.clone();
        for entry in definition.services.values_mut() {
            entry.image = f(&entry.image);
            entry.restart = f(&entry.restart);
            for value in entry.ports.iter_mut().chain(entry.environment.iter_mut()) {
                *value = f(value);
            }
        }
        definition
    }

    /// Key/value form handed to deployment backends
    pub fn to_configs(&self) -> Result<HashMap<String, String>> {
        let mut configs = HashMap::new();
        configs.insert(CONFIG_DEFINITION.to_string(), self.to_yaml()?);
        configs.insert(CONFIG_VERSION.to_string(), self.version.clone());

        for (name, entry) in &self.services {
            configs.insert(format!("service.{}.image", name), entry.image.clone());
            configs.insert(format!("service.{}.ports", name), entry.ports.join(","));
        }

        Ok(configs)
    }

    /// Recover the definition from a backend config bag
    pub fn from_configs(configs: &HashMap<String, String>) -> Result<Self> {
        let content = configs.get(CONFIG_DEFINITION).ok_or_else(|| {
            BerthError::InvalidDefinition(format!("Missing '{}' config", CONFIG_DEFINITION))
        })?;

        Self::from_yaml(content)
    }
}

/// Find a compose file in a directory
pub fn find_compose_file(dir: &Path) -> Option<PathBuf> {
    DEFAULT_COMPOSE_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::definition::ServiceEntry;

    fn grafana_definition() -> ComposeDefinition {
        ComposeDefinition::new().with_service(
            "grafana",
            ServiceEntry::new("grafana/grafana:8.0.3", "unless-stopped")
                .port("3000")
                .env("GF_SECURITY_ADMIN_USER", "grafana1")
                .env("GF_SECURITY_ADMIN_PASSWORD", "grafana2")
                .env("GF_USERS_ALLOW_SIGN_UP", "false"),
        )
    }

    #[test]
    fn test_yaml_layout() {
        let yaml = grafana_definition().to_yaml().unwrap();

        assert!(yaml.starts_with("version:"));
        assert!(yaml.contains("image: grafana/grafana:8.0.3"));
        assert!(yaml.contains("restart: unless-stopped"));
        assert!(yaml.contains("3000"));
        assert!(yaml.contains("- GF_USERS_ALLOW_SIGN_UP=false"));

        let image = yaml.find("image:").unwrap();
        let restart = yaml.find("restart:").unwrap();
        let ports = yaml.find("ports:").unwrap();
        let environment = yaml.find("environment:").unwrap();
        assert!(image < restart && restart < ports && ports < environment);
    }

    #[test]
    fn test_empty_definition_serializes() {
        let yaml = ComposeDefinition::new().to_yaml().unwrap();
        let parsed = ComposeDefinition::from_yaml(&yaml).unwrap();

        assert!(yaml.contains("services: {}"));
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_parse_foreign_compose() {
        let yaml = r#"
version: "3.8"
services:
  web:
    image: nginx:latest
    ports:
      - 80
      - "8443:443"
  db:
    image: postgres:13
    environment:
      POSTGRES_PASSWORD: secret
      POSTGRES_PORT: 5432
"#;

        let definition = ComposeDefinition::from_yaml(yaml).unwrap();
        assert_eq!(definition.version, "3.8");
        assert_eq!(definition.services["web"].ports, vec!["80", "8443:443"]);
        assert_eq!(
            definition.services["db"].env_value("POSTGRES_PASSWORD"),
            Some("secret")
        );
        assert_eq!(definition.services["db"].env_value("POSTGRES_PORT"), Some("5432"));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = ComposeDefinition::from_yaml("services: [unterminated");
        assert!(matches!(result, Err(BerthError::ComposeParse(_))));
    }

    #[test]
    fn test_configs_carry_definition() {
        let definition = grafana_definition();
        let configs = definition.to_configs().unwrap();

        assert_eq!(configs[CONFIG_VERSION], "3");
        assert_eq!(configs["service.grafana.image"], "grafana/grafana:8.0.3");
        assert_eq!(configs["service.grafana.ports"], "3000");
        assert_eq!(ComposeDefinition::from_configs(&configs).unwrap(), definition);
    }

    #[test]
    fn test_compose_yaml_escapes_dollar() {
        let definition = ComposeDefinition::new().with_service(
            "cache",
            ServiceEntry::new("bitnami/redis:latest", "unless-stopped")
                .env("REDIS_PASSWORD", "a$b${c}"),
        );

        let plain = definition.to_yaml().unwrap();
        let compose = definition.to_compose_yaml().unwrap();
        assert!(plain.contains("REDIS_PASSWORD=a$b${c}"));
        assert!(compose.contains("REDIS_PASSWORD=a$$b$${c}"));
        assert_eq!(ComposeDefinition::from_compose_yaml(&compose).unwrap(), definition);
    }

    #[test]
    fn test_configs_without_definition() {
        let configs = HashMap::new();
        assert!(ComposeDefinition::from_configs(&configs).is_err());
    }

    #[test]
    fn test_find_compose_file() {
        let temp = tempfile::tempdir().unwrap();
        assert!(find_compose_file(temp.path()).is_none());

        std::fs::write(temp.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        assert_eq!(
            find_compose_file(temp.path()),
            Some(temp.path().join("docker-compose.yml"))
        );
    }
}
