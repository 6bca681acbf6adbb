//! Service type specifications

use serde::{Deserialize, Serialize};

/// Default restart policy for catalog services
pub const DEFAULT_RESTART_POLICY: &str = "unless-stopped";

/// Credential slot a caller may fill in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialField {
    /// Admin or application user name
    Username,
    /// Admin or application password
    Password,
    /// Initial database name
    Database,
}

impl std::fmt::Display for CredentialField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialField::Username => write!(f, "username"),
            CredentialField::Password => write!(f, "password"),
            CredentialField::Database => write!(f, "database"),
        }
    }
}

/// How one environment variable of a service is derived
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvRule {
    /// Always emitted as `key=value`
    Fixed { key: String, value: String },
    /// Emitted as `key=<supplied value or default>`
    Credential {
        key: String,
        field: CredentialField,
        default: String,
    },
    /// Emits `present_key=<value>` when the credential is supplied,
    /// `absent_key=absent_value` otherwise
    Presence {
        field: CredentialField,
        present_key: String,
        absent_key: String,
        absent_value: String,
    },
}

impl EnvRule {
    /// Constant assignment
    pub fn fixed(key: &str, value: &str) -> Self {
        EnvRule::Fixed {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Credential assignment with a fallback value
    pub fn credential(key: &str, field: CredentialField, default: &str) -> Self {
        EnvRule::Credential {
            key: key.to_string(),
            field,
            default: default.to_string(),
        }
    }

    /// Key switch driven by whether a credential was supplied
    pub fn presence(
        field: CredentialField,
        present_key: &str,
        absent_key: &str,
        absent_value: &str,
    ) -> Self {
        EnvRule::Presence {
            field,
            present_key: present_key.to_string(),
            absent_key: absent_key.to_string(),
            absent_value: absent_value.to_string(),
        }
    }

    /// Credential slot this rule reads, if any
    pub fn field(&self) -> Option<CredentialField> {
        match self {
            EnvRule::Fixed { .. } => None,
            EnvRule::Credential { field, .. } | EnvRule::Presence { field, .. } => Some(*field),
        }
    }
}

/// Catalog entry describing a supported service type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTypeSpec {
    /// Canonical identifier
    pub id: String,
    /// Alternative identifiers resolving to this type
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Default image reference
    pub image: String,
    /// Default exposed port
    pub port: String,
    /// Default restart policy
    pub restart: String,
    /// Environment rules, in emission order
    #[serde(default)]
    pub environment: Vec<EnvRule>,
}

impl ServiceTypeSpec {
    /// Create a new spec with the default restart policy and no environment
    pub fn new(id: &str, image: &str, port: &str) -> Self {
        Self {
            id: id.to_string(),
            aliases: Vec::new(),
            description: String::new(),
            image: image.to_string(),
            port: port.to_string(),
            restart: DEFAULT_RESTART_POLICY.to_string(),
            environment: Vec::new(),
        }
    }

    /// Add an alias
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Set the description
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Set the restart policy
    pub fn restart(mut self, restart: &str) -> Self {
        self.restart = restart.to_string();
        self
    }

    /// Append an environment rule
    pub fn env(mut self, rule: EnvRule) -> Self {
        self.environment.push(rule);
        self
    }

    /// Whether `name` is the id or one of the aliases
    pub fn matches(&self, name: &str) -> bool {
        self.id == name || self.aliases.iter().any(|a| a == name)
    }

    /// Default value declared for a credential slot, if any
    pub fn default_credential(&self, field: CredentialField) -> Option<&str> {
        self.environment.iter().find_map(|rule| match rule {
            EnvRule::Credential {
                field: f, default, ..
            } if *f == field => Some(default.as_str()),
            _ => None,
        })
    }

    /// Credential slots used by this service type
    pub fn credential_fields(&self) -> Vec<CredentialField> {
        let mut fields = Vec::new();
        for field in self.environment.iter().filter_map(EnvRule::field) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder_defaults() {
        let spec = ServiceTypeSpec::new("redis", "bitnami/redis:6.2.4", "6379").alias("cache");

        assert_eq!(spec.restart, DEFAULT_RESTART_POLICY);
        assert!(spec.matches("redis"));
        assert!(spec.matches("cache"));
        assert!(!spec.matches("grafana"));
    }

    #[test]
    fn test_credential_fields_deduplicated() {
        let spec = ServiceTypeSpec::new("mysql", "mysql:8.0", "3306")
            .env(EnvRule::credential("MYSQL_ROOT_PASSWORD", CredentialField::Password, "root"))
            .env(EnvRule::credential("MYSQL_USER", CredentialField::Username, "app"))
            .env(EnvRule::credential("MYSQL_PASSWORD", CredentialField::Password, "root"))
            .env(EnvRule::fixed("TZ", "UTC"));

        assert_eq!(
            spec.credential_fields(),
            vec![CredentialField::Password, CredentialField::Username]
        );
        assert_eq!(spec.default_credential(CredentialField::Username), Some("app"));
        assert_eq!(spec.default_credential(CredentialField::Database), None);
    }

    #[test]
    fn test_env_rule_serialization() {
        let rule = EnvRule::presence(
            CredentialField::Password,
            "REDIS_PASSWORD",
            "ALLOW_EMPTY_PASSWORD",
            "yes",
        );

        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains("\"kind\":\"presence\""));
        assert!(json.contains("\"field\":\"password\""));
    }
}
