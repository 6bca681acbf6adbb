//! Definition builder
//!
//! Maps a catalog entry, a logical service name and optional credentials to a
//! compose definition. Blank credentials fall back to the catalog defaults,
//! each field independently.

use super::definition::{ComposeDefinition, ServiceEntry};
use crate::catalog::spec::{CredentialField, EnvRule, ServiceTypeSpec};
use serde::{Deserialize, Serialize};

/// Optional credentials supplied by the caller
///
/// `None` and an empty string both mean "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// User name, defaults to the catalog's user for the service type
    #[serde(default)]
    pub username: Option<String>,
    /// Password, defaults to the catalog's password for the service type
    #[serde(default)]
    pub password: Option<String>,
    /// Database name, defaults to the catalog's database for the service type
    #[serde(default)]
    pub database: Option<String>,
}

impl Credentials {
    /// No credentials supplied
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user name
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the database name
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Supplied, non-empty value of a field
    pub fn get(&self, field: CredentialField) -> Option<&str> {
        let value = match field {
            CredentialField::Username => self.username.as_deref(),
            CredentialField::Password => self.password.as_deref(),
            CredentialField::Database => self.database.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Build the service entry for a catalog type
pub fn build_entry(spec: &ServiceTypeSpec, credentials: &Credentials) -> ServiceEntry {
    let mut entry = ServiceEntry::new(&spec.image, &spec.restart).port(&spec.port);

    for rule in &spec.environment {
        let (key, value) = resolve_rule(rule, credentials);
        entry = entry.env(key, value);
    }

    entry
}

/// Build a single-service compose definition for a catalog type
pub fn build(spec: &ServiceTypeSpec, name: &str, credentials: &Credentials) -> ComposeDefinition {
    tracing::debug!("Building {} definition for service {}", spec.id, name);
    ComposeDefinition::new().with_service(name, build_entry(spec, credentials))
}

fn resolve_rule<'a>(rule: &'a EnvRule, credentials: &'a Credentials) -> (&'a str, &'a str) {
    match rule {
        EnvRule::Fixed { key, value } => (key.as_str(), value.as_str()),
        EnvRule::Credential {
            key,
            field,
            default,
        } => (
            key.as_str(),
            credentials.get(*field).unwrap_or(default.as_str()),
        ),
        EnvRule::Presence {
            field,
            present_key,
            absent_key,
            absent_value,
        } => match credentials.get(*field) {
            Some(value) => (present_key.as_str(), value),
            None => (absent_key.as_str(), absent_value.as_str()),
        },
    }
}
