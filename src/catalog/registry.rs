//! Service catalog registry

use super::builtin::builtin_specs;
use super::spec::ServiceTypeSpec;
use crate::compose::builder::{self, Credentials};
use crate::compose::ComposeDefinition;
use crate::error::{BerthError, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Registry of known service types, keyed by id with an alias index
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    /// Specs by canonical id
    specs: BTreeMap<String, ServiceTypeSpec>,
    /// Alias to canonical id
    aliases: HashMap<String, String>,
}

impl ServiceCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the built-in service types
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for spec in builtin_specs() {
            // Built-in ids and aliases are disjoint.
            if let Err(e) = catalog.register(spec) {
                tracing::warn!("Skipping built-in service type: {}", e);
            }
        }
        catalog
    }

    /// Process-wide catalog of built-in service types
    pub fn builtin() -> &'static ServiceCatalog {
        static CATALOG: OnceLock<ServiceCatalog> = OnceLock::new();
        CATALOG.get_or_init(ServiceCatalog::with_builtins)
    }

    /// Register a service type, replacing any previous spec with the same id
    pub fn register(&mut self, spec: ServiceTypeSpec) -> Result<()> {
        if spec.id.is_empty() {
            return Err(BerthError::InvalidConfig(
                "Service type id must not be empty".to_string(),
            ));
        }

        if let Some(owner) = self.aliases.get(&spec.id) {
            return Err(BerthError::InvalidConfig(format!(
                "Service type id '{}' is already an alias of '{}'",
                spec.id, owner
            )));
        }

        for alias in &spec.aliases {
            let taken_by_id = alias != &spec.id && self.specs.contains_key(alias);
            let taken_by_alias = self
                .aliases
                .get(alias)
                .is_some_and(|owner| owner != &spec.id);

            if taken_by_id || taken_by_alias {
                return Err(BerthError::InvalidConfig(format!(
                    "Alias '{}' of '{}' is already registered",
                    alias, spec.id
                )));
            }
        }

        if let Some(previous) = self.specs.remove(&spec.id) {
            for alias in previous.aliases {
                self.aliases.remove(&alias);
            }
        }

        for alias in &spec.aliases {
            self.aliases.insert(alias.clone(), spec.id.clone());
        }

        tracing::debug!("Registered service type {}", spec.id);
        self.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    /// Look up a service type by id or alias
    pub fn get(&self, service_type: &str) -> Option<&ServiceTypeSpec> {
        self.specs.get(service_type).or_else(|| {
            self.aliases
                .get(service_type)
                .and_then(|id| self.specs.get(id))
        })
    }

    /// Look up a service type, failing for unknown identifiers
    pub fn resolve(&self, service_type: &str) -> Result<&ServiceTypeSpec> {
        self.get(service_type)
            .ok_or_else(|| BerthError::UnknownService(service_type.to_string()))
    }

    /// Whether the identifier names a known service type
    pub fn contains(&self, service_type: &str) -> bool {
        self.get(service_type).is_some()
    }

    /// All service types ordered by id
    pub fn list(&self) -> Vec<&ServiceTypeSpec> {
        self.specs.values().collect()
    }

    /// Number of registered service types
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Resolve a service type and build its compose definition
    pub fn build(
        &self,
        service_type: &str,
        name: &str,
        credentials: &Credentials,
    ) -> Result<ComposeDefinition> {
        let spec = self.resolve(service_type)?;
        Ok(builder::build(spec, name, credentials))
    }
}
