//! Deployment backends
//!
//! [`Containerization`] is the capability every deployment backend implements
//! to realize or tear down a compose definition. Backends are picked when the
//! [`Deployer`] is constructed:
//!
//! - [`ComposeEngine`] drives a local `docker compose` compatible engine
//! - [`RemoteBackend`] talks to a remote deployment API over HTTP
//! - [`MemoryBackend`] records deployments in memory, for tests and dry runs

pub mod engine;
pub mod memory;
pub mod remote;

pub use engine::ComposeEngine;
pub use memory::MemoryBackend;
pub use remote::{RemoteBackend, RemoteConfig};

use crate::compose::ComposeDefinition;
use crate::config::{BackendKind, Settings};
use crate::error::{BerthError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Result bag key: identifier the backend deployed under
pub const RESULT_SERVICE_ID: &str = "service_id";
/// Result bag key: service type that was deployed
pub const RESULT_SERVICE_TYPE: &str = "service_type";
/// Result bag key: RFC 3339 deployment timestamp
pub const RESULT_DEPLOYED_AT: &str = "deployed_at";

/// Capability contract of a deployment backend
///
/// `deploy` on an existing `service_id` updates it in place and never
/// creates a second copy. `destroy` on an unknown `service_id` succeeds.
/// Calls for the same `service_id` are serialized by the implementation;
/// calls for different ids never block each other.
#[async_trait]
pub trait Containerization: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Realize the service described by `configs` and return connection details
    async fn deploy(
        &self,
        service_id: &str,
        service_type: &str,
        configs: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>>;

    /// Tear down the service
    async fn destroy(
        &self,
        service_id: &str,
        service_type: &str,
        configs: &HashMap<String, String>,
    ) -> Result<()>;
}

/// Validate a caller-chosen service id for use as a path and project name
///
/// Only ids that are already valid compose project names are accepted.
pub(crate) fn check_service_id(service_id: &str) -> std::result::Result<(), String> {
    let pattern = regex::Regex::new(r"^[a-z0-9][a-z0-9_-]*$").map_err(|e| e.to_string())?;

    if !pattern.is_match(service_id) {
        return Err(format!("invalid service id '{}'", service_id));
    }

    Ok(())
}

/// Hands compose definitions to an injected backend
#[derive(Clone)]
pub struct Deployer {
    backend: Arc<dyn Containerization>,
}

impl Deployer {
    /// Create a deployer over a backend
    pub fn new(backend: Arc<dyn Containerization>) -> Self {
        Self { backend }
    }

    /// Create a deployer for the backend selected in the settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let backend: Arc<dyn Containerization> = match settings.backend {
            BackendKind::Engine => Arc::new(ComposeEngine::new(
                settings.state_dir.clone(),
                &settings.engine_binary,
                settings.timeout(),
            )),
            BackendKind::Remote => {
                let endpoint = settings.remote_endpoint.clone().ok_or_else(|| {
                    BerthError::InvalidConfig(
                        "remote backend requires remote_endpoint".to_string(),
                    )
                })?;
                Arc::new(RemoteBackend::new(RemoteConfig {
                    endpoint,
                    token: settings.remote_token.clone(),
                    timeout: settings.timeout(),
                })?)
            }
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        };

        Ok(Self::new(backend))
    }

    /// Backend in use
    pub fn backend(&self) -> &Arc<dyn Containerization> {
        &self.backend
    }

    /// Validate and deploy a definition
    pub async fn deploy(
        &self,
        service_id: &str,
        service_type: &str,
        definition: &ComposeDefinition,
    ) -> Result<HashMap<String, String>> {
        definition.validate()?;
        let configs = definition.to_configs()?;

        tracing::info!(
            "Deploying {} ({}) with {} backend",
            service_id,
            service_type,
            self.backend.name()
        );

        self.backend.deploy(service_id, service_type, &configs).await
    }

    /// Destroy a deployment
    pub async fn destroy(&self, service_id: &str, service_type: &str) -> Result<()> {
        tracing::info!(
            "Destroying {} ({}) with {} backend",
            service_id,
            service_type,
            self.backend.name()
        );

        self.backend
            .destroy(service_id, service_type, &HashMap::new())
            .await
    }

    /// Destroy then deploy, recovering from a partially failed deployment
    pub async fn redeploy(
        &self,
        service_id: &str,
        service_type: &str,
        definition: &ComposeDefinition,
    ) -> Result<HashMap<String, String>> {
        self.destroy(service_id, service_type).await?;
        self.deploy(service_id, service_type, definition).await
    }
}
