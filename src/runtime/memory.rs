//! In-memory deployment backend

use super::{
    check_service_id, Containerization, RESULT_DEPLOYED_AT, RESULT_SERVICE_ID,
    RESULT_SERVICE_TYPE,
};
use crate::compose::ComposeDefinition;
use crate::error::{BerthError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A deployment recorded by [`MemoryBackend`]
#[derive(Debug, Clone)]
pub struct DeployedService {
    /// Caller-chosen id
    pub service_id: String,
    /// Service type
    pub service_type: String,
    /// Definition that was deployed
    pub definition: ComposeDefinition,
    /// Number of updates since the first deployment
    pub revision: u64,
    /// Last deployment time
    pub deployed_at: DateTime<Utc>,
}

/// Backend that keeps deployments in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    /// Deployments indexed by service id
    services: Arc<RwLock<HashMap<String, DeployedService>>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a deployment by id
    pub fn get(&self, service_id: &str) -> Result<Option<DeployedService>> {
        let services = self
            .services
            .read()
            .map_err(|_| BerthError::Lock("Failed to acquire read lock".to_string()))?;

        Ok(services.get(service_id).cloned())
    }

    /// Whether an id is deployed
    pub fn is_deployed(&self, service_id: &str) -> Result<bool> {
        Ok(self.get(service_id)?.is_some())
    }

    /// Number of deployments
    pub fn count(&self) -> Result<usize> {
        let services = self
            .services
            .read()
            .map_err(|_| BerthError::Lock("Failed to acquire read lock".to_string()))?;

        Ok(services.len())
    }
}

#[async_trait]
impl Containerization for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn deploy(
        &self,
        service_id: &str,
        service_type: &str,
        configs: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>> {
        check_service_id(service_id).map_err(|e| BerthError::deployment(service_id, e))?;
        let definition = ComposeDefinition::from_configs(configs)
            .and_then(|definition| definition.validate().map(|_| definition))
            .map_err(|e| BerthError::deployment(service_id, e.to_string()))?;

        let mut services = self
            .services
            .write()
            .map_err(|_| BerthError::Lock("Failed to acquire write lock".to_string()))?;

        let revision = services
            .get(service_id)
            .map(|existing| existing.revision + 1)
            .unwrap_or(0);
        let deployed_at = Utc::now();

        let mut result = HashMap::new();
        result.insert(RESULT_SERVICE_ID.to_string(), service_id.to_string());
        result.insert(RESULT_SERVICE_TYPE.to_string(), service_type.to_string());
        result.insert(RESULT_DEPLOYED_AT.to_string(), deployed_at.to_rfc3339());
        result.insert("revision".to_string(), revision.to_string());
        for (name, entry) in &definition.services {
            if let Some(port) = entry.ports.first() {
                result.insert(format!("endpoint.{}", name), format!("localhost:{}", port));
            }
        }

        tracing::debug!("Recorded {} revision {}", service_id, revision);
        services.insert(
            service_id.to_string(),
            DeployedService {
                service_id: service_id.to_string(),
                service_type: service_type.to_string(),
                definition,
                revision,
                deployed_at,
            },
        );

        Ok(result)
    }

    async fn destroy(
        &self,
        service_id: &str,
        _service_type: &str,
        _configs: &HashMap<String, String>,
    ) -> Result<()> {
        let mut services = self
            .services
            .write()
            .map_err(|_| BerthError::Lock("Failed to acquire write lock".to_string()))?;

        if services.remove(service_id).is_none() {
            tracing::debug!("{} is not deployed, nothing to destroy", service_id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ServiceCatalog;
    use crate::compose::Credentials;

    fn cache_configs() -> HashMap<String, String> {
        ServiceCatalog::builtin()
            .build("cache", "mycache", &Credentials::new())
            .unwrap()
            .to_configs()
            .unwrap()
    }

    #[tokio::test]
    async fn test_deploy_returns_endpoint() {
        let backend = MemoryBackend::new();
        let result = backend.deploy("svc-1", "redis", &cache_configs()).await.unwrap();

        assert_eq!(result[RESULT_SERVICE_ID], "svc-1");
        assert_eq!(result["endpoint.mycache"], "localhost:6379");
        assert_eq!(result["revision"], "0");
        assert!(backend.is_deployed("svc-1").unwrap());
    }

    #[tokio::test]
    async fn test_redeploy_is_update() {
        let backend = MemoryBackend::new();
        backend.deploy("svc-1", "redis", &cache_configs()).await.unwrap();
        let result = backend.deploy("svc-1", "redis", &cache_configs()).await.unwrap();

        assert_eq!(result["revision"], "1");
        assert_eq!(backend.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_destroy_unknown_is_noop() {
        let backend = MemoryBackend::new();
        backend
            .destroy("never-deployed", "redis", &HashMap::new())
            .await
            .unwrap();

        backend.deploy("svc-1", "redis", &cache_configs()).await.unwrap();
        backend.destroy("svc-1", "redis", &HashMap::new()).await.unwrap();
        backend.destroy("svc-1", "redis", &HashMap::new()).await.unwrap();
        assert_eq!(backend.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deploy_without_definition_fails() {
        let backend = MemoryBackend::new();
        let result = backend.deploy("svc-1", "redis", &HashMap::new()).await;

        assert!(matches!(result, Err(BerthError::Deployment { .. })));
        assert!(!backend.is_deployed("svc-1").unwrap());
    }

    #[tokio::test]
    async fn test_deploy_validates_definition() {
        let backend = MemoryBackend::new();
        let configs = ComposeDefinition::new()
            .with_service("cache", crate::compose::ServiceEntry::new("", "always"))
            .to_configs()
            .unwrap();

        let result = backend.deploy("svc-1", "redis", &configs).await;

        assert!(matches!(result, Err(BerthError::Deployment { .. })));
        assert!(!backend.is_deployed("svc-1").unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_same_id_deploys_are_serialized() {
        let backend = Arc::new(MemoryBackend::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                backend.deploy("svc-1", "redis", &cache_configs()).await
            }));
        }

        let mut revisions = Vec::new();
        for handle in handles {
            revisions.push(handle.await.unwrap().unwrap()["revision"].clone());
        }
        revisions.sort_by_key(|r| r.parse::<u64>().unwrap());

        let expected: Vec<String> = (0..8).map(|r| r.to_string()).collect();
        assert_eq!(revisions, expected);
        assert_eq!(backend.get("svc-1").unwrap().unwrap().revision, 7);
    }

    #[tokio::test]
    async fn test_concurrent_deploys_do_not_interfere() {
        let backend = Arc::new(MemoryBackend::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                backend
                    .deploy(&format!("svc-{}", i), "redis", &cache_configs())
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(backend.count().unwrap(), 8);
    }
}
