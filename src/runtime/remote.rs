//! Remote deployment API backend

use super::{check_service_id, Containerization};
use crate::error::{BerthError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Remote API configuration
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the deployment API
    pub endpoint: String,
    /// Bearer token
    pub token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

/// Deployment request body
#[derive(Debug, Serialize)]
struct DeployRequest<'a> {
    service_type: &'a str,
    configs: &'a HashMap<String, String>,
}

/// Backend delegating to a remote deployment API
///
/// `PUT {endpoint}/api/v1/services/{id}` creates or updates a deployment and
/// answers with a JSON object of strings. `DELETE` on the same path removes
/// it; a `404` answer counts as already removed.
pub struct RemoteBackend {
    /// API configuration
    config: RemoteConfig,
    /// HTTP client
    client: reqwest::Client,
}

impl RemoteBackend {
    /// Create a new remote backend
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BerthError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn service_url(&self, service_id: &str) -> String {
        format!(
            "{}/api/v1/services/{}",
            self.config.endpoint.trim_end_matches('/'),
            service_id
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.token {
            Some(ref token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }
}

#[async_trait]
impl Containerization for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    async fn deploy(
        &self,
        service_id: &str,
        service_type: &str,
        configs: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>> {
        check_service_id(service_id).map_err(|e| BerthError::deployment(service_id, e))?;

        let body = DeployRequest {
            service_type,
            configs,
        };

        let response = self
            .authorize(self.client.put(self.service_url(service_id)))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BerthError::Timeout(format!("deploy {}: {}", service_id, e))
                } else {
                    BerthError::deployment(service_id, e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(BerthError::deployment(
                service_id,
                format!(
                    "remote API answered {} {}",
                    response.status(),
                    response.text().await.unwrap_or_default()
                ),
            ));
        }

        let result: HashMap<String, String> = response
            .json()
            .await
            .map_err(|e| BerthError::deployment(service_id, format!("invalid response: {}", e)))?;

        tracing::info!("Remote API deployed {}", service_id);
        Ok(result)
    }

    async fn destroy(
        &self,
        service_id: &str,
        _service_type: &str,
        _configs: &HashMap<String, String>,
    ) -> Result<()> {
        check_service_id(service_id).map_err(|e| BerthError::destruction(service_id, e))?;

        let response = self
            .authorize(self.client.delete(self.service_url(service_id)))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BerthError::Timeout(format!("destroy {}: {}", service_id, e))
                } else {
                    BerthError::destruction(service_id, e.to_string())
                }
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                tracing::debug!("Remote API has no {}, nothing to destroy", service_id);
                Ok(())
            }
            status => Err(BerthError::destruction(
                service_id,
                format!(
                    "remote API answered {} {}",
                    status,
                    response.text().await.unwrap_or_default()
                ),
            )),
        }
    }
}
