//! Local compose engine backend
//!
//! Each deployment gets its own project directory under the state directory
//! holding the rendered `docker-compose.yml`. The engine binary is invoked as
//! `<binary> compose -p <project> -f <file> ...`, so any Docker Compose v2
//! compatible CLI works (docker, podman, nerdctl).

use super::{
    check_service_id, Containerization, RESULT_DEPLOYED_AT, RESULT_SERVICE_ID,
    RESULT_SERVICE_TYPE,
};
use crate::compose::ComposeDefinition;
use crate::error::{BerthError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::process::Command;

/// Compose file written into each project directory
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";

/// File recording the compose project name a deployment was started under
pub const PROJECT_FILE_NAME: &str = ".project";

/// Config bag key overriding the compose project name
pub const CONFIG_PROJECT: &str = "project";

type IdLock = Arc<tokio::sync::Mutex<()>>;

/// Backend driving a local compose engine
pub struct ComposeEngine {
    /// Directory holding one project directory per service id
    state_dir: PathBuf,
    /// Engine binary
    binary: String,
    /// Upper bound for a single engine command
    timeout: Duration,
    /// Per service id locks, dropped once no call holds or waits on them
    locks: Mutex<HashMap<String, IdLock>>,
}

impl ComposeEngine {
    /// Create a new engine backend
    pub fn new(state_dir: PathBuf, binary: &str, timeout: Duration) -> Self {
        Self {
            state_dir,
            binary: binary.to_string(),
            timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Project directory of a service id
    pub fn project_dir(&self, service_id: &str) -> PathBuf {
        self.state_dir.join(service_id)
    }

    /// Default compose project name of a service id
    ///
    /// Accepted service ids are already valid project names, so distinct ids
    /// never share a project.
    pub fn project_name(service_id: &str) -> String {
        service_id.to_string()
    }

    fn acquire(&self, service_id: &str) -> Result<IdLock> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| BerthError::Lock("Failed to acquire lock table".to_string()))?;

        Ok(locks
            .entry(service_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone())
    }

    fn release(&self, service_id: &str, lock: IdLock) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };

        // Only the table and this handle remain: nobody else holds or waits.
        let idle = locks
            .get(service_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            locks.remove(service_id);
        }
    }

    /// Run `operation` while holding the lock of `service_id`
    async fn serialized<T, F>(&self, service_id: &str, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let lock = self.acquire(service_id)?;
        let result = {
            let _guard = lock.lock().await;
            operation.await
        };
        self.release(service_id, lock);
        result
    }

    async fn compose(&self, project: &str, file: &Path, args: &[&str]) -> Result<Output> {
        let mut command = Command::new(&self.binary);
        command
            .arg("compose")
            .arg("-p")
            .arg(project)
            .arg("-f")
            .arg(file)
            .args(args)
            .kill_on_drop(true);

        tracing::debug!("Running {} compose -p {} {:?}", self.binary, project, args);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(output) => Ok(output?),
            Err(_) => Err(BerthError::Timeout(format!(
                "{} compose {} did not finish within {:?}",
                self.binary,
                args.join(" "),
                self.timeout
            ))),
        }
    }

    async fn write_project(
        &self,
        dir: &Path,
        project: &str,
        definition: &ComposeDefinition,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(dir.join(PROJECT_FILE_NAME), project).await?;

        let path = dir.join(COMPOSE_FILE_NAME);
        let staging = dir.join(format!("{}.tmp", COMPOSE_FILE_NAME));
        tokio::fs::write(&staging, definition.to_compose_yaml()?).await?;
        tokio::fs::rename(&staging, &path).await?;

        Ok(path)
    }

    /// Project a deployment was started under
    async fn recorded_project(
        &self,
        dir: &Path,
        service_id: &str,
        configs: &HashMap<String, String>,
    ) -> String {
        if let Some(project) = configs.get(CONFIG_PROJECT) {
            return project.clone();
        }

        match tokio::fs::read_to_string(dir.join(PROJECT_FILE_NAME)).await {
            Ok(project) if !project.trim().is_empty() => project.trim().to_string(),
            _ => Self::project_name(service_id),
        }
    }

    async fn deploy_locked(
        &self,
        service_id: &str,
        service_type: &str,
        project: String,
        definition: &ComposeDefinition,
    ) -> Result<HashMap<String, String>> {
        let dir = self.project_dir(service_id);
        let file = self.write_project(&dir, &project, definition).await?;

        tracing::info!("Starting project {} from {}", project, file.display());

        let output = self
            .compose(&project, &file, &["up", "-d", "--remove-orphans"])
            .await?;

        if !output.status.success() {
            return Err(BerthError::deployment(
                service_id,
                format!(
                    "{} compose up exited with {}: {}",
                    self.binary,
                    output.status,
                    stderr_of(&output)
                ),
            ));
        }

        let mut result = HashMap::new();
        result.insert(RESULT_SERVICE_ID.to_string(), service_id.to_string());
        result.insert(RESULT_SERVICE_TYPE.to_string(), service_type.to_string());
        result.insert(RESULT_DEPLOYED_AT.to_string(), Utc::now().to_rfc3339());
        result.insert(CONFIG_PROJECT.to_string(), project);
        result.insert("compose_file".to_string(), file.display().to_string());

        Ok(result)
    }

    async fn destroy_locked(
        &self,
        service_id: &str,
        configs: &HashMap<String, String>,
    ) -> Result<()> {
        let dir = self.project_dir(service_id);
        if !dir.exists() {
            tracing::debug!("{} has no project directory, nothing to destroy", service_id);
            return Ok(());
        }

        let file = dir.join(COMPOSE_FILE_NAME);
        if file.exists() {
            let project = self.recorded_project(&dir, service_id, configs).await;

            tracing::info!("Stopping project {}", project);

            let output = self
                .compose(&project, &file, &["down", "--volumes", "--remove-orphans"])
                .await?;

            if !output.status.success() {
                return Err(BerthError::destruction(
                    service_id,
                    format!(
                        "{} compose down exited with {}: {}",
                        self.binary,
                        output.status,
                        stderr_of(&output)
                    ),
                ));
            }
        }

        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[async_trait]
impl Containerization for ComposeEngine {
    fn name(&self) -> &str {
        "engine"
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

        let project = configs
            .get(CONFIG_PROJECT)
            .cloned()
            .unwrap_or_else(|| Self::project_name(service_id));

        self.serialized(
            service_id,
            self.deploy_locked(service_id, service_type, project, &definition),
        )
        .await
    }

    async fn destroy(
        &self,
        service_id: &str,
        _service_type: &str,
        configs: &HashMap<String, String>,
    ) -> Result<()> {
        check_service_id(service_id).map_err(|e| BerthError::destruction(service_id, e))?;

        self.serialized(service_id, self.destroy_locked(service_id, configs))
            .await
    }
}
