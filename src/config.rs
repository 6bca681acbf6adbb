//! Tool settings
//!
//! Settings come from a YAML file (explicit path, or `config.yaml` in the
//! user's config directory when present) and are then overridden by
//! `BERTH_*` environment variables.

use crate::error::{BerthError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default engine command timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Deployment backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local compose engine
    Engine,
    /// Remote deployment API
    Remote,
    /// In-memory recorder
    Memory,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Engine => write!(f, "engine"),
            BackendKind::Remote => write!(f, "remote"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = BerthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "engine" | "local" => Ok(BackendKind::Engine),
            "remote" => Ok(BackendKind::Remote),
            "memory" => Ok(BackendKind::Memory),
            other => Err(BerthError::InvalidConfig(format!(
                "Unknown backend '{}'",
                other
            ))),
        }
    }
}

/// Berth settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend used by deploy and destroy
    pub backend: BackendKind,
    /// Directory holding engine project directories
    pub state_dir: PathBuf,
    /// Compose engine binary
    pub engine_binary: String,
    /// Timeout for backend operations in seconds
    pub timeout_secs: u64,
    /// Remote deployment API base URL
    pub remote_endpoint: Option<String>,
    /// Remote deployment API bearer token
    pub remote_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Engine,
            state_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("/var/lib"))
                .join("berth"),
            engine_binary: "docker".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            remote_endpoint: None,
            remote_token: None,
        }
    }
}

impl Settings {
    /// Default settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("berth").join("config.yaml"))
    }

    /// Load settings from a file, the default location, and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        let env: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with("BERTH_"))
            .collect();
        settings.apply_env(&env)?;

        tracing::debug!("Loaded settings: backend={}", settings.backend);
        Ok(settings)
    }

    /// Parse a settings file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| BerthError::Yaml(e.to_string()))
    }

    /// Apply `BERTH_*` overrides
    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<()> {
        if let Some(backend) = env.get("BERTH_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(dir) = env.get("BERTH_STATE_DIR") {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(binary) = env.get("BERTH_ENGINE") {
            self.engine_binary = binary.clone();
        }
        if let Some(timeout) = env.get("BERTH_TIMEOUT") {
            self.timeout_secs = timeout.parse().map_err(|_| {
                BerthError::InvalidConfig(format!("BERTH_TIMEOUT is not a number: {}", timeout))
            })?;
        }
        if let Some(endpoint) = env.get("BERTH_REMOTE_ENDPOINT") {
            self.remote_endpoint = Some(endpoint.clone());
        }
        if let Some(token) = env.get("BERTH_REMOTE_TOKEN") {
            self.remote_token = Some(token.clone());
        }

        self.validate()
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(BerthError::InvalidConfig(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.engine_binary.trim().is_empty() {
            return Err(BerthError::InvalidConfig(
                "engine_binary must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Backend operation timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
