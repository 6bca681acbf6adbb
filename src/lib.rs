//! Berth - ready-to-run compose definitions for common services
//!
//! Berth knows a catalog of service types (Redis, Grafana, databases, message
//! brokers) and turns a logical name plus optional credentials into a Docker
//! Compose compatible definition. Definitions can be rendered to YAML or
//! handed to any deployment backend implementing [`runtime::Containerization`]:
//!
//! - Service catalog with per-type defaults
//! - Definition builders and YAML/JSON serialization
//! - Local compose engine, remote API and in-memory backends

pub mod catalog;
pub mod compose;
pub mod config;
pub mod error;
pub mod runtime;

pub use catalog::{ServiceCatalog, ServiceTypeSpec};
pub use compose::{ComposeDefinition, Credentials, ServiceEntry};
pub use error::{BerthError, Result};
pub use runtime::{Containerization, Deployer};
