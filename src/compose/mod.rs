//! Compose definitions
//!
//! This module builds Docker Compose compatible definitions from catalog
//! entries and renders them to text for inspection, storage or hand-off to a
//! deployment backend.

pub mod builder;
pub mod definition;
pub mod serializer;

pub use builder::Credentials;
pub use definition::{ComposeDefinition, ServiceEntry, COMPOSE_VERSION};
pub use serializer::{find_compose_file, CONFIG_DEFINITION};
