//! Service catalog
//!
//! Static knowledge of the supported service types: default image, port,
//! restart policy, and how each type derives its environment from the
//! caller's credentials. New types are added as data through
//! [`ServiceCatalog::register`].

pub mod builtin;
pub mod registry;
pub mod spec;

pub use registry::ServiceCatalog;
pub use spec::{CredentialField, EnvRule, ServiceTypeSpec};
