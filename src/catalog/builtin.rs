//! Built-in service types

use super::spec::{CredentialField, EnvRule, ServiceTypeSpec};

pub const REDIS_SERVICE: &str = "redis";
pub const REDIS_DOCKER_IMAGE: &str = "bitnami/redis:6.2.4";
pub const REDIS_PORT: &str = "6379";

pub const GRAFANA_SERVICE: &str = "grafana";
pub const GRAFANA_DOCKER_IMAGE: &str = "grafana/grafana:8.0.3";
pub const GRAFANA_PORT: &str = "3000";
pub const GRAFANA_DEFAULT_USERNAME: &str = "admin";
pub const GRAFANA_DEFAULT_PASSWORD: &str = "admin";

pub const MYSQL_SERVICE: &str = "mysql";
pub const MARIADB_SERVICE: &str = "mariadb";
pub const POSTGRESQL_SERVICE: &str = "postgresql";
pub const MONGODB_SERVICE: &str = "mongodb";
pub const MEMCACHED_SERVICE: &str = "memcached";
pub const RABBITMQ_SERVICE: &str = "rabbitmq";

/// All service types shipped with the crate
pub fn builtin_specs() -> Vec<ServiceTypeSpec> {
    vec![
        redis(),
        grafana(),
        mysql_like(MYSQL_SERVICE, "mysql:8.0", "MySQL relational database"),
        mysql_like(MARIADB_SERVICE, "mariadb:10.6", "MariaDB relational database"),
        postgresql(),
        mongodb(),
        memcached(),
        rabbitmq(),
    ]
}

fn redis() -> ServiceTypeSpec {
    ServiceTypeSpec::new(REDIS_SERVICE, REDIS_DOCKER_IMAGE, REDIS_PORT)
        .alias("cache")
        .description("Redis in-memory cache")
        .env(EnvRule::presence(
            CredentialField::Password,
            "REDIS_PASSWORD",
            "ALLOW_EMPTY_PASSWORD",
            "yes",
        ))
}

fn grafana() -> ServiceTypeSpec {
    ServiceTypeSpec::new(GRAFANA_SERVICE, GRAFANA_DOCKER_IMAGE, GRAFANA_PORT)
        .alias("dashboard")
        .description("Grafana dashboards")
        .env(EnvRule::credential(
            "GF_SECURITY_ADMIN_USER",
            CredentialField::Username,
            GRAFANA_DEFAULT_USERNAME,
        ))
        .env(EnvRule::credential(
            "GF_SECURITY_ADMIN_PASSWORD",
            CredentialField::Password,
            GRAFANA_DEFAULT_PASSWORD,
        ))
        .env(EnvRule::fixed("GF_USERS_ALLOW_SIGN_UP", "false"))
}

// MySQL and MariaDB images share the same entrypoint variables.
fn mysql_like(id: &str, image: &str, description: &str) -> ServiceTypeSpec {
    ServiceTypeSpec::new(id, image, "3306")
        .description(description)
        .env(EnvRule::credential(
            "MYSQL_ROOT_PASSWORD",
            CredentialField::Password,
            "root",
        ))
        .env(EnvRule::credential(
            "MYSQL_DATABASE",
            CredentialField::Database,
            "app",
        ))
        .env(EnvRule::credential("MYSQL_USER", CredentialField::Username, "app"))
        .env(EnvRule::credential(
            "MYSQL_PASSWORD",
            CredentialField::Password,
            "root",
        ))
}

fn postgresql() -> ServiceTypeSpec {
    ServiceTypeSpec::new(POSTGRESQL_SERVICE, "postgres:13.3", "5432")
        .alias("postgres")
        .description("PostgreSQL relational database")
        .env(EnvRule::credential("POSTGRES_DB", CredentialField::Database, "app"))
        .env(EnvRule::credential(
            "POSTGRES_USER",
            CredentialField::Username,
            "postgres",
        ))
        .env(EnvRule::credential(
            "POSTGRES_PASSWORD",
            CredentialField::Password,
            "postgres",
        ))
}

fn mongodb() -> ServiceTypeSpec {
    ServiceTypeSpec::new(MONGODB_SERVICE, "mongo:5.0", "27017")
        .alias("mongo")
        .description("MongoDB document database")
        .env(EnvRule::credential(
            "MONGO_INITDB_ROOT_USERNAME",
            CredentialField::Username,
            "root",
        ))
        .env(EnvRule::credential(
            "MONGO_INITDB_ROOT_PASSWORD",
            CredentialField::Password,
            "root",
        ))
}

fn memcached() -> ServiceTypeSpec {
    ServiceTypeSpec::new(MEMCACHED_SERVICE, "memcached:1.6.9", "11211")
        .description("Memcached in-memory cache")
}

fn rabbitmq() -> ServiceTypeSpec {
    ServiceTypeSpec::new(RABBITMQ_SERVICE, "rabbitmq:3.8-management", "5672")
        .description("RabbitMQ message broker")
        .env(EnvRule::credential(
            "RABBITMQ_DEFAULT_USER",
            CredentialField::Username,
            "guest",
        ))
        .env(EnvRule::credential(
            "RABBITMQ_DEFAULT_PASS",
            CredentialField::Password,
            "guest",
        ))
}
