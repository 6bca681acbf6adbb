use berth::catalog::builtin::{
    GRAFANA_DEFAULT_PASSWORD, GRAFANA_DEFAULT_USERNAME, GRAFANA_DOCKER_IMAGE, GRAFANA_PORT,
    REDIS_DOCKER_IMAGE, REDIS_PORT,
};
use berth::catalog::spec::DEFAULT_RESTART_POLICY;
use berth::catalog::CredentialField;
use berth::runtime::{Containerization, Deployer, MemoryBackend};
use berth::{ComposeDefinition, Credentials, ServiceCatalog};
use std::collections::HashMap;
use std::sync::Arc;

fn yaml_for(service_type: &str, name: &str, credentials: &Credentials) -> String {
    ServiceCatalog::builtin()
        .build(service_type, name, credentials)
        .unwrap()
        .to_yaml()
        .unwrap()
}

#[test]
fn cache_without_password_allows_empty_password() {
    let yaml = yaml_for("cache", "mycache", &Credentials::new());

    assert!(yaml.contains("mycache:"));
    assert!(yaml.contains(&format!("image: {}", REDIS_DOCKER_IMAGE)));
    assert!(yaml.contains(REDIS_PORT));
    assert!(yaml.contains(&format!("restart: {}", DEFAULT_RESTART_POLICY)));
    assert!(yaml.contains("ALLOW_EMPTY_PASSWORD=yes"));
    assert!(!yaml.contains("REDIS_PASSWORD"));
}

#[test]
fn cache_with_password_sets_it() {
    let yaml = yaml_for("cache", "mycache", &Credentials::new().password("secret"));

    assert!(yaml.contains("REDIS_PASSWORD=secret"));
    assert!(!yaml.contains("ALLOW_EMPTY_PASSWORD"));
}

#[test]
fn dashboard_with_credentials() {
    let credentials = Credentials::new().username("alice").password("pw123");
    let yaml = yaml_for("dashboard", "mydash", &credentials);

    assert!(yaml.contains(&format!("image: {}", GRAFANA_DOCKER_IMAGE)));
    assert!(yaml.contains(GRAFANA_PORT));
    assert!(yaml.contains("GF_SECURITY_ADMIN_USER=alice"));
    assert!(yaml.contains("GF_SECURITY_ADMIN_PASSWORD=pw123"));
    assert!(yaml.contains("GF_USERS_ALLOW_SIGN_UP=false"));
}

#[test]
fn dashboard_with_blank_credentials_uses_defaults() {
    let credentials = Credentials::new().username("").password("");
    let yaml = yaml_for("dashboard", "mydash", &credentials);

    assert!(yaml.contains(&format!(
        "GF_SECURITY_ADMIN_USER={}",
        GRAFANA_DEFAULT_USERNAME
    )));
    assert!(yaml.contains(&format!(
        "GF_SECURITY_ADMIN_PASSWORD={}",
        GRAFANA_DEFAULT_PASSWORD
    )));
    assert!(yaml.contains("GF_USERS_ALLOW_SIGN_UP=false"));
}

#[test]
fn every_catalog_type_serializes_its_defaults() {
    for spec in ServiceCatalog::builtin().list() {
        let definition = ServiceCatalog::builtin()
            .build(&spec.id, "svc", &Credentials::new())
            .unwrap();
        let yaml = definition.to_yaml().unwrap();

        assert!(yaml.contains(&spec.image), "{} lost its image", spec.id);
        assert!(yaml.contains(&spec.port), "{} lost its port", spec.id);
        assert!(yaml.contains(&spec.restart), "{} lost its restart", spec.id);

        for field in spec.credential_fields() {
            if let Some(default) = spec.default_credential(field) {
                assert!(
                    definition.services["svc"]
                        .environment
                        .iter()
                        .any(|e| e.ends_with(&format!("={}", default))),
                    "{} lost the default {}",
                    spec.id,
                    field
                );
            }
        }

        let parsed = ComposeDefinition::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, definition);
    }
}

#[test]
fn supplied_credentials_replace_defaults() {
    let credentials = Credentials::new()
        .username("custom-user")
        .password("custom-pass")
        .database("custom-db");

    for spec in ServiceCatalog::builtin().list() {
        let definition = ServiceCatalog::builtin()
            .build(&spec.id, "svc", &credentials)
            .unwrap();
        let entry = &definition.services["svc"];

        for field in spec.credential_fields() {
            let supplied = credentials.get(field).unwrap();
            assert!(entry.environment.iter().any(|e| e.ends_with(supplied)));

            if field == CredentialField::Password {
                if let Some(default) = spec.default_credential(field) {
                    let kept_default = entry
                        .environment
                        .iter()
                        .any(|e| e.ends_with(&format!("={}", default)));
                    assert!(!kept_default, "{} kept its default password", spec.id);
                }
            }
        }
    }
}

#[tokio::test]
async fn deployer_hands_definition_to_backend() {
    let backend = Arc::new(MemoryBackend::new());
    let deployer = Deployer::new(backend.clone());
    let definition = ServiceCatalog::builtin()
        .build("dashboard", "mydash", &Credentials::new())
        .unwrap();

    let result = deployer.deploy("dash-1", "grafana", &definition).await.unwrap();
    assert_eq!(result["endpoint.mydash"], format!("localhost:{}", GRAFANA_PORT));

    let stored = backend.get("dash-1").unwrap().unwrap();
    assert_eq!(stored.definition, definition);
    assert_eq!(stored.service_type, "grafana");
}

#[tokio::test]
async fn destroy_of_unknown_id_succeeds() {
    let backend = MemoryBackend::new();
    backend
        .destroy("never-deployed", "redis", &HashMap::new())
        .await
        .unwrap();
}
