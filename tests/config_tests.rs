use sharebridge::config::{load_config, Config};
use sharebridge::utils::helpers::NameGenerator;

const VALID_CONFIG: &str = r#"
location = "westus2"

[provider]
tenant_id = "11111111-1111-1111-1111-111111111111"
client_id = "22222222-2222-2222-2222-222222222222"
secret = "provider-secret"
subscription_id = "33333333-3333-3333-3333-333333333333"

[provider.storage]
resource_group = "provider-storage-rg"
account_name = "providerstorage"
container_name = "shared-data"

[provider.data_share]
resource_group = "provider-ds-rg"

[consumer]
tenant_id = "44444444-4444-4444-4444-444444444444"
client_id = "55555555-5555-5555-5555-555555555555"
object_id = "66666666-6666-6666-6666-666666666666"
secret = "consumer-secret"
subscription_id = "77777777-7777-7777-7777-777777777777"

[consumer.storage]
resource_group = "consumer-storage-rg"
account_name = "consumerstorage"
container_name = "received-data"
"#;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[cfg(test)]
mod loading_tests {
    use super::*;

    #[tokio::test]
    async fn loads_toml_configuration() {
        let file = write_config(VALID_CONFIG);

        let config = load_config(Some(file.path())).await.unwrap();

        assert_eq!(config.location, "westus2");
        assert_eq!(config.arm_endpoint, "https://management.azure.com");
        assert_eq!(config.provider.storage.account_name, "providerstorage");
        assert_eq!(
            config.provider.data_share.resource_group.as_deref(),
            Some("provider-ds-rg")
        );
        assert!(config.provider.data_share.account_name.is_none());
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn loads_json_configuration_as_fallback() {
        let file = write_config(
            r#"{
                "location": "eastus2",
                "provider": {
                    "tenant_id": "11111111-1111-1111-1111-111111111111",
                    "client_id": "22222222-2222-2222-2222-222222222222",
                    "secret": "s1",
                    "subscription_id": "33333333-3333-3333-3333-333333333333",
                    "storage": {
                        "resource_group": "rg1",
                        "account_name": "storage1",
                        "container_name": "c1"
                    }
                },
                "consumer": {
                    "tenant_id": "44444444-4444-4444-4444-444444444444",
                    "client_id": "55555555-5555-5555-5555-555555555555",
                    "secret": "s2",
                    "subscription_id": "77777777-7777-7777-7777-777777777777",
                    "storage": {
                        "resource_group": "rg2",
                        "account_name": "storage2",
                        "container_name": "c2"
                    }
                }
            }"#,
        );

        let config = load_config(Some(file.path())).await.unwrap();
        assert_eq!(config.consumer.storage.account_name, "storage2");
    }

    #[tokio::test]
    async fn missing_file_is_a_config_error() {
        let result = load_config(Some(std::path::Path::new("/nonexistent/sharebridge.toml"))).await;
        assert!(result.is_err());
    }

    // The other tests in this binary deliberately never assert on the
    // authority or the provider secret value, so setting these variables
    // cannot race with them.
    #[tokio::test]
    async fn environment_overrides_are_applied() {
        let file = write_config(VALID_CONFIG);

        std::env::set_var("SHAREBRIDGE_AUTHORITY", "https://login.example.test");
        std::env::set_var("SHAREBRIDGE_PROVIDER_SECRET", "from-env");
        let config = load_config(Some(file.path())).await.unwrap();
        std::env::remove_var("SHAREBRIDGE_AUTHORITY");
        std::env::remove_var("SHAREBRIDGE_PROVIDER_SECRET");

        assert_eq!(config.authority, "https://login.example.test");
        assert_eq!(config.provider.secret.expose(), "from-env");
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    async fn config_from(contents: &str) -> Config {
        let file = write_config(contents);
        load_config(Some(file.path())).await.unwrap()
    }

    #[tokio::test]
    async fn rejects_non_guid_tenant() {
        let contents = VALID_CONFIG.replace(
            "11111111-1111-1111-1111-111111111111",
            "not-a-guid",
        );
        let config = config_from(&contents).await;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn rejects_invalid_storage_account_name() {
        let contents = VALID_CONFIG.replace("providerstorage", "Invalid-Storage-Name");
        let config = config_from(&contents).await;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn rejects_empty_secret() {
        let contents = VALID_CONFIG.replace("consumer-secret", "");
        let config = config_from(&contents).await;
        assert!(config.validate().is_err());
    }
}

#[cfg(test)]
mod name_resolution_tests {
    use super::*;

    #[tokio::test]
    async fn unset_names_are_filled_from_the_generator() {
        let file = write_config(VALID_CONFIG);
        let mut config = load_config(Some(file.path())).await.unwrap();

        let mut generator = NameGenerator::with_seed(1);
        config.resolve_names(&mut generator);

        // Configured names are kept, unset ones are generated.
        assert_eq!(
            config.provider.data_share.resource_group.as_deref(),
            Some("provider-ds-rg")
        );
        let account = config.provider.data_share.account_name.as_deref().unwrap();
        assert!(account.starts_with("adssample"));
        assert!(config
            .consumer
            .data_share
            .share_subscription_name
            .is_some());
    }

    #[tokio::test]
    async fn resolution_is_deterministic_for_a_fixed_seed() {
        let file = write_config(VALID_CONFIG);

        let mut first = load_config(Some(file.path())).await.unwrap();
        let mut second = load_config(Some(file.path())).await.unwrap();

        first.resolve_names(&mut NameGenerator::with_seed(9));
        second.resolve_names(&mut NameGenerator::with_seed(9));

        assert_eq!(
            first.provider.data_share.account_name,
            second.provider.data_share.account_name
        );
        assert_eq!(
            first.consumer.data_share.data_set_mapping_name,
            second.consumer.data_share.data_set_mapping_name
        );
    }
}

#[cfg(test)]
mod secret_tests {
    use super::*;

    #[tokio::test]
    async fn debug_output_redacts_secrets() {
        let file = write_config(VALID_CONFIG);
        let config = load_config(Some(file.path())).await.unwrap();

        let debug = format!("{:?}", config.provider);
        assert!(!debug.contains("provider-secret"));
        assert!(debug.contains("ClientSecret(****)"));
    }
}
