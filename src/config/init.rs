//! Starter configuration template
//!
//! Writes a commented configuration file for new users to fill in with
//! their two service principals.

use std::path::{Path, PathBuf};

use crate::config::settings::CONFIG_FILE_NAME;
use crate::error::{Result, SharebridgeError};

const STARTER_CONFIG: &str = r#"# sharebridge configuration
#
# Two service principals are required: the data provider and the data
# consumer. Unset data_share names are generated at run time.

location = "eastus2"
# arm_endpoint = "https://management.azure.com"
# authority = "https://login.microsoftonline.com"

[provider]
tenant_id = "00000000-0000-0000-0000-000000000000"
client_id = "00000000-0000-0000-0000-000000000000"
# object_id = "00000000-0000-0000-0000-000000000000"
secret = ""   # or set SHAREBRIDGE_PROVIDER_SECRET
subscription_id = "00000000-0000-0000-0000-000000000000"

[provider.storage]
resource_group = "provider-storage-rg"
account_name = "providerstorage"
container_name = "shared-data"

# [provider.data_share]
# resource_group = ""
# account_name = ""
# share_name = ""
# invitation_name = ""
# data_set_name = ""

[consumer]
tenant_id = "00000000-0000-0000-0000-000000000000"
client_id = "00000000-0000-0000-0000-000000000000"
# object_id = "00000000-0000-0000-0000-000000000000"
secret = ""   # or set SHAREBRIDGE_CONSUMER_SECRET
subscription_id = "00000000-0000-0000-0000-000000000000"

[consumer.storage]
resource_group = "consumer-storage-rg"
account_name = "consumerstorage"
container_name = "received-data"

# [consumer.data_share]
# resource_group = ""
# account_name = ""
# share_subscription_name = ""
# data_set_mapping_name = ""
"#;

/// Write the starter configuration, refusing to overwrite unless forced
pub async fn write_starter_config(path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(CONFIG_FILE_NAME),
    };

    if path.exists() && !force {
        return Err(SharebridgeError::config(format!(
            "Configuration file '{}' already exists (use --force to overwrite)",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    tokio::fs::write(&path, STARTER_CONFIG).await?;
    Ok(path)
}
