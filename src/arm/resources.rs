//! Resource group operations

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::arm::client::ArmClient;
use crate::error::{Result, SharebridgeError};
use crate::utils::retry::{send_with_retry, RetryPolicy};

const API_VERSION: &str = "2021-04-01";

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    pub location: String,
}

pub struct ResourceGroups {
    arm: Arc<ArmClient>,
    retry: RetryPolicy,
}

impl ResourceGroups {
    pub fn new(arm: Arc<ArmClient>) -> Self {
        Self {
            arm,
            retry: RetryPolicy::default(),
        }
    }

    /// Create-or-update a resource group. The management PUT is idempotent:
    /// an existing group comes back unchanged.
    pub async fn ensure(
        &self,
        name: &str,
        location: &str,
        cancel: &CancellationToken,
    ) -> Result<ResourceGroup> {
        let url = self.arm.build_url(&format!(
            "/subscriptions/{}/resourcegroups/{}?api-version={}",
            self.arm.subscription_id(),
            name,
            API_VERSION
        ));
        let body = json!({ "location": location });

        let response = send_with_retry(|| self.arm.put_raw(&url, &body), &self.retry, cancel).await?;

        if !response.is_success() {
            return Err(SharebridgeError::azure_api(format!(
                "Failed to create resource group '{}': HTTP {}: {}",
                name,
                response.status,
                response.error_message()
            )));
        }

        let group: ResourceGroup = serde_json::from_str(&response.body).map_err(|e| {
            SharebridgeError::serialization(format!(
                "Failed to parse resource group response: {}",
                e
            ))
        })?;

        Ok(group)
    }
}
