//! Role assignment operations
//!
//! Grants storage roles to the managed identity of a data share account.
//! The identity is created moments before the assignment, so the call rides
//! the retry layer to absorb the authorization service's replication lag.

use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::arm::client::ArmClient;
use crate::error::{Result, SharebridgeError};
use crate::utils::network::RawResponse;
use crate::utils::retry::{send_with_retry, RetryPolicy};

const API_VERSION: &str = "2018-09-01-preview";

/// Storage Blob Data Reader built-in role
pub const STORAGE_BLOB_DATA_READER: &str = "2a2b9908-6ea1-4ae2-8e65-a410df84e7d1";

/// Storage Blob Data Contributor built-in role
pub const STORAGE_BLOB_DATA_CONTRIBUTOR: &str = "ba92f5b4-2d11-453d-a403-e96b0029c9fe";

const ALREADY_EXISTS_MARKER: &str = "the role assignment already exists";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAssignmentOutcome {
    Applied,
    AlreadyExists,
}

pub struct RoleAssignments {
    arm: Arc<ArmClient>,
    retry: RetryPolicy,
}

impl RoleAssignments {
    pub fn new(arm: Arc<ArmClient>) -> Self {
        Self {
            arm,
            retry: RetryPolicy::default(),
        }
    }

    /// ARM scope of a storage account
    pub fn storage_scope(subscription_id: &str, resource_group: &str, account_name: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/storageAccounts/{}",
            subscription_id, resource_group, account_name
        )
    }

    /// Assign a role to a principal on the given scope. A conflict reporting
    /// that the assignment already exists is not an error.
    pub async fn ensure_assignment(
        &self,
        scope: &str,
        role_definition_id: &str,
        principal_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RoleAssignmentOutcome> {
        let assignment_name = Uuid::new_v4();
        let url = self.arm.build_url(&format!(
            "{}/providers/Microsoft.Authorization/roleAssignments/{}?api-version={}",
            scope, assignment_name, API_VERSION
        ));
        let body = json!({
            "properties": {
                "roleDefinitionId": format!(
                    "/subscriptions/{}/providers/Microsoft.Authorization/roleDefinitions/{}",
                    self.arm.subscription_id(),
                    role_definition_id
                ),
                "principalId": principal_id,
            }
        });

        let response = send_with_retry(|| self.arm.put_raw(&url, &body), &self.retry, cancel).await?;

        if response.is_success() {
            return Ok(RoleAssignmentOutcome::Applied);
        }

        if is_already_exists(&response) {
            return Ok(RoleAssignmentOutcome::AlreadyExists);
        }

        Err(SharebridgeError::role_assignment(
            scope.to_string(),
            format!(
                "HTTP {}: {}. The caller may lack permissions to add role assignments on this \
                 storage account; grant Owner permissions to the client application.",
                response.status,
                response.error_message()
            ),
        ))
    }
}

fn is_already_exists(response: &RawResponse) -> bool {
    response.status == StatusCode::CONFLICT
        && response.body.to_lowercase().contains(ALREADY_EXISTS_MARKER)
}
