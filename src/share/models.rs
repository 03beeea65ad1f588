//! Data Share wire models
//!
//! Serde models of the Microsoft.DataShare resource shapes this tool
//! creates and reads. Payload constructors build the create bodies; the
//! read-only fields stay optional because create payloads omit them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Managed identity block on a data share account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(rename = "type")]
    pub identity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl Identity {
    pub fn system_assigned() -> Self {
        Self {
            identity_type: "SystemAssigned".to_string(),
            principal_id: None,
            tenant_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningState {
    Succeeded,
    Creating,
    Deleting,
    Moving,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

/// A data share account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    pub identity: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<AccountProperties>,
}

impl Account {
    /// Create payload: location plus a system-assigned identity
    pub fn create_payload(location: &str) -> Self {
        Self {
            id: None,
            name: None,
            location: location.to_string(),
            identity: Identity::system_assigned(),
            properties: None,
        }
    }

    pub fn provisioning_state(&self) -> Option<ProvisioningState> {
        self.properties
            .as_ref()
            .and_then(|p| p.provisioning_state)
    }

    /// Object id of the account's managed identity, once provisioned
    pub fn principal_id(&self) -> Option<&str> {
        self.identity.principal_id.as_deref()
    }

    pub fn resource_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<unknown>")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShareProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_kind: Option<String>,
}

/// A share inside a provider account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: ShareProperties,
}

impl Share {
    /// Create payload for a snapshot-based share
    pub fn copy_based(description: &str, terms: &str) -> Self {
        Self {
            id: None,
            name: None,
            properties: ShareProperties {
                description: Some(description.to_string()),
                terms: Some(terms.to_string()),
                share_kind: Some("CopyBased".to_string()),
            },
        }
    }

    pub fn resource_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<unknown>")
    }
}

/// Storage coordinates shared by blob-container data sets and mappings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobContainerProperties {
    pub subscription_id: String,
    pub resource_group: String,
    pub storage_account_name: String,
    pub container_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_id: Option<String>,
}

/// A blob-container data set published into a share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSet {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: BlobContainerProperties,
}

impl DataSet {
    pub fn blob_container(
        subscription_id: &str,
        resource_group: &str,
        storage_account_name: &str,
        container_name: &str,
    ) -> Self {
        Self {
            kind: "Container".to_string(),
            id: None,
            name: None,
            properties: BlobContainerProperties {
                subscription_id: subscription_id.to_string(),
                resource_group: resource_group.to_string(),
                storage_account_name: storage_account_name.to_string(),
                container_name: container_name.to_string(),
                data_set_id: None,
            },
        }
    }

    pub fn resource_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<unknown>")
    }
}

/// A blob-container mapping wiring a received data set to consumer storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSetMapping {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: BlobContainerProperties,
}

impl DataSetMapping {
    pub fn blob_container(
        data_set_id: &str,
        subscription_id: &str,
        resource_group: &str,
        storage_account_name: &str,
        container_name: &str,
    ) -> Self {
        Self {
            kind: "Container".to_string(),
            id: None,
            name: None,
            properties: BlobContainerProperties {
                subscription_id: subscription_id.to_string(),
                resource_group: resource_group.to_string(),
                storage_account_name: storage_account_name.to_string(),
                container_name: container_name.to_string(),
                data_set_id: Some(data_set_id.to_string()),
            },
        }
    }

    pub fn resource_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<unknown>")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvitationProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_active_directory_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_object_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_status: Option<InvitationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

/// An invitation to a share, addressed to the consumer principal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: InvitationProperties,
}

impl Invitation {
    pub fn for_target(tenant_id: &str, object_id: &str) -> Self {
        Self {
            id: None,
            name: None,
            properties: InvitationProperties {
                target_active_directory_id: Some(tenant_id.to_string()),
                target_object_id: Some(object_id.to_string()),
                ..InvitationProperties::default()
            },
        }
    }

    pub fn invitation_id(&self) -> Option<&str> {
        self.properties.invitation_id.as_deref()
    }

    pub fn is_accepted(&self) -> bool {
        self.properties.invitation_status == Some(InvitationStatus::Accepted)
    }

    pub fn resource_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<unknown>")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShareSubscriptionProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_share_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_subscription_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// A received share on the consumer side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareSubscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: ShareSubscriptionProperties,
}

impl ShareSubscription {
    pub fn from_invitation(invitation_id: &str, source_share_location: &str) -> Self {
        Self {
            id: None,
            name: None,
            properties: ShareSubscriptionProperties {
                invitation_id: Some(invitation_id.to_string()),
                source_share_location: Some(source_share_location.to_string()),
                ..ShareSubscriptionProperties::default()
            },
        }
    }

    pub fn invitation_id(&self) -> Option<&str> {
        self.properties.invitation_id.as_deref()
    }

    pub fn resource_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<unknown>")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsumerSourceDataSetProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_set_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_set_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_set_type: Option<String>,
}

/// A data set offered to the consumer through a share subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerSourceDataSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: ConsumerSourceDataSetProperties,
}

impl ConsumerSourceDataSet {
    pub fn data_set_id(&self) -> Option<&str> {
        self.properties.data_set_id.as_deref()
    }
}

/// Result of triggering a snapshot copy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShareSubscriptionSynchronization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synchronization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synchronization_mode: Option<String>,
}

/// Paged list envelope used by the management API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub next_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_create_payload_omits_readonly_fields() {
        let payload = Account::create_payload("eastus2");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["location"], "eastus2");
        assert_eq!(json["identity"]["type"], "SystemAssigned");
        assert!(json.get("id").is_none());
        assert!(json.get("properties").is_none());
        assert!(json["identity"].get("principalId").is_none());
    }

    #[test]
    fn account_response_round_trip() {
        let body = r#"{
            "id": "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.DataShare/accounts/acct",
            "name": "acct",
            "location": "eastus2",
            "identity": {
                "type": "SystemAssigned",
                "principalId": "11111111-1111-1111-1111-111111111111",
                "tenantId": "22222222-2222-2222-2222-222222222222"
            },
            "properties": {
                "provisioningState": "Succeeded",
                "createdAt": "2024-03-01T12:00:00Z"
            }
        }"#;

        let account: Account = serde_json::from_str(body).unwrap();
        assert_eq!(account.provisioning_state(), Some(ProvisioningState::Succeeded));
        assert_eq!(
            account.principal_id(),
            Some("11111111-1111-1111-1111-111111111111")
        );
    }

    #[test]
    fn unknown_provisioning_state_does_not_fail_parsing() {
        let body = r#"{
            "location": "eastus2",
            "identity": { "type": "SystemAssigned" },
            "properties": { "provisioningState": "SomethingNew" }
        }"#;

        let account: Account = serde_json::from_str(body).unwrap();
        assert_eq!(account.provisioning_state(), Some(ProvisioningState::Unknown));
    }

    #[test]
    fn invitation_accepted_detection() {
        let body = r#"{
            "id": "/sub/x/invitations/inv",
            "name": "inv",
            "properties": {
                "invitationId": "33333333-3333-3333-3333-333333333333",
                "invitationStatus": "Accepted",
                "sentAt": "2024-03-01T12:00:00Z"
            }
        }"#;

        let invitation: Invitation = serde_json::from_str(body).unwrap();
        assert!(invitation.is_accepted());
        assert_eq!(
            invitation.invitation_id(),
            Some("33333333-3333-3333-3333-333333333333")
        );
    }

    #[test]
    fn data_set_payload_uses_container_kind() {
        let data_set = DataSet::blob_container("sub", "rg", "storacct", "container");
        let json = serde_json::to_value(&data_set).unwrap();

        assert_eq!(json["kind"], "Container");
        assert_eq!(json["properties"]["storageAccountName"], "storacct");
        assert_eq!(json["properties"]["containerName"], "container");
        assert!(json["properties"].get("dataSetId").is_none());
    }

    #[test]
    fn consumer_source_data_set_list_parses() {
        let body = r#"{
            "value": [
                {
                    "id": "/x/consumerSourceDataSets/a",
                    "name": "a",
                    "properties": { "dataSetId": "ds-1", "dataSetName": "sales" }
                }
            ],
            "nextLink": null
        }"#;

        let list: ResourceList<ConsumerSourceDataSet> = serde_json::from_str(body).unwrap();
        assert_eq!(list.value.len(), 1);
        assert_eq!(list.value[0].data_set_id(), Some("ds-1"));
    }
}
