//! Data Share management operations
//!
//! Typed REST surface over the Microsoft.DataShare resource provider: one
//! method per operation the provisioning flows perform. Lookups distinguish
//! absence from failure through [`Lookup`] instead of error control flow.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::models::{
    Account, ConsumerSourceDataSet, DataSet, DataSetMapping, Invitation, ResourceList, Share,
    ShareSubscription, ShareSubscriptionSynchronization,
};
use crate::arm::client::ArmClient;
use crate::error::{Result, SharebridgeError};
use crate::utils::network::RawResponse;

pub const API_VERSION: &str = "2019-11-01";

/// Outcome of a lookup that treats absence as data, not as an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

/// Trait for data share management operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataShareOperations: Send + Sync {
    async fn get_account(&self, resource_group: &str, account: &str) -> Result<Lookup<Account>>;

    async fn create_account(
        &self,
        resource_group: &str,
        account: &str,
        payload: &Account,
    ) -> Result<Account>;

    async fn get_share(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
    ) -> Result<Lookup<Share>>;

    async fn create_share(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
        payload: &Share,
    ) -> Result<Share>;

    async fn get_data_set(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
        data_set: &str,
    ) -> Result<Lookup<DataSet>>;

    async fn create_data_set(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
        data_set: &str,
        payload: &DataSet,
    ) -> Result<DataSet>;

    async fn get_invitation(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
        invitation: &str,
    ) -> Result<Lookup<Invitation>>;

    async fn create_invitation(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
        invitation: &str,
        payload: &Invitation,
    ) -> Result<Invitation>;

    async fn get_share_subscription(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
    ) -> Result<Lookup<ShareSubscription>>;

    async fn create_share_subscription(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
        payload: &ShareSubscription,
    ) -> Result<ShareSubscription>;

    async fn list_consumer_source_data_sets(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
    ) -> Result<Vec<ConsumerSourceDataSet>>;

    async fn get_data_set_mapping(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
        mapping: &str,
    ) -> Result<Lookup<DataSetMapping>>;

    async fn create_data_set_mapping(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
        mapping: &str,
        payload: &DataSetMapping,
    ) -> Result<DataSetMapping>;

    async fn synchronize(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
    ) -> Result<ShareSubscriptionSynchronization>;
}

/// REST implementation against Azure Resource Manager
pub struct AzureDataShareOperations {
    arm: Arc<ArmClient>,
}

impl AzureDataShareOperations {
    pub fn new(arm: Arc<ArmClient>) -> Self {
        Self { arm }
    }

    fn account_path(&self, resource_group: &str, account: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.DataShare/accounts/{}",
            self.arm.subscription_id(),
            resource_group,
            account
        )
    }

    fn share_path(&self, resource_group: &str, account: &str, share: &str) -> String {
        format!("{}/shares/{}", self.account_path(resource_group, account), share)
    }

    fn share_subscription_path(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
    ) -> String {
        format!(
            "{}/shareSubscriptions/{}",
            self.account_path(resource_group, account),
            share_subscription
        )
    }

    fn url(&self, path: &str) -> String {
        self.arm.build_url(&format!("{}?api-version={}", path, API_VERSION))
    }

    fn parse_body<T: DeserializeOwned>(&self, response: &RawResponse) -> Result<T> {
        serde_json::from_str(&response.body).map_err(|e| {
            SharebridgeError::serialization(format!(
                "Failed to parse data share response: {}",
                e
            ))
        })
    }

    fn api_error(&self, response: &RawResponse) -> SharebridgeError {
        SharebridgeError::azure_api(format!(
            "HTTP {}: {}",
            response.status,
            response.error_message()
        ))
    }

    async fn get_resource<T: DeserializeOwned>(&self, path: &str) -> Result<Lookup<T>> {
        let response = self.arm.get_raw(&self.url(path)).await?;

        if response.status == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }

        if !response.is_success() {
            return Err(self.api_error(&response));
        }

        Ok(Lookup::Found(self.parse_body(&response)?))
    }

    async fn put_resource<T, B>(&self, path: &str, payload: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let body = serde_json::to_value(payload)?;
        let response = self.arm.put_raw(&self.url(path), &body).await?;

        if !response.is_success() {
            return Err(self.api_error(&response));
        }

        self.parse_body(&response)
    }
}

#[async_trait]
impl DataShareOperations for AzureDataShareOperations {
    async fn get_account(&self, resource_group: &str, account: &str) -> Result<Lookup<Account>> {
        self.get_resource(&self.account_path(resource_group, account))
            .await
    }

    async fn create_account(
        &self,
        resource_group: &str,
        account: &str,
        payload: &Account,
    ) -> Result<Account> {
        self.put_resource(&self.account_path(resource_group, account), payload)
            .await
    }

    async fn get_share(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
    ) -> Result<Lookup<Share>> {
        self.get_resource(&self.share_path(resource_group, account, share))
            .await
    }

    async fn create_share(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
        payload: &Share,
    ) -> Result<Share> {
        self.put_resource(&self.share_path(resource_group, account, share), payload)
            .await
    }

    async fn get_data_set(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
        data_set: &str,
    ) -> Result<Lookup<DataSet>> {
        let path = format!(
            "{}/dataSets/{}",
            self.share_path(resource_group, account, share),
            data_set
        );
        self.get_resource(&path).await
    }

    async fn create_data_set(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
        data_set: &str,
        payload: &DataSet,
    ) -> Result<DataSet> {
        let path = format!(
            "{}/dataSets/{}",
            self.share_path(resource_group, account, share),
            data_set
        );
        self.put_resource(&path, payload).await
    }

    async fn get_invitation(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
        invitation: &str,
    ) -> Result<Lookup<Invitation>> {
        let path = format!(
            "{}/invitations/{}",
            self.share_path(resource_group, account, share),
            invitation
        );
        self.get_resource(&path).await
    }

    async fn create_invitation(
        &self,
        resource_group: &str,
        account: &str,
        share: &str,
        invitation: &str,
        payload: &Invitation,
    ) -> Result<Invitation> {
        let path = format!(
            "{}/invitations/{}",
            self.share_path(resource_group, account, share),
            invitation
        );
        self.put_resource(&path, payload).await
    }

    async fn get_share_subscription(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
    ) -> Result<Lookup<ShareSubscription>> {
        self.get_resource(&self.share_subscription_path(
            resource_group,
            account,
            share_subscription,
        ))
        .await
    }

    async fn create_share_subscription(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
        payload: &ShareSubscription,
    ) -> Result<ShareSubscription> {
        self.put_resource(
            &self.share_subscription_path(resource_group, account, share_subscription),
            payload,
        )
        .await
    }

    async fn list_consumer_source_data_sets(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
    ) -> Result<Vec<ConsumerSourceDataSet>> {
        let path = format!(
            "{}/consumerSourceDataSets",
            self.share_subscription_path(resource_group, account, share_subscription)
        );
        let response = self.arm.get_raw(&self.url(&path)).await?;

        if !response.is_success() {
            return Err(self.api_error(&response));
        }

        let list: ResourceList<ConsumerSourceDataSet> = self.parse_body(&response)?;
        Ok(list.value)
    }

    async fn get_data_set_mapping(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
        mapping: &str,
    ) -> Result<Lookup<DataSetMapping>> {
        let path = format!(
            "{}/dataSetMappings/{}",
            self.share_subscription_path(resource_group, account, share_subscription),
            mapping
        );
        self.get_resource(&path).await
    }

    async fn create_data_set_mapping(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
        mapping: &str,
        payload: &DataSetMapping,
    ) -> Result<DataSetMapping> {
        let path = format!(
            "{}/dataSetMappings/{}",
            self.share_subscription_path(resource_group, account, share_subscription),
            mapping
        );
        self.put_resource(&path, payload).await
    }

    async fn synchronize(
        &self,
        resource_group: &str,
        account: &str,
        share_subscription: &str,
    ) -> Result<ShareSubscriptionSynchronization> {
        let path = format!(
            "{}/Synchronize",
            self.share_subscription_path(resource_group, account, share_subscription)
        );
        let body = serde_json::json!({ "synchronizationMode": "FullSync" });
        let response = self.arm.post_raw(&self.url(&path), &body).await?;

        if !response.is_success() {
            return Err(self.api_error(&response));
        }

        // The action may answer 202 with an empty body before the
        // synchronization record exists.
        if response.body.trim().is_empty() {
            return Ok(ShareSubscriptionSynchronization::default());
        }

        self.parse_body(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::AzureAuthProvider;
    use azure_core::auth::AccessToken;

    struct StubAuthProvider;

    #[async_trait]
    impl AzureAuthProvider for StubAuthProvider {
        async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken> {
            Ok(AccessToken::new(
                "stub-token".to_string(),
                time::OffsetDateTime::now_utc() + time::Duration::hours(1),
            ))
        }

        async fn get_tenant_id(&self) -> Result<String> {
            Ok("stub-tenant".to_string())
        }

        async fn get_object_id(&self) -> Result<String> {
            Ok("stub-object".to_string())
        }

        async fn get_client_id(&self) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn operations() -> AzureDataShareOperations {
        let arm = ArmClient::new(
            Arc::new(StubAuthProvider),
            "https://management.azure.com",
            "sub-1".to_string(),
        )
        .unwrap();
        AzureDataShareOperations::new(Arc::new(arm))
    }

    #[test]
    fn account_path_format() {
        let ops = operations();
        assert_eq!(
            ops.account_path("rg-1", "acct"),
            "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.DataShare/accounts/acct"
        );
    }

    #[test]
    fn nested_paths_and_api_version() {
        let ops = operations();
        assert_eq!(
            ops.url(&ops.share_path("rg", "acct", "share1")),
            "https://management.azure.com/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.DataShare/accounts/acct/shares/share1?api-version=2019-11-01"
        );
        assert_eq!(
            ops.share_subscription_path("rg", "acct", "recv"),
            "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.DataShare/accounts/acct/shareSubscriptions/recv"
        );
    }

    #[test]
    fn lookup_into_option() {
        assert_eq!(Lookup::Found(7).into_option(), Some(7));
        assert_eq!(Lookup::<i32>::NotFound.into_option(), None);
    }
}
