//! Provisioning flows
//!
//! One [`ShareProvisioner`] exists per configured principal. It owns that
//! principal's credentials, the data share client and the ARM plumbing, and
//! exposes the get-or-create steps the provider and consumer flows are
//! sequenced from.

use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::models::{
    Account, ConsumerSourceDataSet, DataSet, DataSetMapping, Invitation, ProvisioningState, Share,
    ShareSubscription, ShareSubscriptionSynchronization,
};
use super::operations::{DataShareOperations, Lookup};
use crate::arm::resources::ResourceGroups;
use crate::arm::roles::{RoleAssignmentOutcome, RoleAssignments};
use crate::auth::provider::AzureAuthProvider;
use crate::config::settings::PrincipalConfig;
use crate::error::{Result, SharebridgeError};
use crate::utils::format::DisplayUtils;

const PROVISIONING_POLL_INTERVAL: Duration = Duration::from_secs(5);
const PROVISIONING_POLL_LIMIT: u32 = 60;

const SHARE_DESCRIPTION: &str = "Test Share";
const SHARE_TERMS: &str = "Terms";

fn resolved<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value.as_deref().ok_or_else(|| {
        SharebridgeError::config(format!(
            "{} is not set; resource names must be resolved before provisioning",
            field
        ))
    })
}

/// Provisioning operations for one side of the data share
pub struct ShareProvisioner {
    ops: Arc<dyn DataShareOperations>,
    resource_groups: ResourceGroups,
    role_assignments: RoleAssignments,
    auth_provider: Arc<dyn AzureAuthProvider>,
    principal: PrincipalConfig,
    location: String,
    display: DisplayUtils,
}

impl ShareProvisioner {
    pub fn new(
        ops: Arc<dyn DataShareOperations>,
        resource_groups: ResourceGroups,
        role_assignments: RoleAssignments,
        auth_provider: Arc<dyn AzureAuthProvider>,
        principal: PrincipalConfig,
        location: String,
        no_color: bool,
    ) -> Self {
        Self {
            ops,
            resource_groups,
            role_assignments,
            auth_provider,
            principal,
            location,
            display: DisplayUtils::new(no_color),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.principal.tenant_id
    }

    /// AAD object id of this principal: the configured one, or resolved
    /// through Microsoft Graph.
    pub async fn object_id(&self) -> Result<String> {
        if let Some(object_id) = &self.principal.object_id {
            return Ok(object_id.clone());
        }

        debug!("object_id not configured, resolving through Microsoft Graph");
        self.auth_provider.get_object_id().await
    }

    fn resource_group_name(&self) -> Result<&str> {
        resolved(&self.principal.data_share.resource_group, "data_share.resource_group")
    }

    fn account_name(&self) -> Result<&str> {
        resolved(&self.principal.data_share.account_name, "data_share.account_name")
    }

    fn share_name(&self) -> Result<&str> {
        resolved(&self.principal.data_share.share_name, "data_share.share_name")
    }

    fn invitation_name(&self) -> Result<&str> {
        resolved(&self.principal.data_share.invitation_name, "data_share.invitation_name")
    }

    fn share_subscription_name(&self) -> Result<&str> {
        resolved(
            &self.principal.data_share.share_subscription_name,
            "data_share.share_subscription_name",
        )
    }

    fn data_set_name(&self) -> Result<&str> {
        resolved(&self.principal.data_share.data_set_name, "data_share.data_set_name")
    }

    fn data_set_mapping_name(&self) -> Result<&str> {
        resolved(
            &self.principal.data_share.data_set_mapping_name,
            "data_share.data_set_mapping_name",
        )
    }

    /// Idempotent resource group creation
    pub async fn ensure_resource_group(&self, cancel: &CancellationToken) -> Result<()> {
        let name = self.resource_group_name()?;
        let group = self.resource_groups.ensure(name, &self.location, cancel).await?;
        self.display
            .print_success(&format!("Created resource group {}", group.id))?;

        Ok(())
    }

    /// Get-or-create the data share account, waiting until it is provisioned
    pub async fn ensure_account(&self, cancel: &CancellationToken) -> Result<Account> {
        let resource_group = self.resource_group_name()?;
        let name = self.account_name()?;

        let account = match self.ops.get_account(resource_group, name).await? {
            Lookup::Found(account) => {
                self.display.print_info(&format!(
                    "Returning existing data share account {}",
                    account.resource_id()
                ))?;
                account
            }
            Lookup::NotFound => {
                self.display.print_info(
                    "Creating data share account (can take up to 30 seconds)...",
                )?;
                let payload = Account::create_payload(&self.location);
                let created = self.ops.create_account(resource_group, name, &payload).await?;
                self.display.print_success(&format!(
                    "Created data share account {}",
                    created.resource_id()
                ))?;
                created
            }
        };

        self.wait_for_provisioning(account, cancel).await
    }

    /// Poll until the account leaves its provisioning state
    async fn wait_for_provisioning(
        &self,
        account: Account,
        cancel: &CancellationToken,
    ) -> Result<Account> {
        let resource_group = self.resource_group_name()?;
        let name = self.account_name()?;

        let spinner = ProgressBar::new_spinner()
            .with_message(format!("Waiting for account '{}' to provision", name));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let mut current = account;
        for _ in 0..PROVISIONING_POLL_LIMIT {
            match current.provisioning_state() {
                Some(ProvisioningState::Succeeded) => {
                    spinner.finish_and_clear();
                    return Ok(current);
                }
                Some(ProvisioningState::Failed) => {
                    spinner.finish_and_clear();
                    return Err(SharebridgeError::azure_api(format!(
                        "Provisioning of data share account '{}' failed",
                        name
                    )));
                }
                state => debug!(?state, account = name, "account still provisioning"),
            }

            tokio::select! {
                _ = sleep(PROVISIONING_POLL_INTERVAL) => {}
                _ = cancel.cancelled() => {
                    spinner.finish_and_clear();
                    return Err(SharebridgeError::Cancelled);
                }
            }

            current = match self.ops.get_account(resource_group, name).await? {
                Lookup::Found(account) => account,
                Lookup::NotFound => {
                    spinner.finish_and_clear();
                    return Err(SharebridgeError::azure_api(format!(
                        "Data share account '{}' disappeared while provisioning",
                        name
                    )));
                }
            };
        }

        spinner.finish_and_clear();
        Err(SharebridgeError::timeout(format!(
            "data share account '{}' provisioning",
            name
        )))
    }

    /// Get-or-create the share
    pub async fn ensure_share(&self) -> Result<Share> {
        let resource_group = self.resource_group_name()?;
        let account = self.account_name()?;
        let name = self.share_name()?;

        match self.ops.get_share(resource_group, account, name).await? {
            Lookup::Found(share) => {
                self.display
                    .print_info(&format!("Returning existing share {}", share.resource_id()))?;
                Ok(share)
            }
            Lookup::NotFound => {
                let payload = Share::copy_based(SHARE_DESCRIPTION, SHARE_TERMS);
                let share = self
                    .ops
                    .create_share(resource_group, account, name, &payload)
                    .await?;
                self.display
                    .print_success(&format!("Created share {}", share.resource_id()))?;
                Ok(share)
            }
        }
    }

    /// Assign a storage role to the account's managed identity
    pub async fn assign_account_role(
        &self,
        account: &Account,
        role_definition_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let principal_id = account.principal_id().ok_or_else(|| {
            SharebridgeError::azure_api(format!(
                "Data share account {} has no managed identity principal",
                account.resource_id()
            ))
        })?;

        let scope = RoleAssignments::storage_scope(
            &self.principal.subscription_id,
            &self.principal.storage.resource_group,
            &self.principal.storage.account_name,
        );

        info!(scope = %scope, role = role_definition_id, "assigning storage role");
        let outcome = self
            .role_assignments
            .ensure_assignment(&scope, role_definition_id, principal_id, cancel)
            .await?;

        match outcome {
            RoleAssignmentOutcome::Applied => self.display.print_success(&format!(
                "Assigned role {} to managed identity {}",
                role_definition_id, principal_id
            ))?,
            RoleAssignmentOutcome::AlreadyExists => self.display.print_info(&format!(
                "Role assignment with {} for managed identity {} already exists",
                role_definition_id, principal_id
            ))?,
        }

        Ok(())
    }

    /// Get-or-create the blob container data set published into the share
    pub async fn ensure_data_set(&self) -> Result<DataSet> {
        let resource_group = self.resource_group_name()?;
        let account = self.account_name()?;
        let share = self.share_name()?;
        let name = self.data_set_name()?;

        match self
            .ops
            .get_data_set(resource_group, account, share, name)
            .await?
        {
            Lookup::Found(data_set) => {
                self.display.print_info(&format!(
                    "Returning existing data set {}",
                    data_set.resource_id()
                ))?;
                Ok(data_set)
            }
            Lookup::NotFound => {
                self.display
                    .print_info("Data set does not exist, creating new...")?;
                let payload = DataSet::blob_container(
                    &self.principal.subscription_id,
                    &self.principal.storage.resource_group,
                    &self.principal.storage.account_name,
                    &self.principal.storage.container_name,
                );
                let data_set = self
                    .ops
                    .create_data_set(resource_group, account, share, name, &payload)
                    .await?;
                self.display
                    .print_success(&format!("Created data set {}", data_set.resource_id()))?;
                Ok(data_set)
            }
        }
    }

    /// Get-or-create the invitation addressed to the consumer principal
    pub async fn ensure_invitation(
        &self,
        consumer_tenant_id: &str,
        consumer_object_id: &str,
    ) -> Result<Invitation> {
        let resource_group = self.resource_group_name()?;
        let account = self.account_name()?;
        let share = self.share_name()?;
        let name = self.invitation_name()?;

        match self
            .ops
            .get_invitation(resource_group, account, share, name)
            .await?
        {
            Lookup::Found(invitation) => {
                self.display.print_info(&format!(
                    "Returning existing invitation {}",
                    invitation.resource_id()
                ))?;
                Ok(invitation)
            }
            Lookup::NotFound => {
                self.display
                    .print_info("Invitation does not exist, creating new...")?;
                let payload = Invitation::for_target(consumer_tenant_id, consumer_object_id);
                let invitation = self
                    .ops
                    .create_invitation(resource_group, account, share, name, &payload)
                    .await?;
                self.display.print_success(&format!(
                    "Created invitation {}",
                    invitation.resource_id()
                ))?;
                Ok(invitation)
            }
        }
    }

    /// Look up the invitation without creating it
    pub async fn get_invitation(&self) -> Result<Lookup<Invitation>> {
        self.ops
            .get_invitation(
                self.resource_group_name()?,
                self.account_name()?,
                self.share_name()?,
                self.invitation_name()?,
            )
            .await
    }

    /// Redeem the invitation into a share subscription.
    ///
    /// An already-accepted invitation cannot be redeemed again: the existing
    /// subscription is returned instead, after checking it was created for
    /// this invitation.
    pub async fn ensure_share_subscription(
        &self,
        invitation: &Invitation,
    ) -> Result<ShareSubscription> {
        let resource_group = self.resource_group_name()?;
        let account = self.account_name()?;
        let name = self.share_subscription_name()?;

        let invitation_id = invitation.invitation_id().ok_or_else(|| {
            SharebridgeError::config("Invitation has no invitation id".to_string())
        })?;

        if invitation.is_accepted() {
            self.display.print_info(&format!(
                "Invitation {} is already accepted, looking up the share subscription...",
                invitation_id
            ))?;

            return match self
                .ops
                .get_share_subscription(resource_group, account, name)
                .await?
            {
                Lookup::Found(subscription) => {
                    if subscription.invitation_id() != Some(invitation_id) {
                        return Err(SharebridgeError::config(format!(
                            "Share subscription '{}' was not created for invitation {}; make sure \
                             the configuration is valid",
                            name, invitation_id
                        )));
                    }

                    self.display.print_info(&format!(
                        "Found share subscription {}",
                        subscription.resource_id()
                    ))?;
                    Ok(subscription)
                }
                Lookup::NotFound => Err(SharebridgeError::config(format!(
                    "Share subscription '{}' does not exist although invitation {} is accepted; \
                     make sure the configuration is valid",
                    name, invitation_id
                ))),
            };
        }

        let payload = ShareSubscription::from_invitation(invitation_id, &self.location);
        let subscription = self
            .ops
            .create_share_subscription(resource_group, account, name, &payload)
            .await?;
        self.display.print_success(&format!(
            "Created share subscription {}",
            subscription.resource_id()
        ))?;

        Ok(subscription)
    }

    /// First data set offered through the share subscription
    pub async fn first_consumer_source_data_set(&self) -> Result<ConsumerSourceDataSet> {
        let sets = self
            .ops
            .list_consumer_source_data_sets(
                self.resource_group_name()?,
                self.account_name()?,
                self.share_subscription_name()?,
            )
            .await?;

        sets.into_iter().next().ok_or_else(|| {
            SharebridgeError::azure_api(
                "Share subscription has no consumer source data sets yet".to_string(),
            )
        })
    }

    /// Get-or-create the mapping from the received data set to storage
    pub async fn ensure_data_set_mapping(
        &self,
        source: &ConsumerSourceDataSet,
    ) -> Result<DataSetMapping> {
        let resource_group = self.resource_group_name()?;
        let account = self.account_name()?;
        let share_subscription = self.share_subscription_name()?;
        let name = self.data_set_mapping_name()?;

        match self
            .ops
            .get_data_set_mapping(resource_group, account, share_subscription, name)
            .await?
        {
            Lookup::Found(mapping) => {
                self.display.print_info("Found existing data set mapping.")?;
                Ok(mapping)
            }
            Lookup::NotFound => {
                self.display
                    .print_info("Data set mapping does not exist, creating a new one...")?;
                let data_set_id = source.data_set_id().ok_or_else(|| {
                    SharebridgeError::azure_api(
                        "Consumer source data set has no data set id".to_string(),
                    )
                })?;
                let payload = DataSetMapping::blob_container(
                    data_set_id,
                    &self.principal.subscription_id,
                    &self.principal.storage.resource_group,
                    &self.principal.storage.account_name,
                    &self.principal.storage.container_name,
                );
                let mapping = self
                    .ops
                    .create_data_set_mapping(
                        resource_group,
                        account,
                        share_subscription,
                        name,
                        &payload,
                    )
                    .await?;
                self.display.print_success(&format!(
                    "Created data set mapping {}",
                    mapping.resource_id()
                ))?;
                Ok(mapping)
            }
        }
    }

    /// Trigger a one-time snapshot copy
    pub async fn synchronize(&self) -> Result<ShareSubscriptionSynchronization> {
        match self
            .ops
            .synchronize(
                self.resource_group_name()?,
                self.account_name()?,
                self.share_subscription_name()?,
            )
            .await
        {
            Ok(synchronization) => Ok(synchronization),
            Err(error) => {
                self.display
                    .print_error(&format!("Error in running snapshot copy - {}", error))?;
                Err(error)
            }
        }
    }
}

/// Provider-side results the consumer flow needs
pub struct ProvisionedProvider {
    pub account: Account,
    pub invitation: Invitation,
}

/// Consumer-side results for the final narration
pub struct ProvisionedConsumer {
    pub account: Account,
    pub synchronization: ShareSubscriptionSynchronization,
}

/// Provider flow: resource group, account, share, storage role for the
/// account identity, data set, invitation.
pub async fn run_provider_flow(
    provider: &ShareProvisioner,
    consumer_tenant_id: &str,
    consumer_object_id: &str,
    cancel: &CancellationToken,
) -> Result<ProvisionedProvider> {
    provider.ensure_resource_group(cancel).await?;
    let account = provider.ensure_account(cancel).await?;
    provider.ensure_share().await?;
    provider
        .assign_account_role(&account, crate::arm::roles::STORAGE_BLOB_DATA_READER, cancel)
        .await?;
    provider.ensure_data_set().await?;
    let invitation = provider
        .ensure_invitation(consumer_tenant_id, consumer_object_id)
        .await?;

    Ok(ProvisionedProvider { account, invitation })
}

/// Consumer flow: resource group, account, share subscription from the
/// invitation, storage role, data set mapping, snapshot copy.
pub async fn run_consumer_flow(
    consumer: &ShareProvisioner,
    invitation: &Invitation,
    cancel: &CancellationToken,
) -> Result<ProvisionedConsumer> {
    consumer.ensure_resource_group(cancel).await?;
    let account = consumer.ensure_account(cancel).await?;
    consumer.ensure_share_subscription(invitation).await?;
    consumer
        .assign_account_role(
            &account,
            crate::arm::roles::STORAGE_BLOB_DATA_CONTRIBUTOR,
            cancel,
        )
        .await?;
    let source = consumer.first_consumer_source_data_set().await?;
    consumer.ensure_data_set_mapping(&source).await?;
    let synchronization = consumer.synchronize().await?;

    Ok(ProvisionedConsumer {
        account,
        synchronization,
    })
}
