//! Authentication provider trait and implementations
//!
//! This module defines the authentication provider trait and the
//! service-principal implementation used for both the provider and the
//! consumer side of a data share.

use async_trait::async_trait;
use azure_core::auth::{AccessToken, TokenCredential};
use azure_identity::ClientSecretCredential;
use reqwest::{header::HeaderMap, Client};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{Result, SharebridgeError};

/// Trait for Azure authentication providers
#[async_trait]
pub trait AzureAuthProvider: Send + Sync {
    /// Get an access token for the specified scopes
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken>;

    /// Get the tenant ID
    async fn get_tenant_id(&self) -> Result<String>;

    /// Get the object ID for the service principal
    async fn get_object_id(&self) -> Result<String>;

    /// Get the client ID (if applicable)
    async fn get_client_id(&self) -> Result<Option<String>>;
}

/// Client secret authentication provider
///
/// Each data-share principal authenticates with its own client secret, so
/// one provider instance exists per configured principal.
pub struct ClientSecretProvider {
    credential: Arc<ClientSecretCredential>,
    http_client: Client,
    tenant_id: String,
    client_id: String,
}

impl ClientSecretProvider {
    /// Create a new ClientSecretProvider against the given authority host
    pub fn new(
        authority: &str,
        tenant_id: String,
        client_id: String,
        client_secret: String,
    ) -> Result<Self> {
        let http_client = Client::new();
        let authority = format!("{}/{}", authority.trim_end_matches('/'), tenant_id);
        let authority_url = url::Url::parse(&authority)
            .map_err(|e| SharebridgeError::config(format!("Invalid authority URL: {}", e)))?;

        let http_client_arc = Arc::new(reqwest::Client::new());
        let credential = Arc::new(ClientSecretCredential::new(
            http_client_arc,
            authority_url,
            client_secret,
            tenant_id.clone(),
            client_id.clone(),
        ));

        Ok(Self {
            credential,
            http_client,
            tenant_id,
            client_id,
        })
    }

    /// Get service principal information from Microsoft Graph
    async fn get_service_principal_info(&self, access_token: &str) -> Result<Value> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", access_token).parse().map_err(|e| {
                SharebridgeError::authentication(format!("Invalid token format: {}", e))
            })?,
        );

        let url = format!(
            "https://graph.microsoft.com/v1.0/servicePrincipals?$filter=appId eq '{}'",
            self.client_id
        );
        let response = self
            .http_client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| SharebridgeError::network(format!("Failed to call Graph API: {}", e)))?;

        if !response.status().is_success() {
            return Err(SharebridgeError::authentication(format!(
                "Graph API error: HTTP {}",
                response.status()
            )));
        }

        let sp_info: Value = response.json().await.map_err(|e| {
            SharebridgeError::serialization(format!(
                "Failed to parse service principal info: {}",
                e
            ))
        })?;

        Ok(sp_info)
    }
}

#[async_trait]
impl AzureAuthProvider for ClientSecretProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        let token_response = self.credential.get_token(scopes).await.map_err(|e| {
            SharebridgeError::authentication(format!("Failed to get token: {}", e))
        })?;

        Ok(token_response)
    }

    async fn get_tenant_id(&self) -> Result<String> {
        Ok(self.tenant_id.clone())
    }

    async fn get_object_id(&self) -> Result<String> {
        let token = self.get_token(&["https://graph.microsoft.com/.default"]).await?;
        let sp_info = self.get_service_principal_info(token.token.secret()).await?;

        sp_info
            .get("value")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|sp| sp.get("id"))
            .and_then(|id| id.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                SharebridgeError::authentication(
                    "Unable to determine service principal object ID".to_string(),
                )
            })
    }

    async fn get_client_id(&self) -> Result<Option<String>> {
        Ok(Some(self.client_id.clone()))
    }
}
