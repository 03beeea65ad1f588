//! Shared Azure Resource Manager client
//!
//! Bearer-token header construction, URL building and raw request helpers
//! shared by the resource-group, role-assignment and data-share surfaces.

use reqwest::header::HeaderMap;
use reqwest::Client;
use std::sync::Arc;

use crate::auth::provider::AzureAuthProvider;
use crate::error::{Result, SharebridgeError};
use crate::utils::network::{
    classify_network_error, create_http_client, read_response, NetworkConfig, RawResponse,
};

pub struct ArmClient {
    auth_provider: Arc<dyn AzureAuthProvider>,
    http_client: Client,
    endpoint: String,
    subscription_id: String,
}

impl ArmClient {
    pub fn new(
        auth_provider: Arc<dyn AzureAuthProvider>,
        endpoint: &str,
        subscription_id: String,
    ) -> Result<Self> {
        let network_config = NetworkConfig::default();
        let http_client = create_http_client(&network_config)?;

        Ok(Self {
            auth_provider,
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            subscription_id,
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Build a full management URL from an ARM resource path
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Get an access token for the management endpoint
    async fn get_management_token(&self) -> Result<String> {
        let scope = format!("{}/.default", self.endpoint);
        let token = self.auth_provider.get_token(&[scope.as_str()]).await?;
        Ok(token.token.secret().to_string())
    }

    /// Create authorized headers for the management REST API
    async fn create_headers(&self) -> Result<HeaderMap> {
        let token = self.get_management_token().await?;
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", token).parse().map_err(|e| {
                SharebridgeError::authentication(format!("Invalid token format: {}", e))
            })?,
        );
        headers.insert("Content-Type", "application/json".parse().unwrap());
        headers.insert("Accept", "application/json".parse().unwrap());
        Ok(headers)
    }

    pub async fn get_raw(&self, url: &str) -> Result<RawResponse> {
        let headers = self.create_headers().await?;
        let response = self
            .http_client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| classify_network_error(&e, url))?;

        read_response(response).await
    }

    pub async fn put_raw(&self, url: &str, body: &serde_json::Value) -> Result<RawResponse> {
        let headers = self.create_headers().await?;
        let response = self
            .http_client
            .put(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_network_error(&e, url))?;

        read_response(response).await
    }

    pub async fn post_raw(&self, url: &str, body: &serde_json::Value) -> Result<RawResponse> {
        let headers = self.create_headers().await?;
        let response = self
            .http_client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_network_error(&e, url))?;

        read_response(response).await
    }
}
