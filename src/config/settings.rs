//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources,
//! validation, and resolution of unset resource names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

use crate::error::{Result, SharebridgeError};
use crate::utils::helpers::{
    is_guid, validate_resource_group_name, validate_storage_account_name, NameGenerator,
};

/// Default configuration file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "sharebridge.toml";

/// A client secret that is wiped from memory on drop
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(****)")
    }
}

impl Drop for ClientSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Data Share resource names for one principal. Unset names are filled with
/// generated ones before provisioning starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataShareNames {
    pub resource_group: Option<String>,
    pub account_name: Option<String>,
    pub share_name: Option<String>,
    pub invitation_name: Option<String>,
    pub data_set_name: Option<String>,
    pub share_subscription_name: Option<String>,
    pub data_set_mapping_name: Option<String>,
}

impl DataShareNames {
    fn fill_unset(&mut self, generator: &mut NameGenerator) {
        for slot in [
            &mut self.resource_group,
            &mut self.account_name,
            &mut self.share_name,
            &mut self.invitation_name,
            &mut self.data_set_name,
            &mut self.share_subscription_name,
            &mut self.data_set_mapping_name,
        ] {
            if slot.as_deref().map_or(true, str::is_empty) {
                *slot = Some(generator.next_name());
            }
        }
    }
}

/// Storage account coordinates a data set or mapping points at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub resource_group: String,
    pub account_name: String,
    pub container_name: String,
}

/// One side of the data share: a service principal plus the resources it
/// owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalConfig {
    pub tenant_id: String,
    pub client_id: String,
    #[serde(default)]
    pub object_id: Option<String>,
    pub secret: ClientSecret,
    pub subscription_id: String,
    #[serde(default)]
    pub data_share: DataShareNames,
    pub storage: StorageConfig,
}

impl PrincipalConfig {
    fn validate(&self, side: &str) -> Result<()> {
        if !is_guid(&self.tenant_id) {
            return Err(SharebridgeError::config(format!(
                "{side}: tenant_id must be a GUID"
            )));
        }
        if !is_guid(&self.client_id) {
            return Err(SharebridgeError::config(format!(
                "{side}: client_id must be a GUID"
            )));
        }
        if !is_guid(&self.subscription_id) {
            return Err(SharebridgeError::config(format!(
                "{side}: subscription_id must be a GUID"
            )));
        }
        if let Some(object_id) = &self.object_id {
            if !is_guid(object_id) {
                return Err(SharebridgeError::config(format!(
                    "{side}: object_id must be a GUID when set"
                )));
            }
        }
        if self.secret.is_empty() {
            return Err(SharebridgeError::config(format!(
                "{side}: secret is required"
            )));
        }

        validate_resource_group_name(&self.storage.resource_group)?;
        validate_storage_account_name(&self.storage.account_name)?;
        if self.storage.container_name.is_empty() {
            return Err(SharebridgeError::config(format!(
                "{side}: storage container_name is required"
            )));
        }

        if let Some(resource_group) = &self.data_share.resource_group {
            validate_resource_group_name(resource_group)?;
        }

        Ok(())
    }
}

fn default_arm_endpoint() -> String {
    "https://management.azure.com".to_string()
}

fn default_authority() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_location() -> String {
    "eastus2".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub provider: PrincipalConfig,
    pub consumer: PrincipalConfig,
    #[serde(default = "default_arm_endpoint")]
    pub arm_endpoint: String,
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub no_color: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.arm_endpoint)
            .map_err(|e| SharebridgeError::config(format!("Invalid arm_endpoint: {}", e)))?;
        url::Url::parse(&self.authority)
            .map_err(|e| SharebridgeError::config(format!("Invalid authority: {}", e)))?;

        if self.location.is_empty() {
            return Err(SharebridgeError::config("location is required"));
        }

        self.provider.validate("provider")?;
        self.consumer.validate("consumer")?;

        Ok(())
    }

    /// Fill every unset resource name from the passed generator
    pub fn resolve_names(&mut self, generator: &mut NameGenerator) {
        self.provider.data_share.fill_unset(generator);
        self.consumer.data_share.fill_unset(generator);
    }

    pub fn get_config_path() -> Result<PathBuf> {
        // XDG Base Directory specification on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| SharebridgeError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("sharebridge").join(CONFIG_FILE_NAME))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| SharebridgeError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("sharebridge").join(CONFIG_FILE_NAME))
        }
    }
}

/// Locate the configuration file: the working directory first, then the
/// user config directory.
pub fn discover_config_path() -> Result<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    Config::get_config_path()
}

/// Load configuration from the given path, or from the discovered default
/// location. Applies environment variable overrides.
pub async fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => discover_config_path()?,
    };

    if !path.exists() {
        return Err(SharebridgeError::config(format!(
            "No configuration found at '{}'. Run 'sbr init' to create one.",
            path.display()
        )));
    }

    let contents = tokio::fs::read_to_string(&path).await?;
    let mut config = parse_config(&contents)?;
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Parse as TOML first, then JSON as fallback
fn parse_config(contents: &str) -> Result<Config> {
    if let Ok(config) = toml::from_str::<Config>(contents) {
        return Ok(config);
    }

    let config = serde_json::from_str::<Config>(contents)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(value) = std::env::var("SHAREBRIDGE_LOCATION") {
        config.location = value;
    }

    if let Ok(value) = std::env::var("SHAREBRIDGE_ARM_ENDPOINT") {
        config.arm_endpoint = value;
    }

    if let Ok(value) = std::env::var("SHAREBRIDGE_AUTHORITY") {
        config.authority = value;
    }

    if let Ok(value) = std::env::var("SHAREBRIDGE_PROVIDER_SECRET") {
        config.provider.secret = ClientSecret::new(value);
    }

    if let Ok(value) = std::env::var("SHAREBRIDGE_CONSUMER_SECRET") {
        config.consumer.secret = ClientSecret::new(value);
    }

    if let Ok(value) = std::env::var("SHAREBRIDGE_DEBUG") {
        config.debug = value.to_lowercase() == "true" || value == "1";
    }
}
