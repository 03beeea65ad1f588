//! Command definitions and execution
//!
//! This module contains the command-line interface for sharebridge,
//! including argument parsing and the sequencing of the provisioning
//! flows.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::arm::client::ArmClient;
use crate::arm::resources::ResourceGroups;
use crate::arm::roles::RoleAssignments;
use crate::auth::provider::{AzureAuthProvider, ClientSecretProvider};
use crate::config::init::write_starter_config;
use crate::config::settings::{discover_config_path, Config, PrincipalConfig};
use crate::error::{Result, SharebridgeError};
use crate::share::manager::{run_consumer_flow, run_provider_flow, ShareProvisioner};
use crate::share::operations::{AzureDataShareOperations, Lookup};
use crate::utils::format::DisplayUtils;
use crate::utils::helpers::NameGenerator;

/// Build metadata stamped by build.rs
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_branch: &'static str,
    pub build_time: &'static str,
    pub full_version: &'static str,
}

pub const BUILD_INFO: BuildInfo = BuildInfo {
    version: env!("CARGO_PKG_VERSION"),
    git_hash: env!("GIT_HASH"),
    git_branch: env!("GIT_BRANCH"),
    build_time: env!("BUILD_TIME"),
    full_version: env!("FULL_VERSION"),
};

fn get_version() -> &'static str {
    BUILD_INFO.full_version
}

#[derive(Parser)]
#[command(name = "sbr")]
#[command(about = "Provision and wire Azure Data Share provider/consumer accounts")]
#[command(version = get_version(), author)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Seed for generated resource names (random when unset)
    #[arg(long, global = true, value_name = "SEED")]
    pub name_seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision both sides and run a snapshot copy end-to-end
    Provision,
    /// Provision the provider side only (account, share, data set, invitation)
    Provider,
    /// Accept the invitation and wire the consumer side
    Consumer,
    /// Trigger a one-time snapshot copy on the consumer share subscription
    Sync,
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Show detailed version and build information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration with secrets redacted
    Show,
    /// Print the configuration file path
    Path,
}

impl Cli {
    pub async fn execute(self, config: Option<Config>) -> Result<()> {
        let Cli {
            config: config_path,
            debug: _,
            no_color,
            name_seed,
            command,
        } = self;

        let no_color = no_color || config.as_ref().is_some_and(|c| c.no_color);
        let display = DisplayUtils::new(no_color);

        match command {
            Commands::Provision => {
                let config = provisioning_config(config, name_seed)?;
                run_provision(&config, no_color, &display).await
            }
            Commands::Provider => {
                let config = provisioning_config(config, name_seed)?;
                run_provider(&config, no_color, &display).await
            }
            Commands::Consumer => {
                let config = provisioning_config(config, name_seed)?;
                run_consumer(&config, no_color, &display).await
            }
            Commands::Sync => {
                let config = provisioning_config(config, name_seed)?;
                run_sync(&config, no_color, &display).await
            }
            Commands::Init { force } => {
                let path = write_starter_config(config_path.as_deref(), force).await?;
                display.print_success(&format!(
                    "Wrote starter configuration to '{}'",
                    path.display()
                ))?;
                display.print_info("Fill in both service principals before provisioning.")?;
                Ok(())
            }
            Commands::Config { command } => match command {
                ConfigCommands::Show => {
                    let config = config.ok_or_else(|| {
                        SharebridgeError::config("Configuration was not loaded")
                    })?;
                    show_config(&config, &display)
                }
                ConfigCommands::Path => {
                    let path = match config_path {
                        Some(path) => path,
                        None => discover_config_path()?,
                    };
                    println!("{}", path.display());
                    Ok(())
                }
            },
            Commands::Completions { shell } => {
                clap_complete::generate(shell, &mut Cli::command(), "sbr", &mut std::io::stdout());
                Ok(())
            }
            Commands::Version => show_version(&display),
        }
    }
}

/// Finalize the loaded configuration for a provisioning command: every unset
/// resource name is filled from the generator owned here.
fn provisioning_config(config: Option<Config>, name_seed: Option<u64>) -> Result<Config> {
    let mut config =
        config.ok_or_else(|| SharebridgeError::config("Configuration was not loaded"))?;

    let mut generator = match name_seed {
        Some(seed) => NameGenerator::with_seed(seed),
        None => NameGenerator::new(),
    };
    config.resolve_names(&mut generator);

    Ok(config)
}

/// A cancellation token wired to ctrl-c
fn cancellation_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, cancelling");
            ctrl_c.cancel();
        }
    });

    cancel
}

fn build_provisioner(
    config: &Config,
    principal: &PrincipalConfig,
    no_color: bool,
) -> Result<ShareProvisioner> {
    let auth: Arc<dyn AzureAuthProvider> = Arc::new(ClientSecretProvider::new(
        &config.authority,
        principal.tenant_id.clone(),
        principal.client_id.clone(),
        principal.secret.expose().to_string(),
    )?);
    let arm = Arc::new(ArmClient::new(
        auth.clone(),
        &config.arm_endpoint,
        principal.subscription_id.clone(),
    )?);
    let ops = Arc::new(AzureDataShareOperations::new(arm.clone()));

    Ok(ShareProvisioner::new(
        ops,
        ResourceGroups::new(arm.clone()),
        RoleAssignments::new(arm),
        auth,
        principal.clone(),
        config.location.clone(),
        no_color,
    ))
}

async fn run_provision(config: &Config, no_color: bool, display: &DisplayUtils) -> Result<()> {
    let cancel = cancellation_token();

    let provider = build_provisioner(config, &config.provider, no_color)?;
    let consumer = build_provisioner(config, &config.consumer, no_color)?;

    display.print_info("Idempotent creates for provider resources...")?;
    let consumer_object_id = consumer.object_id().await?;
    let provider_result =
        run_provider_flow(&provider, consumer.tenant_id(), &consumer_object_id, &cancel).await?;

    display.print_info("Idempotent creates for consumer resources...")?;
    let consumer_result = run_consumer_flow(&consumer, &provider_result.invitation, &cancel).await?;

    let status = consumer_result
        .synchronization
        .status
        .as_deref()
        .unwrap_or("Unknown");
    display.print_success(&format!(
        "Synchronization status: {}. Check resource {} on https://portal.azure.com for further details.",
        status,
        consumer_result.account.resource_id()
    ))?;

    Ok(())
}

async fn run_provider(config: &Config, no_color: bool, display: &DisplayUtils) -> Result<()> {
    let cancel = cancellation_token();

    let provider = build_provisioner(config, &config.provider, no_color)?;
    let consumer = build_provisioner(config, &config.consumer, no_color)?;

    display.print_info("Idempotent creates for provider resources...")?;
    let consumer_object_id = consumer.object_id().await?;
    let provider_result =
        run_provider_flow(&provider, consumer.tenant_id(), &consumer_object_id, &cancel).await?;

    display.print_success(&format!(
        "Provider side is ready; invitation {} awaits the consumer.",
        provider_result.invitation.resource_id()
    ))?;

    Ok(())
}

async fn run_consumer(config: &Config, no_color: bool, display: &DisplayUtils) -> Result<()> {
    let cancel = cancellation_token();

    let provider = build_provisioner(config, &config.provider, no_color)?;
    let consumer = build_provisioner(config, &config.consumer, no_color)?;

    let invitation = match provider.get_invitation().await? {
        Lookup::Found(invitation) => invitation,
        Lookup::NotFound => {
            return Err(SharebridgeError::config(
                "Invitation does not exist yet; run 'sbr provider' first",
            ))
        }
    };

    display.print_info("Idempotent creates for consumer resources...")?;
    let consumer_result = run_consumer_flow(&consumer, &invitation, &cancel).await?;

    let status = consumer_result
        .synchronization
        .status
        .as_deref()
        .unwrap_or("Unknown");
    display.print_success(&format!(
        "Synchronization status: {}. Check resource {} on https://portal.azure.com for further details.",
        status,
        consumer_result.account.resource_id()
    ))?;

    Ok(())
}

async fn run_sync(config: &Config, no_color: bool, display: &DisplayUtils) -> Result<()> {
    let consumer = build_provisioner(config, &config.consumer, no_color)?;

    display.print_info("Initiating a snapshot copy (duration depends on how large the data is)...")?;
    let synchronization = consumer.synchronize().await?;

    display.print_success(&format!(
        "Synchronization status: {}",
        synchronization.status.as_deref().unwrap_or("Unknown")
    ))?;

    Ok(())
}

fn show_config(config: &Config, display: &DisplayUtils) -> Result<()> {
    let provider_storage = format!(
        "{}/{}",
        config.provider.storage.account_name, config.provider.storage.container_name
    );
    let consumer_storage = format!(
        "{}/{}",
        config.consumer.storage.account_name, config.consumer.storage.container_name
    );

    let pairs = [
        ("Location", config.location.as_str()),
        ("ARM endpoint", config.arm_endpoint.as_str()),
        ("Authority", config.authority.as_str()),
        ("Provider tenant", config.provider.tenant_id.as_str()),
        ("Provider client", config.provider.client_id.as_str()),
        (
            "Provider subscription",
            config.provider.subscription_id.as_str(),
        ),
        (
            "Provider secret",
            if config.provider.secret.is_empty() {
                "(unset)"
            } else {
                "****"
            },
        ),
        ("Provider storage", provider_storage.as_str()),
        ("Consumer tenant", config.consumer.tenant_id.as_str()),
        ("Consumer client", config.consumer.client_id.as_str()),
        (
            "Consumer subscription",
            config.consumer.subscription_id.as_str(),
        ),
        (
            "Consumer secret",
            if config.consumer.secret.is_empty() {
                "(unset)"
            } else {
                "****"
            },
        ),
        ("Consumer storage", consumer_storage.as_str()),
    ];

    println!("{}", display.format_key_value_pairs(&pairs));
    Ok(())
}

fn show_version(display: &DisplayUtils) -> Result<()> {
    let block = display.format_key_value_pairs(&[
        ("Version", BUILD_INFO.version),
        ("Full version", BUILD_INFO.full_version),
        ("Git hash", BUILD_INFO.git_hash),
        ("Git branch", BUILD_INFO.git_branch),
        ("Build time", BUILD_INFO.build_time),
    ]);

    println!("{}", block);
    Ok(())
}
