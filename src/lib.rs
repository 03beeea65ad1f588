//! sharebridge - Azure Data Share Provisioning Tool
//!
//! A command-line tool that wires together a provider and a consumer
//! Azure Data Share account: resource groups, accounts, shares, storage
//! role assignments, invitations, share subscriptions, data set mappings
//! and a one-time snapshot copy.

pub mod arm;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod share;
pub mod utils;

// Re-export commonly used types
pub use error::{Result, SharebridgeError};
