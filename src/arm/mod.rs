//! Azure Resource Manager plumbing
//!
//! Shared client, resource group operations and role assignments used by
//! the provisioning flows.

pub mod client;
pub mod resources;
pub mod roles;

pub use client::*;
pub use resources::*;
pub use roles::*;
