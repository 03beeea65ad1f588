//! Authentication module for Azure services
//!
//! This module provides service-principal authentication for the provider
//! and consumer principals, including Graph API lookups for object IDs.

pub mod provider;

pub use provider::*;
