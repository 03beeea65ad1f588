//! Data share management module
//!
//! This module provides the typed client for the Microsoft.DataShare
//! resource provider and the provisioning flows built on top of it.

pub mod manager;
pub mod models;
pub mod operations;

pub use manager::*;
pub use models::*;
pub use operations::*;
