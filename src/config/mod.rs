//! Configuration management module
//!
//! This module handles configuration loading, validation and name
//! resolution from configuration files and environment variables.

pub mod init;
pub mod settings;

pub use settings::*;
