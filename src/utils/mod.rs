//! Utility functions module
//!
//! This module contains cross-cutting helpers: retry handling for management
//! calls, HTTP client plumbing, name generation and console output.

pub mod format;
pub mod helpers;
pub mod network;
pub mod retry;

pub use format::*;
pub use helpers::*;
pub use network::*;
pub use retry::*;
