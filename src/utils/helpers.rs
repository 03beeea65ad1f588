//! Resource naming helpers
//!
//! Name generation for resources the configuration leaves unset, plus the
//! validation applied to caller-supplied names before any network call.

use crate::error::{Result, SharebridgeError};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use uuid::Uuid;

/// Prefix for generated resource names
pub const GENERATED_NAME_PREFIX: &str = "adssample";

const GENERATED_SUFFIX_LEN: usize = 8;

/// Random name generator owned by the entry point and passed explicitly to
/// whatever needs to fill in unset resource names.
pub struct NameGenerator {
    rng: StdRng,
    prefix: String,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::with_prefix(GENERATED_NAME_PREFIX)
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            prefix: prefix.to_lowercase(),
        }
    }

    /// Deterministic generator for a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            prefix: GENERATED_NAME_PREFIX.to_lowercase(),
        }
    }

    /// Next name: the prefix followed by eight random lowercase alphanumerics
    pub fn next_name(&mut self) -> String {
        let suffix: String = (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(GENERATED_SUFFIX_LEN)
            .map(char::from)
            .collect();
        format!("{}{}", self.prefix, suffix.to_lowercase())
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a string is a valid GUID/UUID
pub fn is_guid(s: &str) -> bool {
    Uuid::parse_str(s).is_ok()
}

/// Validate a storage account name (3-24 lowercase alphanumerics)
pub fn validate_storage_account_name(name: &str) -> Result<()> {
    let re = Regex::new(r"^[a-z0-9]{3,24}$")?;
    if re.is_match(name) {
        return Ok(());
    }

    Err(SharebridgeError::invalid_argument(format!(
        "Invalid storage account name '{}': must be 3-24 lowercase letters and digits",
        name
    )))
}

/// Validate a resource group name (1-90 chars of alphanumerics, underscores,
/// hyphens, periods and parentheses, not ending with a period)
pub fn validate_resource_group_name(name: &str) -> Result<()> {
    let re = Regex::new(r"^[-\w\.\(\)]{1,90}$")?;
    if re.is_match(name) && !name.ends_with('.') {
        return Ok(());
    }

    Err(SharebridgeError::invalid_argument(format!(
        "Invalid resource group name '{}'",
        name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_generator_is_deterministic() {
        let mut first = NameGenerator::with_seed(42);
        let mut second = NameGenerator::with_seed(42);

        assert_eq!(first.next_name(), second.next_name());
        assert_eq!(first.next_name(), second.next_name());
    }

    #[test]
    fn generated_names_are_lowercase_with_prefix() {
        let mut generator = NameGenerator::with_seed(7);
        for _ in 0..10 {
            let name = generator.next_name();
            assert!(name.starts_with(GENERATED_NAME_PREFIX));
            assert_eq!(name.len(), GENERATED_NAME_PREFIX.len() + 8);
            assert_eq!(name, name.to_lowercase());
        }
    }

    #[test]
    fn test_is_guid() {
        assert!(is_guid("12345678-1234-1234-1234-123456789012"));
        assert!(!is_guid("not-a-guid"));
    }

    #[test]
    fn test_storage_account_name_validation() {
        assert!(validate_storage_account_name("mystorageaccount1").is_ok());
        assert!(validate_storage_account_name("ab").is_err());
        assert!(validate_storage_account_name("Has-Caps").is_err());
        assert!(validate_storage_account_name("with-dash").is_err());
    }

    #[test]
    fn test_resource_group_name_validation() {
        assert!(validate_resource_group_name("my-rg_1.test(x)").is_ok());
        assert!(validate_resource_group_name("ends.with.period.").is_err());
        assert!(validate_resource_group_name("").is_err());
    }
}
