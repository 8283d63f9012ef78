//! Account address type with `plg_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from parsing an account address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address {0:?} does not start with {prefix}", prefix = AccountAddress::PREFIX)]
    MissingPrefix(String),

    #[error("address {0:?} has no body after the prefix")]
    Empty(String),

    #[error("address {0:?} contains non-alphanumeric characters")]
    InvalidCharacters(String),
}

/// A pledge account address, always prefixed with `plg_`.
///
/// Both delegators and providers are identified by account addresses.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountAddress(String);

impl AccountAddress {
    /// The standard prefix for all pledge account addresses.
    pub const PREFIX: &'static str = "plg_";

    /// Parse and validate a raw address string.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let body = raw
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| AddressError::MissingPrefix(raw.to_string()))?;
        if body.is_empty() {
            return Err(AddressError::Empty(raw.to_string()));
        }
        if !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(AddressError::InvalidCharacters(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Construct from trusted input (e.g. a component decoded from a store
    /// key that was validated when written). Skips validation.
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    ///
    /// Addresses built through [`AccountAddress::parse`] always are; this
    /// re-checks ones that arrived through deserialization or
    /// [`AccountAddress::new_unchecked`].
    pub fn is_valid(&self) -> bool {
        Self::parse(&self.0).is_ok()
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_address() {
        let addr = AccountAddress::parse("plg_alice1").unwrap();
        assert_eq!(addr.as_str(), "plg_alice1");
        assert!(addr.is_valid());
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        assert_eq!(
            AccountAddress::parse("alice"),
            Err(AddressError::MissingPrefix("alice".to_string()))
        );
    }

    #[test]
    fn parse_rejects_empty_body() {
        assert_eq!(
            AccountAddress::parse("plg_"),
            Err(AddressError::Empty("plg_".to_string()))
        );
    }

    #[test]
    fn parse_rejects_bad_characters() {
        assert!(AccountAddress::parse("plg_al ice").is_err());
        assert!(AccountAddress::parse("plg_a-b").is_err());
    }

    #[test]
    fn unchecked_is_revalidated() {
        let addr = AccountAddress::new_unchecked("not an address");
        assert!(!addr.is_valid());
    }
}
