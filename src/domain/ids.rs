//! Domain identifier types with validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Package identifier newtype wrapper
///
/// Package ids are case-preserving: the value is kept exactly as the warehouse
/// returned it so it can be bound back into queries and confirmations unchanged.
///
/// # Examples
///
/// ```
/// use popstats::domain::ids::PackageId;
/// use std::str::FromStr;
///
/// let id = PackageId::from_str("Newtonsoft.Json").unwrap();
/// assert_eq!(id.as_str(), "Newtonsoft.Json");
/// assert_eq!(id.to_lowercase(), "newtonsoft.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId(String);

impl PackageId {
    /// Creates a new PackageId, rejecting blank values
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Package ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the package ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used in published blob names
    pub fn to_lowercase(&self) -> String {
        self.0.to_lowercase()
    }

    /// Case-insensitive comparison
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.to_lowercase()
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PackageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
