//! Column identifiers, cell values, and column-family descriptors.
//!
//! A column is addressed by a `family:qualifier` pair. Families are declared
//! at table-creation time; qualifiers are free-form and chosen at write time.
//! Identifiers are validated here, at the client boundary, so malformed
//! columns are rejected before a round trip to the service.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Default number of retained versions per column family.
pub const DEFAULT_MAX_VERSIONS: u32 = 3;

/// Error type for malformed column identifiers and family names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidColumn {
    /// The family part of the identifier is empty.
    #[error("empty column family")]
    EmptyFamily,

    /// The family name contains the `:` separator.
    #[error("column family contains ':': {0}")]
    FamilyDelimiter(String),
}

/// A validated column identifier: `family:qualifier`.
///
/// The family is non-empty and contains no `:`. The qualifier may be empty;
/// an empty qualifier used as a *selector* (e.g. in a get or scan column
/// list) addresses every column of the family.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    family: String,
    qualifier: String,
}

impl ColumnKey {
    /// Create a column key from a family and qualifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidColumn`] if the family is empty or contains `:`.
    pub fn new(family: impl Into<String>, qualifier: impl Into<String>) -> Result<Self, InvalidColumn> {
        let family = family.into();
        validate_family(&family)?;
        Ok(Self { family, qualifier: qualifier.into() })
    }

    /// Create a whole-family selector (empty qualifier).
    pub fn family_only(family: impl Into<String>) -> Result<Self, InvalidColumn> {
        Self::new(family, "")
    }

    /// The column family.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// The qualifier. May be empty.
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// True if this key addresses a whole family rather than a single column.
    pub fn is_family_selector(&self) -> bool {
        self.qualifier.is_empty()
    }

    /// Whether this key, used as a selector, matches `column`.
    ///
    /// A whole-family selector matches every column in its family; otherwise
    /// the keys must be equal.
    pub fn selects(&self, column: &ColumnKey) -> bool {
        if self.is_family_selector() {
            self.family == column.family
        } else {
            self == column
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.qualifier)
    }
}

impl FromStr for ColumnKey {
    type Err = InvalidColumn;

    /// Parse `family:qualifier`. A bare family name (no `:`) parses as a
    /// whole-family selector.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((family, qualifier)) => Self::new(family, qualifier),
            None => Self::family_only(s),
        }
    }
}

fn validate_family(family: &str) -> Result<(), InvalidColumn> {
    if family.is_empty() {
        return Err(InvalidColumn::EmptyFamily);
    }
    if family.contains(':') {
        return Err(InvalidColumn::FamilyDelimiter(family.to_string()));
    }
    Ok(())
}

/// One version of a column's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnValue {
    /// The raw value bytes.
    pub value: Bytes,
    /// Version marker. Higher is more recent.
    pub timestamp: u64,
}

impl ColumnValue {
    /// Create a new column value.
    pub fn new(value: impl Into<Bytes>, timestamp: u64) -> Self {
        Self { value: value.into(), timestamp }
    }
}

/// Descriptor for a column family, fixed at table creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFamilyDescriptor {
    /// Family name. Subject to the same rules as [`ColumnKey`] families.
    pub name: String,
    /// Number of versions retained per column. Older versions are discarded.
    pub max_versions: u32,
    /// Hint that the family should be served from memory.
    pub in_memory: bool,
    /// Optional time-to-live for cells, in seconds.
    pub ttl_secs: Option<u32>,
}

impl ColumnFamilyDescriptor {
    /// Create a descriptor with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_versions: DEFAULT_MAX_VERSIONS,
            in_memory: false,
            ttl_secs: None,
        }
    }

    /// Set the number of retained versions.
    pub fn with_max_versions(mut self, max_versions: u32) -> Self {
        self.max_versions = max_versions;
        self
    }

    /// Check the family name against the column-identifier rules.
    pub fn validate(&self) -> Result<(), InvalidColumn> {
        validate_family(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_identifier() {
        let key: ColumnKey = "data:age".parse().unwrap();
        assert_eq!(key.family(), "data");
        assert_eq!(key.qualifier(), "age");
        assert_eq!(key.to_string(), "data:age");
    }

    #[test]
    fn bare_family_is_a_selector() {
        let key: ColumnKey = "name".parse().unwrap();
        assert!(key.is_family_selector());
        assert!(key.selects(&ColumnKey::new("name", "first").unwrap()));
        assert!(!key.selects(&ColumnKey::new("other", "first").unwrap()));
    }

    #[test]
    fn exact_selector_matches_only_itself() {
        let key = ColumnKey::new("data", "age").unwrap();
        assert!(key.selects(&key.clone()));
        assert!(!key.selects(&ColumnKey::new("data", "city").unwrap()));
    }

    #[test]
    fn malformed_identifiers_rejected() {
        assert_eq!(ColumnKey::new("", "x"), Err(InvalidColumn::EmptyFamily));
        assert!(matches!(
            ColumnKey::new("a:b", "x"),
            Err(InvalidColumn::FamilyDelimiter(_))
        ));
        assert!(":q".parse::<ColumnKey>().is_err());
    }
}
