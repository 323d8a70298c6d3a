//! Ordinal and schema version types.
//!
//! An ordinal is the run of ASCII digits at the start of a migration
//! identifier such as `003_add_mistakes.sql`. [`parse_ordinal`] is the only
//! place that looks at names; everything downstream compares integers.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordering key of a migration unit. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Ordinal(u32);

impl Ordinal {
    /// Wrap a raw ordinal, returning `None` for 0.
    pub fn new(value: u32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    /// Raw integer value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl TryFrom<u32> for Ordinal {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ordinal::new(value).ok_or_else(|| "ordinal must be at least 1".to_string())
    }
}

impl From<Ordinal> for u32 {
    fn from(ordinal: Ordinal) -> u32 {
        ordinal.0
    }
}

/// Persisted schema version of a database. 0 means no migration has been applied.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SchemaVersion(u32);

impl SchemaVersion {
    /// Version of a database that has never been migrated.
    pub const INITIAL: SchemaVersion = SchemaVersion(0);

    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// True when a unit with `ordinal` has not been applied at this version.
    pub fn is_pending(self, ordinal: Ordinal) -> bool {
        ordinal.0 > self.0
    }
}

impl From<Ordinal> for SchemaVersion {
    fn from(ordinal: Ordinal) -> Self {
        SchemaVersion(ordinal.0)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse the leading ordinal of a migration identifier.
///
/// The identifier must start with one or more ASCII digits, and the digit run
/// must be followed by the end of the name or a non-alphanumeric separator
/// (`001_initial.sql`, `7-fix.sql`, `12.sql`). The parsed value must fit in a
/// `u32` and be non-zero, since version 0 denotes an unmigrated database.
pub fn parse_ordinal(name: &str) -> CoreResult<Ordinal> {
    let malformed = |reason: &str| CoreError::MalformedOrdinal {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let digits_len = name.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return Err(malformed("name must start with a numeric ordinal"));
    }

    if let Some(next) = name[digits_len..].chars().next() {
        if next.is_alphanumeric() {
            return Err(malformed(
                "ordinal must be followed by a separator such as '_'",
            ));
        }
    }

    let value: u32 = name[..digits_len]
        .parse()
        .map_err(|_| malformed("ordinal is out of range"))?;

    Ordinal::new(value).ok_or_else(|| malformed("ordinal 0 is reserved for an unmigrated database"))
}

#[cfg(test)]
#[path = "ordinal_test.rs"]
mod tests;
