//! Compatibility verdicts for the derived index.
//!
//! [`check`] is a pure comparison of stamped metadata against the expected
//! configuration. [`inspect`] reads the metadata from a store first and folds
//! read failures into the verdict, so neither of them ever returns an error.

use crate::metadata::{ExpectedIndex, IndexMetadata};
use crate::store::IndexMetadataStore;
use serde::Serialize;
use std::fmt;

/// One reason an index is stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum Mismatch {
    Version { expected: u32, found: u32 },
    Model { expected: String, found: String },
    Dimension { expected: u32, found: u32 },
    /// A rebuild started and never finished
    Incomplete,
    /// A metadata record exists but could not be read
    Unreadable { reason: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Version { expected, found } => {
                write!(f, "index version {found}, expected {expected}")
            }
            Mismatch::Model { expected, found } => {
                write!(f, "embedding model '{found}', expected '{expected}'")
            }
            Mismatch::Dimension { expected, found } => {
                write!(f, "embedding dimension {found}, expected {expected}")
            }
            Mismatch::Incomplete => write!(f, "last build did not finish"),
            Mismatch::Unreadable { reason } => write!(f, "metadata unreadable: {reason}"),
        }
    }
}

/// Result of comparing an index against the expected configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reasons", rename_all = "snake_case")]
pub enum IndexVerdict {
    /// Safe to query
    Compatible,
    /// Built with a different configuration; rebuild before querying
    Incompatible(Vec<Mismatch>),
    /// Never built; build before querying
    Absent,
}

impl IndexVerdict {
    pub fn is_compatible(&self) -> bool {
        matches!(self, IndexVerdict::Compatible)
    }

    /// True when the index must be (re)built before it can be queried.
    pub fn requires_rebuild(&self) -> bool {
        !self.is_compatible()
    }

    /// Mismatches behind an `Incompatible` verdict; empty otherwise.
    pub fn reasons(&self) -> &[Mismatch] {
        match self {
            IndexVerdict::Incompatible(reasons) => reasons,
            _ => &[],
        }
    }
}

impl fmt::Display for IndexVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexVerdict::Compatible => write!(f, "compatible"),
            IndexVerdict::Absent => write!(f, "absent"),
            IndexVerdict::Incompatible(reasons) => {
                write!(f, "incompatible (")?;
                for (i, reason) in reasons.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{reason}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Compare `current` metadata against `expected`.
///
/// Dimensions are only compared when both sides know theirs.
pub fn check(current: Option<&IndexMetadata>, expected: &ExpectedIndex) -> IndexVerdict {
    let Some(meta) = current else {
        return IndexVerdict::Absent;
    };

    let mut reasons = Vec::new();
    if meta.index_version != expected.version {
        reasons.push(Mismatch::Version {
            expected: expected.version,
            found: meta.index_version,
        });
    }
    if meta.embedding_model != expected.embedding_model {
        reasons.push(Mismatch::Model {
            expected: expected.embedding_model.clone(),
            found: meta.embedding_model.clone(),
        });
    }
    if let (Some(want), Some(have)) = (expected.embedding_dim, meta.embedding_dim) {
        if want != have {
            reasons.push(Mismatch::Dimension {
                expected: want,
                found: have,
            });
        }
    }
    if meta.incomplete {
        reasons.push(Mismatch::Incomplete);
    }

    if reasons.is_empty() {
        IndexVerdict::Compatible
    } else {
        IndexVerdict::Incompatible(reasons)
    }
}

/// Read metadata from `store` and [`check`] it.
pub fn inspect<S>(store: &S, expected: &ExpectedIndex) -> IndexVerdict
where
    S: IndexMetadataStore + ?Sized,
{
    match store.read() {
        Ok(current) => check(current.as_ref(), expected),
        Err(e) => {
            log::warn!("Treating index as stale: {e}");
            IndexVerdict::Incompatible(vec![Mismatch::Unreadable {
                reason: e.to_string(),
            }])
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
