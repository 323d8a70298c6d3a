//! Metadata stamped on a built index

use chrono::{DateTime, Utc};
use lectern_core::IndexConfig;
use serde::{Deserialize, Serialize};

/// Build configuration recorded on the index at the end of a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Index format version
    pub index_version: u32,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding dimensionality, when the backend reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_dim: Option<u32>,

    /// Set while a rebuild is running or after one failed
    #[serde(default)]
    pub incomplete: bool,

    /// When the build finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<DateTime<Utc>>,
}

impl IndexMetadata {
    /// Metadata for an index just built against `expected`.
    ///
    /// `reported_dim` is the dimensionality the builder observed, left unset
    /// when the backend does not report one.
    pub fn stamp(expected: &ExpectedIndex, reported_dim: Option<u32>) -> Self {
        Self {
            index_version: expected.version,
            embedding_model: expected.embedding_model.clone(),
            embedding_dim: reported_dim,
            incomplete: false,
            built_at: Some(Utc::now()),
        }
    }
}

/// What the running application expects the index to have been built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedIndex {
    pub version: u32,
    pub embedding_model: String,
    pub embedding_dim: Option<u32>,
}

impl From<&IndexConfig> for ExpectedIndex {
    fn from(config: &IndexConfig) -> Self {
        Self {
            version: config.version,
            embedding_model: config.embedding_model.clone(),
            embedding_dim: config.embedding_dim,
        }
    }
}
