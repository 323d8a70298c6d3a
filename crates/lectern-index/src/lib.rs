//! Compatibility guard for Lectern's derived search index.
//!
//! The index is stamped with the configuration it was built with. Every
//! startup compares the stamp against the expected configuration and routes
//! a stale index to a rebuild instead of a query.

pub mod error;
pub mod guard;
pub mod metadata;
pub mod rebuild;
pub mod store;

pub use error::{IndexError, IndexResult};
pub use guard::{check, inspect, IndexVerdict, Mismatch};
pub use metadata::{ExpectedIndex, IndexMetadata};
pub use rebuild::{rebuild, BuildSummary, IndexBuilder, RebuildGate, RebuildOutcome, RebuildTicket};
pub use store::{IndexMetadataStore, MemoryStore, SidecarStore, METADATA_FILE_NAME};
