//! lectern-core - Core library for Lectern
//!
//! This crate provides the project configuration (`lectern.yml`), the resolved
//! on-disk layout of a Lectern installation, and the ordinal/version types
//! shared by the migration runner and the index guard.

pub mod config;
pub mod error;
pub mod layout;
pub mod ordinal;

pub use config::{Config, IndexConfig};
pub use error::{CoreError, CoreResult};
pub use layout::AppLayout;
pub use ordinal::{parse_ordinal, Ordinal, SchemaVersion};
