//! Command implementations

pub(crate) mod common;
pub(crate) mod force_unlock;
pub(crate) mod index;
pub(crate) mod migrate;
pub(crate) mod startup;
pub(crate) mod status;
