//! Index rebuild orchestration.
//!
//! A rebuild runs behind a [`RebuildGate`] so two requests cannot build the
//! same index concurrently. Existing metadata is flagged incomplete before
//! the builder starts and replaced only after it succeeds; a failed build
//! leaves the index reported as stale.

use crate::error::{BuildError, IndexError, IndexResult};
use crate::metadata::{ExpectedIndex, IndexMetadata};
use crate::store::IndexMetadataStore;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// In-process mutual exclusion for index rebuilds. Never waits.
#[derive(Debug, Default)]
pub struct RebuildGate {
    busy: AtomicBool,
}

/// Held rebuild slot; dropping it reopens the gate.
#[derive(Debug)]
pub struct RebuildTicket<'a> {
    gate: &'a RebuildGate,
}

impl RebuildGate {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Claim the gate, or fail with [`IndexError::RebuildInProgress`].
    pub fn try_begin(&self) -> IndexResult<RebuildTicket<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| IndexError::RebuildInProgress)?;
        Ok(RebuildTicket { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for RebuildTicket<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

/// What a builder reports after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BuildSummary {
    /// Documents (chunks) written to the index
    pub documents: usize,
    /// Dimensionality of the embeddings written, when known
    pub embedding_dim: Option<u32>,
}

/// Builds the index from scratch. Implemented by the embedding pipeline.
pub trait IndexBuilder {
    fn build(&mut self) -> Result<BuildSummary, BuildError>;
}

/// Result of a successful rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct RebuildOutcome {
    /// Metadata stamped on the new index
    pub metadata: IndexMetadata,
    pub documents: usize,
    pub duration_ms: u64,
}

/// Rebuild the index and stamp it for `expected`.
///
/// Metadata is written exactly once, after `builder` succeeds. When it fails
/// the error is [`IndexError::BuildFailed`] and the store keeps either no
/// record or one flagged incomplete.
pub fn rebuild<S, B>(
    gate: &RebuildGate,
    store: &S,
    builder: &mut B,
    expected: &ExpectedIndex,
) -> IndexResult<RebuildOutcome>
where
    S: IndexMetadataStore + ?Sized,
    B: IndexBuilder + ?Sized,
{
    let _ticket = gate.try_begin()?;

    match store.mark_incomplete() {
        Ok(true) => log::debug!("Flagged existing index metadata incomplete"),
        Ok(false) => {}
        // An unreadable record already reads as stale; the build replaces it.
        Err(e @ IndexError::Json { .. }) => log::warn!("{e}"),
        Err(e) => return Err(e),
    }

    log::info!(
        "Rebuilding index (version {}, model {})",
        expected.version,
        expected.embedding_model
    );
    let started = Instant::now();
    let summary = builder.build().map_err(|source| {
        log::error!("Index build failed: {source}");
        IndexError::BuildFailed { source }
    })?;

    let metadata = IndexMetadata::stamp(expected, summary.embedding_dim);
    store.write(&metadata)?;

    let duration_ms = started.elapsed().as_millis() as u64;
    log::info!(
        "Index rebuilt: {} documents in {duration_ms} ms",
        summary.documents
    );
    Ok(RebuildOutcome {
        metadata,
        documents: summary.documents,
        duration_ms,
    })
}

#[cfg(test)]
#[path = "rebuild_test.rs"]
mod tests;
