//! Integration tests for the index guard over a sidecar metadata file.

use lectern_core::Config;
use lectern_index::{
    inspect, rebuild, BuildSummary, ExpectedIndex, IndexBuilder, IndexMetadataStore,
    IndexVerdict, Mismatch, RebuildGate, SidecarStore,
};
use std::fs;
use std::path::PathBuf;

// ── Helpers ────────────────────────────────────────────────────────────

/// Writes one file per document into the index directory.
struct DirectoryBuilder {
    dir: PathBuf,
    documents: Vec<&'static str>,
    fail_after: Option<usize>,
}

impl IndexBuilder for DirectoryBuilder {
    fn build(&mut self) -> Result<BuildSummary, Box<dyn std::error::Error + Send + Sync>> {
        fs::create_dir_all(&self.dir)?;
        for (i, doc) in self.documents.iter().enumerate() {
            if self.fail_after == Some(i) {
                return Err(format!("embedding request {i} failed").into());
            }
            fs::write(self.dir.join(format!("chunk_{i}.txt")), doc)?;
        }
        Ok(BuildSummary {
            documents: self.documents.len(),
            embedding_dim: Some(1536),
        })
    }
}

fn expected_from_yaml(yaml: &str) -> ExpectedIndex {
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    ExpectedIndex::from(&config.index)
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn startup_check_through_rebuild_and_model_change() {
    let root = tempfile::tempdir().unwrap();
    let layout = Config::default().layout(root.path());
    let store = SidecarStore::new(&layout.index_dir);
    let gate = RebuildGate::new();
    let expected = ExpectedIndex::from(&Config::default().index);

    // First launch: nothing built yet.
    assert_eq!(inspect(&store, &expected), IndexVerdict::Absent);

    let mut builder = DirectoryBuilder {
        dir: layout.index_dir.clone(),
        documents: vec!["alpha", "beta"],
        fail_after: None,
    };
    let outcome = rebuild(&gate, &store, &mut builder, &expected).unwrap();
    assert_eq!(outcome.documents, 2);
    assert!(inspect(&store, &expected).is_compatible());

    // Upgrade switches the embedding model.
    let upgraded = expected_from_yaml("index:\n  embedding_model: text-embedding-3-large\n");
    let verdict = inspect(&store, &upgraded);
    assert!(matches!(
        verdict.reasons(),
        [Mismatch::Model { found, .. }] if found == "text-embedding-3-small"
    ));

    // Dimension configured later but matching the stamp is still compatible.
    let with_dim = expected_from_yaml("index:\n  embedding_dim: 1536\n");
    assert!(inspect(&store, &with_dim).is_compatible());
}

#[test]
fn failed_rebuild_keeps_prompting_for_rebuild() {
    let root = tempfile::tempdir().unwrap();
    let index_dir = root.path().join("index");
    let store = SidecarStore::new(&index_dir);
    let gate = RebuildGate::new();
    let v1 = expected_from_yaml("index:\n  version: 1\n");
    let v2 = expected_from_yaml("index:\n  version: 2\n");

    let mut ok = DirectoryBuilder {
        dir: index_dir.clone(),
        documents: vec!["alpha"],
        fail_after: None,
    };
    rebuild(&gate, &store, &mut ok, &v1).unwrap();
    assert!(inspect(&store, &v2).requires_rebuild());

    let mut broken = DirectoryBuilder {
        dir: index_dir.clone(),
        documents: vec!["alpha", "beta", "gamma"],
        fail_after: Some(1),
    };
    assert!(rebuild(&gate, &store, &mut broken, &v2).is_err());

    let verdict = inspect(&store, &v2);
    assert!(verdict.reasons().contains(&Mismatch::Incomplete));
    let stored = store.read().unwrap().unwrap();
    assert_eq!(stored.index_version, 1);

    // Retrying with a healthy builder clears the stale state.
    let mut retry = DirectoryBuilder {
        dir: index_dir,
        documents: vec!["alpha", "beta", "gamma"],
        fail_after: None,
    };
    rebuild(&gate, &store, &mut retry, &v2).unwrap();
    assert!(inspect(&store, &v2).is_compatible());
}
