//! Process-lifetime memo of adapter results, shared by every session.

use crate::source::{SourceAdapter, SourceKind};
use dashmap::DashMap;

/// Most snippets kept per entry.
pub const CACHE_ENTRY_CAP: usize = 10;

/// Concurrent map `(source, query) -> snippets`. Last writer wins; nothing is evicted.
#[derive(Debug, Default)]
pub struct RetrievalCache {
    entries: DashMap<(SourceKind, String), Vec<String>>,
}

impl RetrievalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: SourceKind, query: &str) -> Option<Vec<String>> {
        self.entries
            .get(&(kind, query.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn insert(&self, kind: SourceKind, query: &str, mut snippets: Vec<String>) {
        snippets.truncate(CACHE_ENTRY_CAP);
        self.entries.insert((kind, query.to_string()), snippets);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consults `source` through the cache. A hit skips the network entirely; a
    /// successful miss populates the entry. Failures come back empty and are not cached.
    pub async fn fetch_through(&self, source: &dyn SourceAdapter, query: &str) -> Vec<String> {
        let kind = source.kind();
        if let Some(hit) = self.get(kind, query) {
            tracing::debug!(target: "alexandrian::retrieval", source = %kind, query, "cache hit");
            return hit;
        }

        tracing::debug!(target: "alexandrian::retrieval", source = %kind, query, "cache miss");
        match source.fetch(query).await {
            Ok(mut snippets) => {
                snippets.truncate(CACHE_ENTRY_CAP);
                self.insert(kind, query, snippets.clone());
                snippets
            }
            Err(e) => {
                tracing::warn!(target: "alexandrian::retrieval", source = %kind, query, error = %e, "adapter failed; treating as empty");
                Vec::new()
            }
        }
    }
}
