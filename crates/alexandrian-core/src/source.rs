//! Knowledge source seam: every adapter maps a query to candidate snippets.

use std::fmt;
use std::sync::Arc;

/// The three kinds of external knowledge source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Encyclopedia page, scraped paragraph by paragraph.
    PageScrape,
    /// Short-answer API returning one abstract.
    InstantAnswer,
    /// Entity/name search returning short descriptions.
    EntitySearch,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageScrape => "page_scrape",
            Self::InstantAnswer => "instant_answer",
            Self::EntitySearch => "entity_search",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "page_scrape" => Some(Self::PageScrape),
            "instant_answer" => Some(Self::InstantAnswer),
            "entity_search" => Some(Self::EntitySearch),
            _ => None,
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::PageScrape, Self::InstantAnswer, Self::EntitySearch]
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an adapter call produced nothing. Recovered as an empty result at the cache boundary.
#[derive(Debug, thiserror::Error)]
pub enum AdapterFailure {
    #[error("{adapter}: request timed out after {secs}s")]
    Timeout { adapter: SourceKind, secs: u64 },

    #[error("{adapter}: transport error: {reason}")]
    Transport { adapter: SourceKind, reason: String },

    #[error("{adapter}: unexpected HTTP status {status}")]
    Status { adapter: SourceKind, status: u16 },

    #[error("{adapter}: could not parse response: {reason}")]
    Parse { adapter: SourceKind, reason: String },
}

/// Trait implemented by every knowledge source.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetches candidate snippets for `query` (a keyword, or a joined keyword set).
    async fn fetch(&self, query: &str) -> Result<Vec<String>, AdapterFailure>;
}

/// Ordered set of adapters; fan-out follows registration order.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter. A later adapter of the same kind replaces the earlier one.
    pub fn register(&mut self, source: Arc<dyn SourceAdapter>) {
        let kind = source.kind();
        match self.sources.iter_mut().find(|s| s.kind() == kind) {
            Some(slot) => *slot = source,
            None => self.sources.push(source),
        }
    }

    pub fn get(&self, kind: SourceKind) -> Option<Arc<dyn SourceAdapter>> {
        self.sources.iter().find(|s| s.kind() == kind).cloned()
    }

    pub fn kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SourceAdapter>> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(SourceKind, &'static str);

    #[async_trait::async_trait]
    impl SourceAdapter for Fixed {
        fn kind(&self) -> SourceKind {
            self.0
        }

        async fn fetch(&self, _query: &str) -> Result<Vec<String>, AdapterFailure> {
            Ok(vec![self.1.to_string()])
        }
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in SourceKind::all() {
            assert_eq!(SourceKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(SourceKind::from_name("gopher"), None);
    }

    #[tokio::test]
    async fn registry_replaces_same_kind_and_keeps_order() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(Fixed(SourceKind::EntitySearch, "old")));
        registry.register(Arc::new(Fixed(SourceKind::PageScrape, "page")));
        registry.register(Arc::new(Fixed(SourceKind::EntitySearch, "new")));

        assert_eq!(registry.kinds(), vec![SourceKind::EntitySearch, SourceKind::PageScrape]);
        let entity = registry.get(SourceKind::EntitySearch).unwrap();
        assert_eq!(entity.fetch("x").await.unwrap(), vec!["new"]);
        assert!(registry.get(SourceKind::InstantAnswer).is_none());
    }

    #[test]
    fn failure_messages_name_the_adapter() {
        let err = AdapterFailure::Timeout { adapter: SourceKind::PageScrape, secs: 5 };
        assert_eq!(err.to_string(), "page_scrape: request timed out after 5s");
    }
}
