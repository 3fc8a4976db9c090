//! alexandrian-sources: HTTP knowledge sources behind the core `SourceAdapter` seam.

mod entity_search;
mod http;
mod instant_answer;
mod page_scrape;

pub use entity_search::{parse_descriptions, EntitySearch};
pub use http::build_client;
pub use instant_answer::{parse_abstract, InstantAnswer};
pub use page_scrape::{extract_paragraphs, is_disambiguation_url, page_title, PageScrape};

use alexandrian_core::{CoreConfig, SourceKind, SourceRegistry};
use std::sync::Arc;

/// Builds the enabled adapters, in configured order, over one shared client.
/// Unknown source names are logged and skipped.
pub fn build_registry(config: &CoreConfig) -> reqwest::Result<SourceRegistry> {
    let client = build_client(&config.sources)?;
    let mut registry = SourceRegistry::new();
    for name in &config.sources.enabled {
        match SourceKind::from_name(name) {
            Some(SourceKind::PageScrape) => registry.register(Arc::new(PageScrape::new(
                client.clone(),
                &config.sources,
                config.pipeline.filter,
            ))),
            Some(SourceKind::InstantAnswer) => {
                registry.register(Arc::new(InstantAnswer::new(client.clone(), &config.sources)))
            }
            Some(SourceKind::EntitySearch) => {
                registry.register(Arc::new(EntitySearch::new(client.clone(), &config.sources)))
            }
            None => {
                tracing::warn!(target: "alexandrian::sources", source = %name, "unknown source name; skipped");
            }
        }
    }
    tracing::info!(
        target: "alexandrian::sources",
        enabled = ?registry.kinds(),
        "source registry built"
    );
    Ok(registry)
}
