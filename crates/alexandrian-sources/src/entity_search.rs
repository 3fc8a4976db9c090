//! Entity search: short descriptions of the entities matching a name.

use crate::http::get_text;
use alexandrian_core::{AdapterFailure, SourceAdapter, SourceKind, SourcesConfig};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    search: Vec<EntityHit>,
}

#[derive(Debug, Deserialize)]
struct EntityHit {
    #[serde(default)]
    description: Option<String>,
}

/// Non-empty descriptions of the first `limit` hits, in result order.
pub fn parse_descriptions(body: &str, limit: usize) -> Result<Vec<String>, serde_json::Error> {
    let parsed: SearchBody = serde_json::from_str(body)?;
    Ok(parsed
        .search
        .into_iter()
        .filter_map(|hit| hit.description)
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .take(limit)
        .collect())
}

pub struct EntitySearch {
    client: reqwest::Client,
    endpoint: String,
    limit: usize,
    timeout: Duration,
}

impl EntitySearch {
    pub fn new(client: reqwest::Client, sources: &SourcesConfig) -> Self {
        Self {
            client,
            endpoint: sources.entity_search_url.clone(),
            limit: sources.entity_limit.max(1),
            timeout: sources.timeout(),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for EntitySearch {
    fn kind(&self) -> SourceKind {
        SourceKind::EntitySearch
    }

    async fn fetch(&self, query: &str) -> Result<Vec<String>, AdapterFailure> {
        let limit = self.limit.to_string();
        let request = self.client.get(&self.endpoint).query(&[
            ("action", "wbsearchentities"),
            ("search", query),
            ("format", "json"),
            ("language", "en"),
            ("limit", limit.as_str()),
        ]);
        let page = get_text(self.kind(), request, self.timeout).await?;
        parse_descriptions(&page.body, self.limit).map_err(|e| AdapterFailure::Parse {
            adapter: self.kind(),
            reason: e.to_string(),
        })
    }
}
