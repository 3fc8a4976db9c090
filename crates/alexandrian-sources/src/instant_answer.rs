//! Instant-answer API: one abstract per query.

use crate::http::get_text;
use alexandrian_core::{AdapterFailure, SourceAdapter, SourceKind, SourcesConfig};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct InstantAnswerBody {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
}

/// The abstract as a single snippet; empty when the service has none.
pub fn parse_abstract(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let parsed: InstantAnswerBody = serde_json::from_str(body)?;
    let text = parsed.abstract_text.trim();
    Ok(if text.is_empty() { Vec::new() } else { vec![text.to_string()] })
}

pub struct InstantAnswer {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl InstantAnswer {
    pub fn new(client: reqwest::Client, sources: &SourcesConfig) -> Self {
        Self {
            client,
            endpoint: sources.instant_answer_url.clone(),
            timeout: sources.timeout(),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for InstantAnswer {
    fn kind(&self) -> SourceKind {
        SourceKind::InstantAnswer
    }

    async fn fetch(&self, query: &str) -> Result<Vec<String>, AdapterFailure> {
        let request = self.client.get(&self.endpoint).query(&[
            ("q", query),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ]);
        let page = get_text(self.kind(), request, self.timeout).await?;
        parse_abstract(&page.body).map_err(|e| AdapterFailure::Parse {
            adapter: self.kind(),
            reason: e.to_string(),
        })
    }
}
