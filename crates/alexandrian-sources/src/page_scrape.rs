//! Encyclopedia page scrape: fetches the keyword's article and keeps its
//! best paragraph sentences.

use crate::http::get_text;
use alexandrian_core::{
    normalize, split_sentences, AdapterFailure, FilterConfig, SentenceFilter, SourceAdapter, SourceKind,
    SourcesConfig,
};
use scraper::{Html, Selector};
use std::time::Duration;

/// Title suffix of disambiguation pages, raw and percent-encoded.
const DISAMBIGUATION_SUFFIXES: [&str; 2] = ["(disambiguation)", "%28disambiguation%29"];
const DISAMBIGUATION_BOX: &str = "#disambigbox, .dmbox-disambig";

/// Article title for a keyword: first letter upper-cased, the rest lower-cased, spaces as `_`.
pub fn page_title(keyword: &str) -> String {
    let mut chars = keyword.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .map(|c| if c == ' ' { '_' } else { c })
            .collect(),
        None => String::new(),
    }
}

/// True when `url` names a disambiguation page rather than an article.
pub fn is_disambiguation_url(url: &str) -> bool {
    let url = url.to_lowercase();
    DISAMBIGUATION_SUFFIXES.iter().any(|suffix| url.contains(suffix))
}

/// Text of every `<p>`, or `None` for a disambiguation page.
pub fn extract_paragraphs(html: &str) -> Option<Vec<String>> {
    let document = Html::parse_document(html);
    if let Ok(marker) = Selector::parse(DISAMBIGUATION_BOX) {
        if document.select(&marker).next().is_some() {
            return None;
        }
    }
    let paragraphs = match Selector::parse("p") {
        Ok(p) => p,
        Err(_) => return Some(Vec::new()),
    };
    Some(
        document
            .select(&paragraphs)
            .map(|p| p.text().collect::<String>())
            .filter(|t| !t.trim().is_empty())
            .collect(),
    )
}

pub struct PageScrape {
    client: reqwest::Client,
    base_url: String,
    filter: SentenceFilter,
    timeout: Duration,
}

impl PageScrape {
    pub fn new(client: reqwest::Client, sources: &SourcesConfig, filter: FilterConfig) -> Self {
        Self {
            client,
            base_url: sources.page_base_url.clone(),
            filter: SentenceFilter::new(filter),
            timeout: sources.timeout(),
        }
    }

    pub fn page_url(&self, keyword: &str) -> String {
        format!("{}{}", self.base_url, page_title(keyword))
    }

    /// Splits paragraphs into sentences and keeps the first few that pass the filter.
    pub fn sentences_from_html(&self, html: &str, keyword: &str) -> Vec<String> {
        let Some(paragraphs) = extract_paragraphs(html) else {
            tracing::debug!(target: "alexandrian::sources", keyword, "disambiguation page; no sentences");
            return Vec::new();
        };
        // Citations sit between a full stop and the next sentence, so strip them before splitting.
        let sentences: Vec<String> = paragraphs
            .iter()
            .flat_map(|p| split_sentences(&normalize(p)))
            .collect();
        self.filter
            .clean(&sentences, keyword, self.filter.config().max_page_scrape)
    }
}

#[async_trait::async_trait]
impl SourceAdapter for PageScrape {
    fn kind(&self) -> SourceKind {
        SourceKind::PageScrape
    }

    async fn fetch(&self, query: &str) -> Result<Vec<String>, AdapterFailure> {
        let url = self.page_url(query);
        let request = self.client.get(&url);
        let page = get_text(self.kind(), request, self.timeout).await?;
        if is_disambiguation_url(&page.url) {
            return Ok(Vec::new());
        }
        let sentences = self.sentences_from_html(&page.body, query);
        tracing::debug!(target: "alexandrian::sources", url = %url, kept = sentences.len(), "page scraped");
        Ok(sentences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{build_client, testing::serve};

    const ARTICLE: &str = r#"<html><body>
        <p>Gravity is a fundamental interaction which causes mutual attraction between masses.[1] It is weak.</p>
        <p>On Earth, gravity gives weight to physical objects. The Moon's gravity causes tides in the oceans.[2]</p>
        <p>See also:</p>
    </body></html>"#;

    fn scraper_for(base_url: String) -> PageScrape {
        let mut sources = SourcesConfig::default();
        sources.page_base_url = base_url;
        let client = build_client(&sources).unwrap();
        PageScrape::new(client, &sources, FilterConfig::default())
    }

    #[test]
    fn title_is_capitalized_with_underscores() {
        assert_eq!(page_title("gravity"), "Gravity");
        assert_eq!(page_title("black hole"), "Black_hole");
        assert_eq!(page_title("  "), "");
    }

    #[test]
    fn paragraphs_become_filtered_sentences() {
        let scraper = scraper_for("http://unused/".into());
        let kept = scraper.sentences_from_html(ARTICLE, "gravity");
        assert_eq!(
            kept,
            vec![
                "Gravity is a fundamental interaction which causes mutual attraction between masses.",
                "On Earth, gravity gives weight to physical objects.",
                "The Moon's gravity causes tides in the oceans.",
            ]
        );
    }

    #[test]
    fn disambiguation_box_yields_nothing() {
        let html = r#"<div id="disambigbox"></div><p>Gravity may refer to many things in this list.</p>"#;
        assert!(extract_paragraphs(html).is_none());
        let scraper = scraper_for("http://unused/".into());
        assert!(scraper.sentences_from_html(html, "gravity").is_empty());
    }

    #[tokio::test]
    async fn fetch_scrapes_the_served_article() {
        let base = serve(200, "text/html", ARTICLE.to_string()).await;
        let scraper = scraper_for(format!("{base}/wiki/"));
        assert_eq!(scraper.page_url("gravity"), format!("{base}/wiki/Gravity"));
        let kept = scraper.fetch("gravity").await.unwrap();
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn only_the_disambiguation_title_suffix_marks_a_disambiguation_url() {
        assert!(is_disambiguation_url("https://en.wikipedia.org/wiki/Mercury_(disambiguation)"));
        assert!(is_disambiguation_url("https://en.wikipedia.org/wiki/Mercury_%28disambiguation%29"));
        assert!(is_disambiguation_url("https://en.wikipedia.org/wiki/Mercury_%28Disambiguation%29"));
        assert!(!is_disambiguation_url("https://en.wikipedia.org/wiki/Disambiguation"));
        assert!(!is_disambiguation_url("https://en.wikipedia.org/wiki/Word-sense_disambiguation"));
    }

    #[tokio::test]
    async fn article_about_disambiguation_is_still_scraped() {
        let html = "<p>Disambiguation is the process of identifying which meaning of a word is used.</p>";
        let base = serve(200, "text/html", html.to_string()).await;
        let scraper = scraper_for(format!("{base}/wiki/"));
        let kept = scraper.fetch("disambiguation").await.unwrap();
        assert_eq!(
            kept,
            vec!["Disambiguation is the process of identifying which meaning of a word is used."]
        );
    }

    #[tokio::test]
    async fn missing_article_is_a_status_failure() {
        let base = serve(404, "text/html", "not found".to_string()).await;
        let scraper = scraper_for(format!("{base}/wiki/"));
        match scraper.fetch("gravity").await {
            Err(AdapterFailure::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected status failure, got {other:?}"),
        }
    }
}
