//! Dialogue orchestrator: one instance per session.
//!
//! Each turn runs `extract -> retrieve -> filter -> score/select -> (fallback) -> persist`.
//! Retrieval fans out one task per (keyword, source) pair on a bounded pool and
//! waits for all of them before anything is scored.

use crate::cache::RetrievalCache;
use crate::channel::LineChannel;
use crate::config::PipelineConfig;
use crate::filter::SentenceFilter;
use crate::memo::{MemoStore, FALLBACK_GREETING};
use crate::scorer::{truncate_chars, Scorer};
use crate::source::{SourceAdapter, SourceKind, SourceRegistry};
use crate::text::extract_keywords;
use crate::window::{HistoryWindow, RecencyWindow};
use futures_util::future::join_all;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Reply of last resort.
pub const APOLOGY: &str = "Could you please rephrase or provide more context?";

/// Upper bound on one cached fetch, on top of the adapter's own request timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Which stage produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Selected,
    InstantAnswer,
    Memo,
    Apology,
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
    pub keywords: Vec<String>,
    /// The input asked to end the session.
    pub terminal: bool,
}

/// Snippets one source returned for one keyword.
struct Fetched {
    kind: SourceKind,
    keyword: String,
    snippets: Vec<String>,
}

pub fn is_terminal(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

async fn bounded_fetch(
    cache: &RetrievalCache,
    source: &dyn SourceAdapter,
    query: &str,
    limit: Duration,
) -> Vec<String> {
    match tokio::time::timeout(limit, cache.fetch_through(source, query)).await {
        Ok(snippets) => snippets,
        Err(_) => {
            tracing::warn!(
                target: "alexandrian::retrieval",
                source = %source.kind(),
                query,
                timeout_ms = limit.as_millis() as u64,
                "fetch exceeded its time budget; treating as empty"
            );
            Vec::new()
        }
    }
}

pub struct Dialogue {
    session_id: Uuid,
    config: PipelineConfig,
    registry: SourceRegistry,
    cache: Arc<RetrievalCache>,
    memo: Arc<MemoStore>,
    filter: SentenceFilter,
    scorer: Scorer,
    pool: Arc<Semaphore>,
    fetch_timeout: Duration,
    history: HistoryWindow,
    recent: RecencyWindow,
}

impl Dialogue {
    pub fn new(
        config: PipelineConfig,
        registry: SourceRegistry,
        cache: Arc<RetrievalCache>,
        memo: Arc<MemoStore>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            filter: SentenceFilter::new(config.filter),
            scorer: Scorer::new(config.scoring),
            pool: Arc::new(Semaphore::new(config.pool_size())),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            history: HistoryWindow::new(config.history_capacity),
            recent: RecencyWindow::new(config.recency_capacity),
            config,
            registry,
            cache,
            memo,
        }
    }

    pub fn with_fetch_timeout(mut self, limit: Duration) -> Self {
        self.fetch_timeout = limit;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn recent(&self) -> &RecencyWindow {
        &self.recent
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    /// Opening line: a random memoized response, or the stock greeting.
    pub async fn greeting(&self) -> String {
        self.read_memo(|memo| memo.random_greeting())
            .await
            .unwrap_or_else(|| FALLBACK_GREETING.to_string())
    }

    /// Processes one input line. Always yields a non-empty reply.
    pub async fn respond(&mut self, line: &str) -> Reply {
        let line = line.trim();
        let keywords = extract_keywords(line, &self.history, self.config.max_keywords);
        self.history.push(line);
        tracing::info!(
            target: "alexandrian::dialogue",
            session = %self.session_id,
            ?keywords,
            "turn started"
        );

        let fetched = self.retrieve(&keywords).await;
        let candidates = self.filter_candidates(fetched);

        let (text, source) = match self.scorer.select(
            &candidates,
            &keywords,
            &mut self.recent,
            self.config.reply_max_chars,
        ) {
            Some(text) => (text, ReplySource::Selected),
            None => self.fallback(line, &keywords).await,
        };

        self.persist(line, &text).await;
        tracing::info!(
            target: "alexandrian::dialogue",
            session = %self.session_id,
            candidates = candidates.len(),
            reply_source = ?source,
            "turn finished"
        );

        Reply {
            text,
            source,
            keywords,
            terminal: is_terminal(line),
        }
    }

    /// Sends the greeting, then answers every non-blank line until the peer
    /// closes or asks to exit.
    pub async fn run<C: LineChannel + ?Sized>(&mut self, channel: &mut C) -> io::Result<()> {
        let greeting = self.greeting().await;
        channel.send_line(&greeting).await?;
        while let Some(line) = channel.receive_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let reply = self.respond(&line).await;
            channel.send_line(&reply.text).await?;
            if reply.terminal {
                tracing::info!(target: "alexandrian::dialogue", session = %self.session_id, "session ended by peer");
                break;
            }
        }
        Ok(())
    }

    /// Full barrier: one task per (keyword, source), all awaited.
    async fn retrieve(&self, keywords: &[String]) -> Vec<Fetched> {
        let mut tasks = Vec::with_capacity(keywords.len() * self.registry.len());
        for keyword in keywords {
            for source in self.registry.iter() {
                let source = Arc::clone(source);
                let cache = Arc::clone(&self.cache);
                let pool = Arc::clone(&self.pool);
                let keyword = keyword.clone();
                let limit = self.fetch_timeout;
                tasks.push(tokio::spawn(async move {
                    let kind = source.kind();
                    let snippets = match pool.acquire_owned().await {
                        Ok(_permit) => bounded_fetch(&cache, source.as_ref(), &keyword, limit).await,
                        Err(_) => Vec::new(),
                    };
                    Fetched { kind, keyword, snippets }
                }));
            }
        }

        join_all(tasks)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(fetched) => Some(fetched),
                Err(e) => {
                    tracing::warn!(target: "alexandrian::retrieval", error = %e, "fetch task aborted; treating as empty");
                    None
                }
            })
            .collect()
    }

    fn filter_candidates(&self, fetched: Vec<Fetched>) -> Vec<String> {
        let caps = self.filter.config();
        let mut candidates = Vec::new();
        for f in fetched {
            let cap = match f.kind {
                SourceKind::PageScrape => caps.max_page_scrape,
                _ => caps.max_per_source,
            };
            candidates.extend(self.filter.clean(&f.snippets, &f.keyword, cap));
        }
        candidates
    }

    /// Instant answer over the whole keyword set, then the memo's best match, then [`APOLOGY`].
    async fn fallback(&self, line: &str, keywords: &[String]) -> (String, ReplySource) {
        if !keywords.is_empty() {
            if let Some(source) = self.registry.get(SourceKind::InstantAnswer) {
                let query = keywords.join(" ");
                let answer = bounded_fetch(&self.cache, source.as_ref(), &query, self.fetch_timeout)
                    .await
                    .into_iter()
                    .map(|a| a.trim().to_string())
                    .find(|a| !a.is_empty());
                if let Some(answer) = answer {
                    return (
                        truncate_chars(&answer, self.config.reply_max_chars),
                        ReplySource::InstantAnswer,
                    );
                }
            }
        }

        let line = line.to_string();
        let remembered = self.read_memo(move |memo| memo.best_match(&line)).await.flatten();
        if let Some(memo) = remembered.filter(|m| !m.trim().is_empty()) {
            return (memo, ReplySource::Memo);
        }

        (APOLOGY.to_string(), ReplySource::Apology)
    }

    /// Memo reads share the store's lock with saves, which hold it across two file
    /// writes, so they run on the blocking pool too.
    async fn read_memo<T, F>(&self, read: F) -> Option<T>
    where
        F: FnOnce(&MemoStore) -> T + Send + 'static,
        T: Send + 'static,
    {
        let memo = Arc::clone(&self.memo);
        match tokio::task::spawn_blocking(move || read(&memo)).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(target: "alexandrian::memo", session = %self.session_id, error = %e, "memo read aborted");
                None
            }
        }
    }

    async fn persist(&self, line: &str, reply: &str) {
        let memo = Arc::clone(&self.memo);
        let (line, reply) = (line.to_string(), reply.to_string());
        match tokio::task::spawn_blocking(move || memo.save(&line, &reply)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(target: "alexandrian::memo", session = %self.session_id, error = %e, "failed to persist exchange");
            }
            Err(e) => {
                tracing::error!(target: "alexandrian::memo", session = %self.session_id, error = %e, "persist task aborted");
            }
        }
    }
}
