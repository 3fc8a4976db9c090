//! alexandrian-core: the responder pipeline (keywords, retrieval cache, sentence
//! filter, scorer, memo store, dialogue orchestrator).
//!
//! Concrete knowledge sources live in `alexandrian-sources`; this crate only
//! defines the [`SourceAdapter`] seam they plug into.

mod cache;
mod channel;
mod config;
mod filter;
mod memo;
mod orchestrator;
mod scorer;
mod source;
mod text;
mod window;

// Configuration
pub use config::{CoreConfig, FilterConfig, PipelineConfig, ScoringWeights, SourcesConfig, DEFAULT_SOURCES};

// Normalizer and windows
pub use text::{extract_keywords, is_question, resolve_referent, tokenize, QUESTION_WORDS, STOPWORDS};
pub use window::{HistoryWindow, RecencyWindow, Window};

// Retrieval
pub use cache::{RetrievalCache, CACHE_ENTRY_CAP};
pub use source::{AdapterFailure, SourceAdapter, SourceKind, SourceRegistry};

// Filtering and ranking
pub use filter::{normalize, split_sentences, SentenceFilter};
pub use scorer::{ScoredCandidate, Scorer};

// Memo store
pub use memo::{
    best_match, input_key, load_table, load_tables, random_greeting, repair_json, KeyedTable, MemoError,
    MemoStore, FALLBACK_GREETING,
};

// Orchestration
pub use channel::{LineChannel, LineStream};
pub use orchestrator::{is_terminal, Dialogue, Reply, ReplySource, APOLOGY, DEFAULT_FETCH_TIMEOUT};
