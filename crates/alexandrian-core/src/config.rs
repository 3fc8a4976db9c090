//! Runtime configuration shared by every crate in the workspace.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default source set, in fan-out order.
pub const DEFAULT_SOURCES: [&str; 3] = ["page_scrape", "instant_answer", "entity_search"];

/// Global application configuration (daemon + pipeline). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Display name used in startup logs.
    pub app_name: String,
    /// Address the daemon listens on for line-delimited sessions.
    pub bind_addr: String,
    /// Directory holding `inputs.json` and `responses.json`.
    pub storage_path: String,
    /// Optional append-only transcript (`User: ...` / `[>>>]: ...`).
    #[serde(default)]
    pub session_log: Option<String>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "Alexandrian".to_string(),
            bind_addr: "127.0.0.1:5000".to_string(),
            storage_path: "./data".to_string(),
            session_log: None,
            pipeline: PipelineConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Load config from file and environment. Precedence: env `ALEXANDRIAN_CONFIG` path > `config/alexandrian.toml` > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("ALEXANDRIAN_CONFIG")
            .unwrap_or_else(|_| "config/alexandrian.toml".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "Alexandrian")?
            .set_default("bind_addr", "127.0.0.1:5000")?
            .set_default("storage_path", "./data")?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("ALEXANDRIAN").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    /// Path of the table keyed by input text.
    pub fn inputs_table_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("inputs.json")
    }

    /// Path of the table keyed by response text.
    pub fn responses_table_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("responses.json")
    }
}

/// Tunables for one dialogue turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_keywords: usize,
    pub recency_capacity: usize,
    pub history_capacity: usize,
    /// Concurrent (keyword, source) fetches per turn. Clamped to 4..=10.
    pub worker_pool_size: usize,
    pub reply_max_chars: usize,
    pub filter: FilterConfig,
    pub scoring: ScoringWeights,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_keywords: 3,
            recency_capacity: 3,
            history_capacity: 5,
            worker_pool_size: 5,
            reply_max_chars: 500,
            filter: FilterConfig::default(),
            scoring: ScoringWeights::default(),
        }
    }
}

impl PipelineConfig {
    pub fn pool_size(&self) -> usize {
        self.worker_pool_size.clamp(4, 10)
    }
}

/// Sentence acceptance thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_words: usize,
    pub min_spaces: usize,
    pub max_per_source: usize,
    pub max_page_scrape: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_words: 5,
            min_spaces: 3,
            max_per_source: 10,
            max_page_scrape: 5,
        }
    }
}

/// Weights for `position_score + start_bonus + length_score`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub position_base: f64,
    pub start_bonus: f64,
    pub length_norm: f64,
    pub length_cap: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            position_base: 1.5,
            start_bonus: 3.0,
            length_norm: 30.0,
            length_cap: 1.0,
        }
    }
}

/// Knowledge source endpoints and the enabled set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Source names (`page_scrape`, `instant_answer`, `entity_search`). Unknown names are skipped.
    pub enabled: Vec<String>,
    /// Per-request timeout. Clamped to 3..=5 seconds.
    pub timeout_secs: u64,
    pub entity_limit: usize,
    pub page_base_url: String,
    pub instant_answer_url: String,
    pub entity_search_url: String,
    pub user_agent: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            timeout_secs: 5,
            entity_limit: 3,
            page_base_url: "https://en.wikipedia.org/wiki/".to_string(),
            instant_answer_url: "https://api.duckduckgo.com/".to_string(),
            entity_search_url: "https://www.wikidata.org/w/api.php".to_string(),
            user_agent: concat!("alexandrian/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.clamp(3, 5))
    }
}
