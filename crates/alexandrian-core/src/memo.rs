//! Durable memo of past exchanges.
//!
//! Two JSON tables of shape `{"input": {key: {"meaning": value}}}`:
//!
//! | Table            | Key                          | Meaning            |
//! |------------------|------------------------------|--------------------|
//! | `inputs.json`    | input line (trimmed, lowercase) | chosen response |
//! | `responses.json` | response text                | the response itself |
//!
//! Both tables are loaded whole at open and rewritten whole on every save.

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Greeting used when no response has been memoized yet.
pub const FALLBACK_GREETING: &str = "Hello, how can I assist you?";

const TABLE_ROOT: &str = "input";

#[derive(Debug, thiserror::Error)]
pub enum MemoError {
    #[error("failed to write memo table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize memo table: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Insertion-ordered `key -> meaning` table. Repeated keys overwrite the meaning in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl KeyedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].1.as_str())
    }

    /// Returns true when `key` already existed.
    pub fn upsert(&mut self, key: impl Into<String>, meaning: impl Into<String>) -> bool {
        let key = key.into();
        let meaning = meaning.into();
        match self.index.get(&key) {
            Some(&i) => {
                self.entries[i].1 = meaning;
                true
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, meaning));
                false
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn from_json(value: &Value) -> Option<Self> {
        let rows = value.get(TABLE_ROOT)?.as_object()?;
        let mut table = Self::new();
        for (key, row) in rows {
            if let Some(meaning) = row.get("meaning").and_then(Value::as_str) {
                table.upsert(key.clone(), meaning);
            }
        }
        Some(table)
    }

    fn to_json(&self) -> Value {
        let rows: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, m)| (k.clone(), serde_json::json!({ "meaning": m })))
            .collect();
        let mut root = Map::new();
        root.insert(TABLE_ROOT.to_string(), Value::Object(rows));
        Value::Object(root)
    }
}

/// Key under which an input line is stored and matched.
pub fn input_key(line: &str) -> String {
    line.trim().to_lowercase()
}

fn overlap_tokens(text: &str) -> HashSet<String> {
    text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Meaning of the key sharing the most words with `line`. Ties keep the earliest key;
/// `None` when no key shares a word.
pub fn best_match(line: &str, inputs: &KeyedTable) -> Option<String> {
    let wanted = overlap_tokens(line);
    let mut best: Option<(usize, &str)> = None;
    for (key, meaning) in inputs.iter() {
        let key_tokens = overlap_tokens(key);
        let overlap = wanted.iter().filter(|t| key_tokens.contains(*t)).count();
        if overlap > best.map_or(0, |(n, _)| n) {
            best = Some((overlap, meaning));
        }
    }
    best.map(|(_, meaning)| meaning.to_string())
}

/// Uniformly random memoized response, or [`FALLBACK_GREETING`] when none exist.
pub fn random_greeting<R: Rng + ?Sized>(responses: &KeyedTable, rng: &mut R) -> String {
    let meanings: Vec<&str> = responses.iter().map(|(_, m)| m).collect();
    meanings
        .choose(rng)
        .map(|m| m.to_string())
        .unwrap_or_else(|| FALLBACK_GREETING.to_string())
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",(\s*[}\]])").expect("static regex"))
}

/// Best-effort repair: drops trailing commas and appends missing closers.
/// Returns the repaired text only if it parses.
pub fn repair_json(content: &str) -> Option<String> {
    let mut fixed = trailing_comma_re().replace_all(content.trim(), "$1").into_owned();

    let mut open: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in fixed.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                if open.pop() != Some(c) {
                    return None;
                }
            }
            _ => {}
        }
    }
    if in_string {
        return None;
    }
    while let Some(closer) = open.pop() {
        fixed.push('\n');
        fixed.push(closer);
    }
    let fixed = trailing_comma_re().replace_all(&fixed, "$1").into_owned();

    serde_json::from_str::<Value>(&fixed).ok().map(|_| fixed)
}

/// Loads one table. Missing, blank, malformed or wrongly shaped files come back empty;
/// repairable files are repaired and rewritten in place.
pub fn load_table(path: &Path) -> KeyedTable {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(target: "alexandrian::memo", path = %path.display(), "memo table absent; starting empty");
            return KeyedTable::new();
        }
        Err(e) => {
            tracing::error!(target: "alexandrian::memo", path = %path.display(), error = %e, "memo table unreadable; starting empty");
            return KeyedTable::new();
        }
    };
    if content.trim().is_empty() {
        return KeyedTable::new();
    }

    let value = match serde_json::from_str::<Value>(&content) {
        Ok(v) => v,
        Err(parse_err) => match repair_json(&content) {
            Some(fixed) => {
                tracing::warn!(target: "alexandrian::memo", path = %path.display(), error = %parse_err, "repaired malformed memo table");
                if let Err(e) = write_atomic(path, &fixed) {
                    tracing::warn!(target: "alexandrian::memo", path = %path.display(), error = %e, "could not rewrite repaired memo table");
                }
                match serde_json::from_str::<Value>(&fixed) {
                    Ok(v) => v,
                    Err(_) => return KeyedTable::new(),
                }
            }
            None => {
                tracing::error!(
                    target: "alexandrian::memo",
                    path = %path.display(),
                    error = %parse_err,
                    "could not repair memo table {}; manual correction needed",
                    path.display()
                );
                return KeyedTable::new();
            }
        },
    };

    KeyedTable::from_json(&value).unwrap_or_else(|| {
        tracing::warn!(target: "alexandrian::memo", path = %path.display(), "memo table has no \"{}\" object; starting empty", TABLE_ROOT);
        KeyedTable::new()
    })
}

/// Loads `(inputs, responses)`.
pub fn load_tables(inputs_path: &Path, responses_path: &Path) -> (KeyedTable, KeyedTable) {
    (load_table(inputs_path), load_table(responses_path))
}

fn write_atomic(path: &Path, content: &str) -> Result<(), MemoError> {
    let io_err = |source| MemoError::Io { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)
}

fn write_table(path: &Path, table: &KeyedTable) -> Result<(), MemoError> {
    let content = serde_json::to_string_pretty(&table.to_json())?;
    write_atomic(path, &content)
}

struct MemoTables {
    inputs: KeyedTable,
    responses: KeyedTable,
}

/// Memo store shared across sessions. Each save is one critical section:
/// modify both tables, then flush both whole.
pub struct MemoStore {
    inputs_path: PathBuf,
    responses_path: PathBuf,
    tables: Mutex<MemoTables>,
}

impl MemoStore {
    /// Opens the store, loading both tables in full. Never fails; see [`load_table`].
    pub fn open(inputs_path: impl Into<PathBuf>, responses_path: impl Into<PathBuf>) -> Self {
        let inputs_path = inputs_path.into();
        let responses_path = responses_path.into();
        let (inputs, responses) = load_tables(&inputs_path, &responses_path);
        tracing::info!(
            target: "alexandrian::memo",
            inputs = inputs.len(),
            responses = responses.len(),
            "memo store loaded"
        );
        Self {
            inputs_path,
            responses_path,
            tables: Mutex::new(MemoTables { inputs, responses }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoTables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `input -> response` and `response -> response`, then rewrites both tables.
    ///
    /// The in-memory tables change only once both files are written. If the second
    /// write fails, the first file is ahead of memory until the next successful save
    /// rewrites both whole.
    pub fn save(&self, input: &str, response: &str) -> Result<(), MemoError> {
        let mut tables = self.lock();
        let key = input_key(input);

        let mut inputs = tables.inputs.clone();
        let inputs_updated = inputs.upsert(key.as_str(), response);
        let mut responses = tables.responses.clone();
        let responses_updated = responses.upsert(response, response);

        write_table(&self.inputs_path, &inputs)?;
        write_table(&self.responses_path, &responses)?;

        tables.inputs = inputs;
        tables.responses = responses;
        log_write("inputs", &key, inputs_updated);
        log_write("responses", response, responses_updated);
        Ok(())
    }

    /// Stored response for exactly this input line.
    pub fn lookup(&self, input: &str) -> Option<String> {
        self.lock().inputs.get(&input_key(input)).map(str::to_string)
    }

    pub fn best_match(&self, line: &str) -> Option<String> {
        best_match(line, &self.lock().inputs)
    }

    pub fn random_greeting(&self) -> String {
        random_greeting(&self.lock().responses, &mut rand::thread_rng())
    }

    /// Copies of `(inputs, responses)` as currently held in memory.
    pub fn snapshot(&self) -> (KeyedTable, KeyedTable) {
        let tables = self.lock();
        (tables.inputs.clone(), tables.responses.clone())
    }
}

fn log_write(table: &str, key: &str, updated: bool) {
    tracing::info!(
        target: "alexandrian::memo",
        table,
        key,
        action = if updated { "UPDATE" } else { "INSERT" },
        "memo [{}] {} key '{}'",
        table,
        if updated { "updated" } else { "inserted" },
        key
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table(rows: &[(&str, &str)]) -> KeyedTable {
        let mut t = KeyedTable::new();
        for (k, m) in rows {
            t.upsert(*k, *m);
        }
        t
    }

    #[test]
    fn best_match_prefers_larger_overlap() {
        let inputs = table(&[("quick brown dog", "one"), ("the lazy fox", "two")]);
        assert_eq!(best_match("the quick fox", &inputs).as_deref(), Some("two"));
    }

    #[test]
    fn best_match_ties_keep_first_and_zero_is_none() {
        let inputs = table(&[("red fox", "first"), ("blue fox", "second")]);
        assert_eq!(best_match("fox", &inputs).as_deref(), Some("first"));
        assert_eq!(best_match("green owl", &inputs), None);
        assert_eq!(best_match("anything", &KeyedTable::new()), None);
    }

    #[test]
    fn greeting_falls_back_when_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(random_greeting(&KeyedTable::new(), &mut rng), FALLBACK_GREETING);
        let responses = table(&[("Hi there friend.", "Hi there friend.")]);
        assert_eq!(random_greeting(&responses, &mut rng), "Hi there friend.");
    }

    #[test]
    fn upsert_overwrites_in_place() {
        let mut t = table(&[("a", "1"), ("b", "2")]);
        assert!(t.upsert("a", "3"));
        assert_eq!(t.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn repair_drops_trailing_commas_and_closes_braces() {
        let broken = r#"{"input": {"hi": {"meaning": "hello"},}"#;
        let fixed = repair_json(broken).unwrap();
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["input"]["hi"]["meaning"], "hello");

        assert!(repair_json(r#"{"input": {"hi": "unterminated}}"#).is_none());
        assert!(repair_json("{]").is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = dir.path().join("inputs.json");
        let responses = dir.path().join("responses.json");
        let store = MemoStore::open(&inputs, &responses);
        store.save("What is gravity?", "Gravity attracts mass.").unwrap();
        store.save("hello", "Hi.").unwrap();

        let (loaded_inputs, loaded_responses) = load_tables(&inputs, &responses);
        assert_eq!(loaded_inputs.get("what is gravity?"), Some("Gravity attracts mass."));
        assert_eq!(loaded_responses.get("Hi."), Some("Hi."));
        assert_eq!(loaded_inputs.len(), 2);
        assert_eq!(store.lookup("  WHAT is gravity?"), Some("Gravity attracts mass.".to_string()));
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = dir.path().join("inputs.json");
        // A regular file where the responses directory should be makes the second write fail.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = MemoStore::open(&inputs, blocker.join("responses.json"));

        let err = store.save("What is gravity?", "Gravity attracts mass.").unwrap_err();
        assert!(matches!(err, MemoError::Io { .. }));

        let (mem_inputs, mem_responses) = store.snapshot();
        assert!(mem_inputs.is_empty());
        assert!(mem_responses.is_empty());
        assert_eq!(store.lookup("What is gravity?"), None);
        assert_eq!(store.best_match("what is gravity?"), None);
    }

    #[test]
    fn malformed_table_is_repaired_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = dir.path().join("inputs.json");
        std::fs::write(&inputs, "{\n  \"input\": {\n    \"hi\": {\"meaning\": \"hello\"},\n").unwrap();
        let table = load_table(&inputs);
        assert_eq!(table.get("hi"), Some("hello"));
        let rewritten = std::fs::read_to_string(&inputs).unwrap();
        assert!(serde_json::from_str::<Value>(&rewritten).is_ok());
    }

    #[test]
    fn unrepairable_or_misshapen_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json at all").unwrap();
        assert!(load_table(&garbage).is_empty());

        let wrong = dir.path().join("wrong.json");
        std::fs::write(&wrong, r#"{"rows": []}"#).unwrap();
        assert!(load_table(&wrong).is_empty());

        assert!(load_table(&dir.path().join("missing.json")).is_empty());
    }
}
