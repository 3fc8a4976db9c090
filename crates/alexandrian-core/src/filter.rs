//! Sentence filter: turns raw snippets into well-formed candidate sentences.

use crate::config::FilterConfig;
use regex::Regex;
use std::sync::OnceLock;

fn citation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s*\[(?:\d+|[a-z]|note \d+|citation needed)\]").expect("static regex")
    })
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Strips citation markers, collapses whitespace runs and trims.
pub fn normalize(raw: &str) -> String {
    let stripped = citation_re().replace_all(raw.trim(), "");
    whitespace_re().replace_all(&stripped, " ").trim().to_string()
}

/// Splits paragraph text after `.`, `!` or `?` when followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(false, |n| n.is_whitespace()) {
            while chars.peek().map_or(false, |n| n.is_whitespace()) {
                chars.next();
            }
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.trim().is_empty() {
        out.push(current);
    }
    out
}

/// Accept/reject rules for candidate sentences.
#[derive(Debug, Clone, Copy)]
pub struct SentenceFilter {
    config: FilterConfig,
}

impl Default for SentenceFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

impl SentenceFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// True for a bare enumeration of the keyword (`k, k or k`) or a sentence too short to say anything.
    pub fn is_meaningless(&self, sentence: &str, keyword: &str) -> bool {
        let k = regex::escape(keyword);
        let enumeration = Regex::new(&format!(r"(?i)^{k}[,\s]*(?:{k}[,\s]*)+or {k}$"))
            .map(|re| re.is_match(sentence))
            .unwrap_or(false);
        enumeration
            || sentence.split_whitespace().count() < self.config.min_words
            || sentence.matches(' ').count() < self.config.min_spaces
    }

    /// Acceptance predicates on an already normalized sentence.
    pub fn accepts(&self, sentence: &str, keyword: &str) -> bool {
        let starts_upper = sentence.chars().next().map_or(false, char::is_uppercase);
        starts_upper
            && sentence.ends_with('.')
            && !sentence.ends_with(':')
            && sentence.to_lowercase().contains(&keyword.to_lowercase())
            && !self.is_meaningless(sentence, keyword)
    }

    /// Normalizes every raw sentence and keeps at most `cap` accepted ones, in input order.
    pub fn clean<S: AsRef<str>>(&self, raw: &[S], keyword: &str, cap: usize) -> Vec<String> {
        raw.iter()
            .map(|s| normalize(s.as_ref()))
            .filter(|s| self.accepts(s, keyword))
            .take(cap)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_citations_and_collapses_whitespace() {
        assert_eq!(
            normalize("  Gravity is   a force[1] that acts\n on mass.[23] "),
            "Gravity is a force that acts on mass."
        );
    }

    #[test]
    fn rejects_short_lowercase_and_colon_sentences() {
        let filter = SentenceFilter::default();
        let raw = [
            "Gravity is a force that attracts two bodies.",
            "It is weak.",
            "gravity is a force that attracts two bodies.",
            "Gravity has the following properties:",
            "Gravity is a force that attracts two bodies",
            "Magnetism is a force that attracts some metals.",
        ];
        let kept = filter.clean(&raw, "gravity", 10);
        assert_eq!(kept, vec!["Gravity is a force that attracts two bodies."]);
        for s in &kept {
            assert!(filter.accepts(s, "gravity"));
        }
    }

    #[test]
    fn enumeration_of_the_keyword_is_meaningless() {
        let filter = SentenceFilter::default();
        assert!(filter.is_meaningless("Gravity, gravity, gravity or gravity", "gravity"));
        assert!(!filter.is_meaningless("Gravity bends light around very heavy stars.", "gravity"));
    }

    #[test]
    fn cap_limits_accepted_sentences() {
        let filter = SentenceFilter::default();
        let raw: Vec<String> = (0..8)
            .map(|i| format!("Gravity example number {i} is quite long enough."))
            .collect();
        assert_eq!(filter.clean(&raw, "gravity", 5).len(), 5);
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let parts = split_sentences("Gravity pulls. Does it push? No! It pulls.");
        assert_eq!(parts, vec!["Gravity pulls.", "Does it push?", "No!", "It pulls."]);
        assert_eq!(split_sentences("Version 1.5 shipped."), vec!["Version 1.5 shipped."]);
    }
}
