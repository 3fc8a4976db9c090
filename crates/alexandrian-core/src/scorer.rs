//! Candidate ranking and non-repeating selection.

use crate::config::ScoringWeights;
use crate::window::RecencyWindow;
use std::cmp::Ordering;
use std::collections::HashSet;

/// One scored instance of a candidate against one keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub text: String,
    pub keyword: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    weights: ScoringWeights,
}

impl Scorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// `position_score + start_bonus + length_score`; 0 when `keyword` is not a whitespace token of `sentence`.
    pub fn score_sentence(&self, sentence: &str, keyword: &str) -> f64 {
        let keyword = keyword.to_lowercase();
        let lowered = sentence.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        let Some(pos) = words.iter().position(|w| *w == keyword) else {
            return 0.0;
        };

        let total = words.len() as f64;
        let position_score = self.weights.position_base - (pos as f64 / total);
        let start_bonus = if pos == 0 { self.weights.start_bonus } else { 0.0 };
        let length_score = (total / self.weights.length_norm).min(self.weights.length_cap);
        position_score + start_bonus + length_score
    }

    /// Scores every candidate once per keyword it contains, sorted by score descending.
    /// The sort is stable, so ties keep encounter order.
    pub fn rank<S: AsRef<str>>(&self, candidates: &[S], keywords: &[String]) -> Vec<ScoredCandidate> {
        let mut ranked = Vec::new();
        for text in candidates.iter().map(AsRef::as_ref) {
            if text.trim().is_empty() {
                continue;
            }
            let lowered = text.to_lowercase();
            for keyword in keywords {
                if lowered.contains(&keyword.to_lowercase()) {
                    ranked.push(ScoredCandidate {
                        text: text.to_string(),
                        keyword: keyword.clone(),
                        score: self.score_sentence(text, keyword),
                    });
                }
            }
        }
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked
    }

    /// Picks the best-ranked candidate not in `recent`, records it there and
    /// returns it truncated to `max_chars`. `None` when every candidate is a recent repeat.
    pub fn select<S: AsRef<str>>(
        &self,
        candidates: &[S],
        keywords: &[String],
        recent: &mut RecencyWindow,
        max_chars: usize,
    ) -> Option<String> {
        let ranked = self.rank(candidates, keywords);
        let mut seen = HashSet::new();
        let chosen = ranked
            .into_iter()
            .filter(|c| seen.insert(c.text.clone()))
            .find(|c| !recent.contains(&c.text))?;

        recent.push(chosen.text.clone());
        Some(truncate_chars(&chosen.text, max_chars))
    }
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
