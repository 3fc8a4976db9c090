//! Text normalizer: tokenization, stopword removal, question detection and
//! pronoun resolution against recent input lines.

use crate::window::HistoryWindow;

/// Words that never drive retrieval.
pub const STOPWORDS: [&str; 10] = ["it", "to", "so", "a", "the", "about", "is", "of", "in", "on"];

/// Leading words that mark a line as a question.
pub const QUESTION_WORDS: [&str; 10] = [
    "what", "where", "when", "why", "how", "who", "which", "tell", "explain", "describe",
];

/// Tokens shorter than this are ignored outside questions.
const MIN_TOKEN_LEN: usize = 3;

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

pub fn is_question_word(token: &str) -> bool {
    QUESTION_WORDS.contains(&token)
}

/// Lowercased word tokens (runs of alphanumerics and `_`), in order.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// A line is a question when its first word is a question word or it contains `?`.
pub fn is_question(line: &str) -> bool {
    if line.contains('?') {
        return true;
    }
    tokenize(line)
        .first()
        .map(|first| is_question_word(first))
        .unwrap_or(false)
}

fn is_content_token(token: &str) -> bool {
    token.chars().count() >= MIN_TOKEN_LEN && !is_stopword(token)
}

/// Extracts at most `max_keywords` keywords from `line`.
///
/// `history` holds prior input lines only; the caller records `line` afterwards.
/// When the line itself yields nothing, the most frequent content token of the
/// latest history entry stands in as the referent.
pub fn extract_keywords(line: &str, history: &HistoryWindow, max_keywords: usize) -> Vec<String> {
    let tokens = tokenize(line);

    let mut keywords: Vec<String> = if is_question(line) {
        tokens
            .into_iter()
            .filter(|t| !is_question_word(t) && !is_stopword(t))
            .collect()
    } else {
        tokens.into_iter().filter(|t| is_content_token(t)).collect()
    };

    if keywords.is_empty() {
        if let Some(referent) = resolve_referent(history) {
            keywords.push(referent);
        }
    }

    keywords.truncate(max_keywords);
    keywords
}

/// Most frequent content token of the latest history entry; ties go to the first occurrence.
pub fn resolve_referent(history: &HistoryWindow) -> Option<String> {
    let last = history.latest()?;
    let mut counts: Vec<(String, usize)> = Vec::new();
    for token in tokenize(last).into_iter().filter(|t| is_content_token(t)) {
        match counts.iter_mut().find(|(t, _)| *t == token) {
            Some((_, n)) => *n += 1,
            None => counts.push((token, 1)),
        }
    }

    let mut best: Option<(String, usize)> = None;
    for (token, n) in counts {
        if best.as_ref().map_or(true, |(_, top)| n > *top) {
            best = Some((token, n));
        }
    }
    best.map(|(token, _)| token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_history() -> HistoryWindow {
        HistoryWindow::new(5)
    }

    #[test]
    fn question_drops_question_words_and_stopwords() {
        let kws = extract_keywords("What is gravity?", &empty_history(), 3);
        assert_eq!(kws, vec!["gravity"]);

        let kws = extract_keywords("how do planets orbit the sun", &empty_history(), 3);
        assert_eq!(kws, vec!["do", "planets", "orbit"]);
        for kw in &kws {
            assert!(!is_question_word(kw) && !is_stopword(kw));
        }
    }

    #[test]
    fn statement_keeps_long_non_stopwords() {
        let kws = extract_keywords("I like reading about ancient Rome", &empty_history(), 3);
        assert_eq!(kws, vec!["like", "reading", "ancient"]);
    }

    #[test]
    fn nothing_extractable_with_empty_history_is_empty() {
        assert!(extract_keywords("it is so", &empty_history(), 3).is_empty());
        assert!(extract_keywords("", &empty_history(), 3).is_empty());
    }

    #[test]
    fn pronoun_resolves_from_latest_history_entry() {
        let mut history = empty_history();
        history.push("volcanoes erupt and volcanoes smoke");
        history.push("tell me about the ocean and the ocean floor");
        let kws = extract_keywords("is it so", &history, 3);
        assert_eq!(kws, vec!["ocean"]);
    }

    #[test]
    fn referent_ties_break_on_first_occurrence() {
        let mut history = empty_history();
        history.push("rivers meet mountains");
        assert_eq!(resolve_referent(&history).as_deref(), Some("rivers"));
    }

    #[test]
    fn question_mark_anywhere_marks_a_question() {
        assert!(is_question("gravity is strong?"));
        assert!(is_question("Explain tides"));
        assert!(!is_question("whatever happens"));
    }
}
