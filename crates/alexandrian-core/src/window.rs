//! Bounded FIFO windows over recent lines.

use std::collections::VecDeque;

/// Fixed-capacity FIFO of strings; the oldest entry is evicted at capacity.
#[derive(Debug, Clone)]
pub struct Window {
    capacity: usize,
    items: VecDeque<String>,
}

/// Last N emitted replies, consulted to avoid verbatim repeats.
pub type RecencyWindow = Window;

/// Last M raw input lines, consulted for pronoun resolution.
pub type HistoryWindow = Window;

impl Window {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: impl Into<String>) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item.into());
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }

    /// Most recently pushed entry.
    pub fn latest(&self) -> Option<&str> {
        self.items.back().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourth_push_evicts_the_first() {
        let mut recent = RecencyWindow::new(3);
        for reply in ["one", "two", "three"] {
            recent.push(reply);
        }
        assert!(recent.contains("one"));
        recent.push("four");
        assert!(!recent.contains("one"));
        assert_eq!(recent.len(), 3);
        assert_eq!(recent.latest(), Some("four"));
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["two", "three", "four"]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut history = HistoryWindow::new(0);
        history.push("a");
        history.push("b");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.latest(), Some("b"));
    }
}
