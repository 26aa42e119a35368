//! Fuzzy lookup over an arbitrary item list, backed by nucleo.

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use tracing::debug;

/// Items paired with the string they are matched on.
pub struct FuzzyIndex<T> {
    entries: Vec<(T, String)>,
}

impl<T> FuzzyIndex<T> {
    pub fn new(items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> String) -> Self {
        let entries = items
            .into_iter()
            .map(|item| {
                let k = key(&item);
                (item, k)
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(item, _)| item)
    }

    /// Matching items, best first, ignoring case. Equal scores keep insertion
    /// order. A blank query matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&T> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let pattern = Pattern::new(
            query,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );
        let mut matcher = Matcher::new(Config::DEFAULT);
        let mut buf = Vec::new();

        let mut scored: Vec<(u32, &T)> = self
            .entries
            .iter()
            .filter_map(|(item, key)| {
                let haystack = Utf32Str::new(key, &mut buf);
                pattern
                    .score(haystack, &mut matcher)
                    .map(|score| (score, item))
            })
            .collect();

        debug!("Fuzzy query {:?} matched {} items", query, scored.len());

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(limit);
        scored.into_iter().map(|(_, item)| item).collect()
    }
}

impl<T> Default for FuzzyIndex<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}
