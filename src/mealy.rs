//! Mealy-style multi-word phrase matcher.
//!
//! Builds a two-key table from label → phrase mappings: a `continues` set of
//! every strict token-sequence prefix, and an `ends` map from a full token
//! sequence to its label. Recognition greedily extends the matched prefix
//! while a `continues` entry exists, remembering the most recent position at
//! which an `ends` entry also existed; the longest such position wins.
//!
//! Synonyms (e.g. `"SOUTH DAKOTA"` and `"SD"` both meaning the same state)
//! are folded in by registering each synonym phrase against the same label,
//! rather than as a separate per-token normalizer pass — the table already
//! expresses everything a normalizer layer would, without a second lookup.

use ahash::{AHashMap, AHashSet};

/// A compiled phrase matcher for one table (states, suffixes, directionals, ...).
#[derive(Debug)]
pub struct Mealy {
    continues: AHashSet<Vec<String>>,
    ends: AHashMap<Vec<String>, String>,
}

/// Incrementally builds a [`Mealy`] from `(label, phrase)` pairs.
#[derive(Debug, Default)]
pub struct MealyBuilder {
    continues: AHashSet<Vec<String>>,
    ends: AHashMap<Vec<String>, String>,
}

impl MealyBuilder {
    /// Register `phrase` (whitespace-separated, already uppercased) as
    /// recognizing `label`. Labels are owned, so known-city overlays built
    /// per `Parser` can register arbitrary caller-supplied labels alongside
    /// the process-global tables' static ones.
    pub fn add_phrase(&mut self, label: &str, phrase: &str) {
        let tokens: Vec<String> = phrase.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            return;
        }
        for i in 1..tokens.len() {
            self.continues.insert(tokens[..i].to_vec());
        }
        self.ends.insert(tokens, label.to_string());
    }

    pub fn build(self) -> Mealy {
        Mealy {
            continues: self.continues,
            ends: self.ends,
        }
    }
}

impl Mealy {
    pub fn builder() -> MealyBuilder {
        MealyBuilder::default()
    }

    /// Attempt to match a phrase starting at `tokens[start]`. Returns the
    /// label and the number of tokens consumed (at least 1), or `None` if no
    /// `ends` entry was ever reached.
    pub fn match_at(&self, tokens: &[String], start: usize) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        let mut prefix: Vec<String> = Vec::new();
        let mut i = start;
        while i < tokens.len() {
            prefix.push(tokens[i].clone());
            i += 1;
            if let Some(label) = self.ends.get(&prefix) {
                best = Some((label.as_str(), prefix.len()));
            }
            if !self.continues.contains(&prefix) {
                break;
            }
        }
        best
    }

    /// Convenience for single-token lookups used by combinator recognizers.
    pub fn match_one(&self, token: &str) -> Option<&str> {
        self.match_at(std::slice::from_ref(&token.to_string()), 0)
            .filter(|(_, len)| *len == 1)
            .map(|(label, _)| label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn sample() -> Mealy {
        let mut b = Mealy::builder();
        b.add_phrase("SD", "SD");
        b.add_phrase("SD", "SOUTH DAKOTA");
        b.add_phrase("S", "SOUTH");
        b.build()
    }

    #[rstest]
    #[case(&["SOUTH", "DAKOTA", "CITY"], 0, "SD", 2)]
    #[case(&["SOUTH", "STREET"], 0, "S", 1)]
    #[case(&["SD", "CITY"], 0, "SD", 1)]
    fn matches_longest_accepting_prefix(
        #[case] tokens: &[&str],
        #[case] start: usize,
        #[case] expected_label: &str,
        #[case] expected_len: usize,
    ) {
        let m = sample();
        let owned: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
        let (label, len) = m.match_at(&owned, start).unwrap();
        check!(label == expected_label);
        check!(len == expected_len);
    }

    #[test]
    fn no_match_returns_none() {
        let m = sample();
        let tokens = vec!["NOWHERE".to_string()];
        check!(m.match_at(&tokens, 0).is_none());
    }

    #[test]
    fn match_one_rejects_multi_word_only_phrases() {
        let mut b = Mealy::builder();
        b.add_phrase("NJ", "NEW JERSEY");
        let m = b.build();
        check!(m.match_one("NEW").is_none());
    }
}
