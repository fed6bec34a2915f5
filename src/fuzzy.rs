//! Fuzzy typo repair via skip-gram features and weighted Jaccard similarity.
//!
//! Grounded in `__fuzzy_string__.py`'s `FixTypos`/`skipgram_bow`/
//! `weighted_jaccard`. The weighted scheme collapses to weight 1 per feature
//! in practice (see the specification's design notes), so the bag of
//! features here is a plain `byte-pair -> count` map.

use ahash::{AHashMap, AHashSet};

/// A skip-gram bag of features: every unordered byte pair in a string,
/// weighted by occurrence count.
fn skipgram_bow(s: &str) -> AHashMap<(u8, u8), f64> {
    let bytes = s.as_bytes();
    let mut bow = AHashMap::new();
    for i in 0..bytes.len() {
        for j in (i + 1)..bytes.len() {
            *bow.entry((bytes[i], bytes[j])).or_insert(0.0) += 1.0;
        }
    }
    bow
}

/// `Σ min(a_k, b_k) / Σ max(a_k, b_k)` over the union of feature keys. `NaN`
/// if both bags are empty.
fn weighted_jaccard(a: &AHashMap<(u8, u8), f64>, b: &AHashMap<(u8, u8), f64>) -> f64 {
    let keys: AHashSet<&(u8, u8)> = a.keys().chain(b.keys()).collect();
    let (mut min_sum, mut max_sum) = (0.0_f64, 0.0_f64);
    for k in keys {
        let av = *a.get(k).unwrap_or(&0.0);
        let bv = *b.get(k).unwrap_or(&0.0);
        min_sum += av.min(bv);
        max_sum += av.max(bv);
    }
    if max_sum == 0.0 {
        f64::NAN
    } else {
        min_sum / max_sum
    }
}

/// Maps a 0-10 repair level to a similarity cutoff, clamped to `[0.5, 1.0]`.
fn level_to_threshold(level: u8) -> f64 {
    let t = 1.0 - f64::from(level) * 0.05;
    t.clamp(0.5, 1.0)
}

fn digits_of(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

fn uppercase_letter_count(s: &str) -> usize {
    s.chars().filter(char::is_ascii_uppercase).count()
}

/// A vocabulary-backed typo repairer for one field (city or street name).
pub struct FixTypos {
    vocabulary: AHashSet<String>,
    bow_of: AHashMap<String, AHashMap<(u8, u8), f64>>,
    features_index: AHashMap<(u8, u8), Vec<String>>,
    threshold: f64,
    enabled: bool,
}

impl FixTypos {
    /// Build a repairer over `words` (already uppercased) at the given
    /// 0-10 repair level. Level 0 disables repair entirely.
    pub fn new(words: impl IntoIterator<Item = String>, level: u8) -> Self {
        let mut vocabulary = AHashSet::new();
        let mut bow_of = AHashMap::new();
        let mut features_index: AHashMap<(u8, u8), Vec<String>> = AHashMap::new();

        for word in words {
            if vocabulary.contains(&word) {
                continue;
            }
            let bow = skipgram_bow(&word);
            for feature in bow.keys() {
                features_index.entry(*feature).or_default().push(word.clone());
            }
            bow_of.insert(word.clone(), bow);
            vocabulary.insert(word);
        }

        Self {
            vocabulary,
            bow_of,
            features_index,
            threshold: level_to_threshold(level),
            enabled: level > 0,
        }
    }

    fn should_maybe_fix(&self, s: &str) -> bool {
        uppercase_letter_count(s) >= 4 && !self.vocabulary.contains(s)
    }

    /// Candidate vocabulary words sharing at least one skip-gram feature
    /// with `s` and the same embedded digit sequence, paired with their
    /// weighted-Jaccard similarity to `s`.
    fn candidates(&self, s: &str, bow: &AHashMap<(u8, u8), f64>) -> Vec<(&str, f64)> {
        let digits = digits_of(s);
        let mut seen = AHashSet::new();
        let mut out = Vec::new();
        for feature in bow.keys() {
            let Some(words) = self.features_index.get(feature) else {
                continue;
            };
            for word in words {
                if word == s || !seen.insert(word.as_str()) {
                    continue;
                }
                if digits_of(word) != digits {
                    continue;
                }
                let other_bow = &self.bow_of[word];
                out.push((word.as_str(), weighted_jaccard(bow, other_bow)));
            }
        }
        out
    }

    /// Repair `s` if it looks like a typo of a vocabulary word, otherwise
    /// return it unchanged. `s` is expected to already be uppercased.
    pub fn repair(&self, s: &str) -> String {
        if !self.enabled || !self.should_maybe_fix(s) {
            return s.to_string();
        }
        let bow = skipgram_bow(s);
        let candidates = self.candidates(s, &bow);
        let Some((best_word, best_similarity)) = candidates
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        else {
            return s.to_string();
        };
        if best_similarity.sqrt() > self.threshold {
            best_word.to_string()
        } else {
            s.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    fn vocab() -> Vec<String> {
        ["MICHIGAN", "SCALIFORNIA", "OHIO", "ONTARIO", "NUMERIC12"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn repairs_minor_typo_at_default_level() {
        let fixer = FixTypos::new(vocab(), 5);
        check!(fixer.repair("MMICHYIGAN") == "MICHIGAN");
    }

    #[test]
    fn leaves_dissimilar_word_unchanged() {
        let fixer = FixTypos::new(vocab(), 5);
        check!(fixer.repair("MUICHZIGAAN") == "MUICHZIGAAN");
    }

    #[test]
    fn level_zero_is_identity() {
        let fixer = FixTypos::new(vocab(), 0);
        check!(fixer.repair("MMICHYIGAN") == "MMICHYIGAN");
    }

    #[test]
    fn vocabulary_words_are_left_alone() {
        let fixer = FixTypos::new(vocab(), 5);
        check!(fixer.repair("OHIO") == "OHIO");
    }

    #[test]
    fn short_words_are_never_touched() {
        let fixer = FixTypos::new(vocab(), 10);
        check!(fixer.repair("ABC") == "ABC");
    }

    #[test]
    fn digit_mismatch_blocks_a_match() {
        let fixer = FixTypos::new(vocab(), 10);
        // differs only by trailing digit from NUMERIC12; should not match.
        check!(fixer.repair("NUMERIC13") != "NUMERIC12");
    }

    #[test]
    fn level_to_threshold_is_clamped() {
        check!(level_to_threshold(0) == 1.0);
        check!(level_to_threshold(20) == 0.5);
    }
}
