//! Immutable input cursor over a token stream.
//!
//! Mirrors the original `GenericInput` zipper: advancing never mutates the
//! receiver, it hands back a new cursor sharing the same backing token slice.
//! This is what lets the combinator engine in [`crate::combinators`] try an
//! operation, fail, and simply drop the new cursor without needing to restore
//! any state.

use std::rc::Rc;

use crate::error::ParseError;

/// A position within an immutable, shared token stream.
///
/// Cloning a `Cursor` is O(1): the token slice is reference-counted and only
/// the position index is copied.
#[derive(Debug, Clone)]
pub struct Cursor {
    tokens: Rc<[String]>,
    pos: usize,
}

impl Cursor {
    /// Build a cursor positioned at the start of `tokens`.
    pub fn new(tokens: impl Into<Rc<[String]>>) -> Self {
        Self {
            tokens: tokens.into(),
            pos: 0,
        }
    }

    /// True when there are no more tokens to read.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// The number of tokens remaining.
    pub fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.pos)
    }

    /// The token at the current position.
    ///
    /// # Errors
    /// Returns [`ParseError::EndOfInput`] once the cursor is exhausted.
    pub fn item(&self) -> Result<&str, ParseError> {
        self.tokens
            .get(self.pos)
            .map(String::as_str)
            .ok_or(ParseError::EndOfInput)
    }

    /// A cursor advanced by exactly one token.
    ///
    /// # Errors
    /// Returns [`ParseError::EndOfInput`] if already exhausted.
    pub fn rest(&self) -> Result<Cursor, ParseError> {
        self.advance(1)
    }

    /// A cursor advanced by `step` tokens.
    ///
    /// # Errors
    /// Returns [`ParseError::EndOfInput`] if fewer than `step` tokens remain.
    pub fn advance(&self, step: usize) -> Result<Cursor, ParseError> {
        if self.pos + step > self.tokens.len() {
            return Err(ParseError::EndOfInput);
        }
        Ok(Cursor {
            tokens: Rc::clone(&self.tokens),
            pos: self.pos + step,
        })
    }

    /// Peek at the next `n` tokens without advancing, failing if fewer remain.
    ///
    /// # Errors
    /// Returns [`ParseError::EndOfInput`] if fewer than `n` tokens remain.
    pub fn peek_n(&self, n: usize) -> Result<&[String], ParseError> {
        if self.pos + n > self.tokens.len() {
            return Err(ParseError::EndOfInput);
        }
        Ok(&self.tokens[self.pos..self.pos + n])
    }

    /// Lazily enumerate `(token, rest-cursor)` pairs until the stream is
    /// exhausted. Equivalent to the original `as_steps` generator.
    pub fn steps(&self) -> CursorSteps {
        CursorSteps {
            current: Some(self.clone()),
        }
    }

    /// All remaining tokens as a plain slice, for diagnostics and joining.
    pub fn remaining_tokens(&self) -> &[String] {
        &self.tokens[self.pos..]
    }
}

/// Iterator over `(token, rest)` pairs produced by [`Cursor::steps`].
pub struct CursorSteps {
    current: Option<Cursor>,
}

impl Iterator for CursorSteps {
    type Item = (String, Cursor);

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.current.take()?;
        if cursor.is_empty() {
            return None;
        }
        let item = cursor.item().ok()?.to_string();
        let rest = cursor.rest().ok()?;
        self.current = Some(rest.clone());
        Some((item, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn cursor(tokens: &[&str]) -> Cursor {
        let owned: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
        Cursor::new(owned)
    }

    #[test]
    fn empty_cursor_has_no_item() {
        let c = cursor(&[]);
        check!(c.is_empty());
        check!(c.item().is_err());
    }

    #[test]
    fn rest_advances_by_one() {
        let c = cursor(&["A", "B", "C"]);
        let r = c.rest().unwrap();
        check!(r.item().unwrap() == "B");
        check!(c.item().unwrap() == "A");
    }

    #[rstest]
    #[case(0, "A")]
    #[case(1, "B")]
    #[case(2, "C")]
    fn advance_lands_on_expected_token(#[case] n: usize, #[case] expected: &str) {
        let c = cursor(&["A", "B", "C"]);
        let advanced = c.advance(n).unwrap();
        check!(advanced.item().unwrap() == expected);
    }

    #[test]
    fn advance_past_end_fails() {
        let c = cursor(&["A"]);
        check!(c.advance(5).is_err());
    }

    #[test]
    fn peek_n_does_not_move_cursor() {
        let c = cursor(&["A", "B", "C"]);
        let peeked = c.peek_n(2).unwrap();
        check!(peeked == ["A".to_string(), "B".to_string()]);
        check!(c.item().unwrap() == "A");
    }

    #[test]
    fn cloning_shares_backing_storage() {
        let c = cursor(&["A", "B"]);
        let d = c.clone();
        check!(d.remaining_tokens() == c.remaining_tokens());
    }
}
