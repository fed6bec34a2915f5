//! Apply-style combinator engine over an immutable [`Cursor`].
//!
//! Every operation is a pure function of a `(cursor, accumulated steps)`
//! pair. Mandatory stages propagate [`ParseError`]; optional stages are
//! wrapped with [`optional`], which swallows an `Err` and returns the
//! pre-operation state unchanged, mirroring the exception-tag filtering the
//! original `arrow_parse` closures perform per `AddressComponent`.

use crate::cursor::Cursor;
use crate::error::ParseError;

/// One labeled value recognized from a single token or a chomped group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStep {
    pub label: &'static str,
    pub value: String,
}

impl ParseStep {
    pub fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// The threaded `(cursor, results)` pair every combinator operates on.
#[derive(Debug, Clone)]
pub struct ParseState {
    pub cursor: Cursor,
    pub steps: Vec<ParseStep>,
}

impl ParseState {
    pub fn new(cursor: Cursor) -> Self {
        Self {
            cursor,
            steps: Vec::new(),
        }
    }

    /// Values recorded so far under `label`, in recognition order.
    pub fn values_of(&self, label: &str) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.label == label)
            .map(|s| s.value.as_str())
            .collect()
    }
}

/// Recognize the current token with `f`; on a non-empty result, append and
/// advance one token. On an empty result, the state is returned unchanged.
///
/// # Errors
/// Propagates [`ParseError::EndOfInput`] if the cursor is already exhausted.
pub fn consume_with(
    state: ParseState,
    f: impl Fn(&str) -> Vec<ParseStep>,
) -> Result<ParseState, ParseError> {
    if state.cursor.is_empty() {
        return Err(ParseError::EndOfInput);
    }
    let token = state.cursor.item()?.to_string();
    let results = f(&token);
    if results.is_empty() {
        return Ok(state);
    }
    let cursor = state.cursor.rest()?;
    let mut steps = state.steps;
    steps.extend(results);
    Ok(ParseState { cursor, steps })
}

/// Repeat [`consume_with`] until `f` yields nothing or the input is
/// exhausted. Never fails: an exhausted cursor simply stops the loop.
pub fn take_while(
    mut state: ParseState,
    f: impl Fn(&str) -> Vec<ParseStep>,
    single: bool,
) -> ParseState {
    loop {
        if state.cursor.is_empty() {
            break;
        }
        let Ok(token) = state.cursor.item() else {
            break;
        };
        let results = f(token);
        if results.is_empty() {
            break;
        }
        let Ok(rest) = state.cursor.rest() else {
            break;
        };
        state.steps.extend(results);
        state.cursor = rest;
        if single {
            break;
        }
    }
    state
}

/// Read the next `n` tokens as a group and apply `g`. An empty result leaves
/// the state unchanged and consumes nothing, matching the unit/highway
/// chomps, which use an empty result to mean "pattern did not apply here".
///
/// # Errors
/// Propagates [`ParseError::EndOfInput`] if fewer than `n` tokens remain.
pub fn chomp_n(
    state: ParseState,
    n: usize,
    g: impl Fn(&[String]) -> Vec<ParseStep>,
) -> Result<ParseState, ParseError> {
    let group = state.cursor.peek_n(n)?;
    let results = g(group);
    if results.is_empty() {
        return Ok(state);
    }
    let cursor = state.cursor.advance(n)?;
    let mut steps = state.steps;
    steps.extend(results);
    Ok(ParseState { cursor, steps })
}

/// Try each recognizer against the current token in order; the first to
/// yield a non-empty result wins and advances one token. If all fail, or the
/// cursor is exhausted, the state is returned unchanged.
pub fn or_(state: ParseState, fns: &[&dyn Fn(&str) -> Vec<ParseStep>]) -> ParseState {
    if state.cursor.is_empty() {
        return state;
    }
    let Ok(token) = state.cursor.item() else {
        return state;
    };
    let token = token.to_string();
    for f in fns {
        let results = f(&token);
        if !results.is_empty() {
            if let Ok(rest) = state.cursor.rest() {
                let mut steps = state.steps;
                steps.extend(results);
                return ParseState { cursor: rest, steps };
            }
        }
    }
    state
}

/// Run `op`, swallowing any error and returning the pre-operation state
/// unchanged. This is the Rust rendition of `AddressComponent(optional=True)`.
pub fn optional(
    state: ParseState,
    op: impl FnOnce(ParseState) -> Result<ParseState, ParseError>,
) -> ParseState {
    let before = state.clone();
    op(state).unwrap_or(before)
}

/// Require that `op` advanced the cursor (i.e. produced at least one new
/// step); otherwise raise a stage-specific error. Used for hard components
/// that must not silently disappear.
///
/// # Errors
/// Propagates whatever error `op` raised, or [`ParseError::EndOfAddress`] if
/// `op` succeeded without recognizing anything.
pub fn require(
    state: ParseState,
    stage: &'static str,
    op: impl FnOnce(ParseState) -> Result<ParseState, ParseError>,
) -> Result<ParseState, ParseError> {
    let before_len = state.steps.len();
    let after = op(state)?;
    if after.steps.len() == before_len {
        return Err(ParseError::EndOfAddress { stage });
    }
    Ok(after)
}

/// Sequence a list of mandatory operations, short-circuiting on the first
/// error.
///
/// # Errors
/// Propagates the first error raised by any stage.
pub fn reduce(
    state: ParseState,
    ops: &[&dyn Fn(ParseState) -> Result<ParseState, ParseError>],
) -> Result<ParseState, ParseError> {
    ops.iter().try_fold(state, |acc, op| op(acc))
}
