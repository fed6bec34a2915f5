//! Centralized error handling with typed error enums.
//!
//! Mirrors the shape the teacher crate uses for its own tool errors: small
//! `thiserror`-derived enums grouped by concern, each with an optional
//! `help()` method for the cases actionable enough to deserve remediation
//! text, plus an `anyhow::Result` alias for call sites that only need to
//! propagate with context.
//!
//! # Error Hierarchy
//!
//! ```text
//! ParseError   - raised while tokenizing/labeling a single address
//! HammerError  - raised while querying a canonicalizer batch
//! ```

use thiserror::Error;

/// A specialized Result type for address-hammer operations.
pub type Result<T> = anyhow::Result<T>;

/// Errors raised while parsing a single address into labeled components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The cursor was advanced past the end of the token stream.
    #[error("reached end of input while parsing")]
    EndOfInput,

    /// The cursor ran out of tokens before a mandatory stage could complete.
    #[error("reached end of address before '{stage}' could be recognized")]
    EndOfAddress { stage: &'static str },

    /// A mandatory stage rejected the current token.
    #[error("could not recognize '{token}' as {stage}")]
    Rejected { stage: &'static str, token: String },

    /// A structurally complete record failed a post-construction semantic
    /// check (e.g. a directional field with more than two tokens).
    #[error("invalid address '{orig}': {reason}")]
    InvalidAddress { orig: String, reason: String },
}

impl ParseError {
    /// Get optional help text for this error.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::EndOfInput | Self::EndOfAddress { .. } => {
                Some("The input likely has fewer tokens than a complete address requires.")
            }
            Self::Rejected { .. } => Some(
                "Check that house number, street name, city, state and zip appear in that order.",
            ),
            Self::InvalidAddress { .. } => {
                Some("Directional and unit fields must resolve to at most two tokens.")
            }
        }
    }
}

/// Errors raised while querying a canonicalizer ("hammer") batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HammerError {
    /// The queried record belongs to a different canonicalization batch.
    #[error("checksum mismatch: batch is '{expected}', record is '{found}'")]
    ChecksumMismatch { expected: String, found: String },

    /// No canonical record exists for the queried hard key.
    #[error("no canonical address found for this record")]
    KeyNotFound,

    /// A repair level outside `0..=10` was supplied.
    #[error("invalid repair level {level}: must be between 0 and 10")]
    InvalidRepairLevel { level: u8 },
}

impl HammerError {
    /// Get optional help text for this error.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::ChecksumMismatch { .. } => Some(
                "Records must come from the batch that produced this Hammer, \
                 or be marked with the checksum-ignore sentinel via `Address::ignore_checksum`.",
            ),
            Self::KeyNotFound => Some(
                "The record's house number, street name, city and state combination \
                 was never observed in this batch.",
            ),
            Self::InvalidRepairLevel { .. } => {
                Some("Repair levels range from 0 (no repair) to 10 (maximally permissive).")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn end_of_address_reports_stage() {
        let err = ParseError::EndOfAddress { stage: "city" };
        check!(err.to_string().contains("city"));
        check!(err.help().is_some());
    }

    #[test]
    fn rejected_reports_token_and_stage() {
        let err = ParseError::Rejected {
            stage: "us_state",
            token: "ZZ".to_string(),
        };
        let msg = err.to_string();
        check!(msg.contains("ZZ"));
        check!(msg.contains("us_state"));
    }

    #[test]
    fn checksum_mismatch_help_mentions_ignore_sentinel() {
        let err = HammerError::ChecksumMismatch {
            expected: "a".to_string(),
            found: "b".to_string(),
        };
        check!(err.help().unwrap().contains("ignore"));
    }

    #[test]
    fn invalid_repair_level_displays_value() {
        let err = HammerError::InvalidRepairLevel { level: 42 };
        check!(err.to_string().contains("42"));
    }
}
