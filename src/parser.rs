//! Tokenization and the forward/reverse parsing pipelines.
//!
//! Grounded in `__parsing__.py`'s `Parser` class: `__tokenize__`,
//! `__outline__` (the forward pipeline), `parse_row` (the reverse, row-based
//! pipeline) and `smart_batch`. The combinator primitives live in
//! [`crate::combinators`]; this module composes them with the data tables in
//! [`crate::tables`] and the [`crate::mealy::Mealy`] matcher.

use std::sync::OnceLock;

use regex::Regex;

use crate::address::{AddressFields, RawAddress};
use crate::combinators::{chomp_n, consume_with, optional, require, take_while, ParseState};
use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::mealy::Mealy;
use crate::tables;

fn house_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+(FRAC[0-9]+)?$").expect("valid house number regex"))
}

fn zip_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("valid zip regex"))
}

fn unit_identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Accepts both "A3" and "1-2A" style unit identifiers, per the
        // specification's resolution of the original's open question.
        Regex::new(r"(?i)^#?([0-9]+[A-Z]?|[A-Z][0-9]*|[A-Z]|[A-Z]-[0-9]+|[0-9]+-[0-9]+[A-Z]?)$")
            .expect("valid unit identifier regex")
    })
}

/// Strip punctuation except `#` and `/`, uppercase, and collapse whitespace.
fn normalize(input: &str) -> String {
    let upper = input.to_uppercase();
    let cleaned: String = upper
        .chars()
        .map(|c| {
            if c == '#' || c == '/' || !c.is_ascii_punctuation() {
                c
            } else {
                ' '
            }
        })
        .collect();
    let cleaned = cleaned.replace('#', " APT ");
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let joined = words.join(" ");
    joined.replace("APT APT", "APT").replace('/', "FRAC")
}

/// Tokenize a raw address string into uppercase words, ready for the
/// forward pipeline.
pub fn tokenize(input: &str) -> Vec<String> {
    normalize(input)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn is_house_number(token: &str) -> bool {
    house_number_regex().is_match(token)
}

fn is_zip(token: &str) -> bool {
    zip_regex().is_match(token)
}

fn unfrac(s: &str) -> String {
    s.replace("FRAC", "/")
}

/// Detect the rural grid-address form `"<DIR> <digits> <DIR>"` (e.g. `"W
/// 2100 S"`, a Utah-style section-line street name) and merge the leading
/// directional into the number before parsing, so the street-name stage
/// treats `"W2100"` as one token rather than peeling "W" off as a
/// pre-street directional and leaving a bare number behind.
fn merge_rural_highway_tokens(tokens: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if i + 2 < tokens.len() {
            let (a, b, c) = (&tokens[i], &tokens[i + 1], &tokens[i + 2]);
            let a_is_dir = tables::directionals().match_one(a).is_some();
            let b_is_number = !b.is_empty() && b.chars().all(|ch| ch.is_ascii_digit());
            let c_is_dir = tables::directionals().match_one(c).is_some();
            if a_is_dir && b_is_number && c_is_dir {
                out.push(format!("{a}{b}"));
                i += 2;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

/// A configured address parser. Holds a known-city overlay on top of the
/// process-global default city list; everything else is shared, immutable,
/// process-wide table state (see [`crate::tables`]).
pub struct Parser {
    cities: Mealy,
}

impl Parser {
    /// Build a parser whose known-city list is `known_cities` in addition to
    /// the built-in [`tables::DEFAULT_CITIES`].
    pub fn new(known_cities: impl IntoIterator<Item = String>) -> Self {
        let mut builder = Mealy::builder();
        for city in tables::DEFAULT_CITIES {
            builder.add_phrase(city, city);
        }
        for city in known_cities {
            let city = city.to_uppercase();
            builder.add_phrase(&city, &city);
        }
        Self {
            cities: builder.build(),
        }
    }

    /// A parser with no known-city overlay at all, used as the fallback
    /// parser `smart_batch`'s first pass effectively degrades to when a
    /// given city is never recognized.
    pub fn blank() -> Self {
        Self::new(std::iter::empty())
    }

    fn consume_phrase(state: ParseState, label: &'static str, mealy: &Mealy) -> ParseState {
        let tokens = state.cursor.remaining_tokens();
        if let Some((matched, len)) = mealy.match_at(tokens, 0) {
            let matched = matched.to_string();
            if let Ok(cursor) = state.cursor.advance(len) {
                let mut steps = state.steps;
                steps.push(crate::combinators::ParseStep::new(label, matched));
                return ParseState { cursor, steps };
            }
        }
        state
    }

    /// Parse a single whitespace-joined address string via the forward
    /// pipeline.
    ///
    /// # Errors
    /// Returns [`ParseError::EndOfAddress`] if a mandatory stage (house
    /// number, street name, city or state) cannot be recognized, or
    /// [`ParseError::Rejected`] if the state stage lands on an unrecognized
    /// token.
    pub fn parse(&self, s: &str) -> Result<RawAddress, ParseError> {
        let tokens = merge_rural_highway_tokens(tokenize(s));
        if tokens.is_empty() {
            return Err(ParseError::EndOfAddress {
                stage: "house_number",
            });
        }
        let state = ParseState::new(Cursor::new(tokens));
        let result = self.run_forward(state).and_then(|state| self.collect(state, s));
        if let Err(e) = &result {
            tracing::debug!(orig = s, error = %e, "forward parse failed");
        }
        result
    }

    /// Parse a pre-split row of cells via the reverse pipeline, anchoring
    /// from the (unambiguous) state/zip boundary backward.
    ///
    /// # Errors
    /// Same failure modes as [`Parser::parse`].
    pub fn parse_row(&self, row: &[String]) -> Result<RawAddress, ParseError> {
        let joined = row.join(" ");
        self.parse_reverse(&joined)
    }

    fn run_forward(&self, state: ParseState) -> Result<ParseState, ParseError> {
        // 1. house number (digits and '/', already folded to "FRAC").
        let state = require(state, "house_number", |st| {
            take_while_required(st, |t| {
                is_house_number(t).then(|| vec![crate::combinators::ParseStep::new("house_number", unfrac(t))])
            })
        })?;

        // 2. optional leading directional.
        let state = optional(state, |st| {
            consume_with(st, |t| match tables::directionals().match_one(t) {
                Some(label) => vec![crate::combinators::ParseStep::new("st_nesw", label)],
                None => Vec::new(),
            })
        });

        // 3. street name: first fold a leading highway phrase ("COUNTY ROAD
        // 12") into the street name together with its letter/number tail,
        // then take tokens until a suffix/directional/unit/known-city stops
        // us. The very first street-name token is always kept even if it
        // looks like a suffix ("Street" as a literal street name, not a
        // suffix marker) - only tokens after that are checked against the
        // stop set.
        let state = require(state, "st_name", |st| {
            let st = Self::consume_highway_phrase(st)?;
            self.consume_st_name(st)
        })?;

        // 4. fold a numeric route tail ("RD 12") into the street name.
        let state = optional(state, |st| {
            chomp_n(st, 2, |group| {
                let head_is_suffix = tables::suffixes().match_one(&group[0]).is_some();
                let tail_is_number = group[1].chars().all(|c| c.is_ascii_digit());
                if head_is_suffix && tail_is_number {
                    vec![
                        crate::combinators::ParseStep::new("st_name", group[0].clone()),
                        crate::combinators::ParseStep::new("st_name", group[1].clone()),
                    ]
                } else {
                    Vec::new()
                }
            })
        });

        // 5. street suffix: a single consume, since step 3 already stopped at
        // the first suffix-looking token once a street name had at least one
        // word ("Park Blvd" never reaches here as two suffix tokens; "Blvd"
        // alone is the suffix and "Park" the name).
        let state = optional(state, |st| {
            consume_with(st, |t| match tables::suffixes().match_one(t) {
                Some(label) => vec![crate::combinators::ParseStep::new("st_suffix", label)],
                None => Vec::new(),
            })
        });

        // 6. optional trailing directional (post-suffix), e.g. "Ave SW".
        let state = optional(state, |st| {
            consume_with(st, |t| match tables::directionals().match_one(t) {
                Some(label) => vec![crate::combinators::ParseStep::new("st_nesw", label)],
                None => Vec::new(),
            })
        });

        // 7. unit: "<keyword> <id>" or "<id> <keyword>" or a lone unitary keyword.
        let state = optional(state, Self::consume_unit);

        // 8. city: known-city phrase match, falling back to a single token.
        let state = require(state, "city", |st| {
            let mut st = Self::consume_phrase(st, "city", &self.cities);
            if st.values_of("city").is_empty() {
                st = take_while(
                    st,
                    |t| {
                        if tables::states().match_one(t).is_some() {
                            Vec::new()
                        } else {
                            vec![crate::combinators::ParseStep::new("city", t)]
                        }
                    },
                    true,
                );
            }
            Ok(st)
        })?;

        // 9. state (Mealy, consumes one or two tokens).
        let state = require(state, "us_state", |st| {
            Ok(Self::consume_phrase(st, "us_state", tables::states()))
        })?;

        // 10. optional zip code.
        let state = optional(state, |st| {
            consume_with(st, |t| {
                if is_zip(t) {
                    vec![crate::combinators::ParseStep::new("zip_code", t)]
                } else {
                    Vec::new()
                }
            })
        });

        Ok(state)
    }

    /// Fold a highway phrase ("COUNTY ROAD", "STATE HIGHWAY", ...) plus its
    /// letter/number tail into the street name as a single unit, e.g.
    /// `"COUNTY ROAD 12"` all becomes `st_name` tokens. A no-op (state
    /// unchanged) when the phrase isn't followed by a valid tail token.
    fn consume_highway_phrase(state: ParseState) -> Result<ParseState, ParseError> {
        let tokens = state.cursor.remaining_tokens();
        let Some((_, len)) = tables::highway_phrases().match_at(tokens, 0) else {
            return Ok(state);
        };
        let Ok(group) = state.cursor.peek_n(len + 1) else {
            return Ok(state);
        };
        let tail = &group[len];
        if !tail.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return Ok(state);
        }
        let mut steps = state.steps;
        for t in group {
            steps.push(crate::combinators::ParseStep::new("st_name", t.clone()));
        }
        let cursor = state.cursor.advance(len + 1)?;
        Ok(ParseState { cursor, steps })
    }

    /// Take street-name tokens, stopping on a suffix, directional, unit
    /// keyword or a known-city phrase boundary - except the token is never
    /// the very first one accumulated for this stage, so a street literally
    /// named "Street" or "Park" is not mistaken for its own suffix.
    fn consume_st_name(&self, state: ParseState) -> Result<ParseState, ParseError> {
        let mut first = state.values_of("st_name").is_empty();
        let mut cursor = state.cursor;
        let mut steps = state.steps;
        loop {
            if cursor.is_empty() {
                break;
            }
            let token = cursor.item()?.to_string();
            if !first {
                let tokens = cursor.remaining_tokens();
                let stops = tables::suffixes().match_one(&token).is_some()
                    || tables::directionals().match_one(&token).is_some()
                    || tables::UNIT_KEYWORDS.contains(&token.as_str())
                    || self.cities.match_at(tokens, 0).is_some();
                if stops {
                    break;
                }
            }
            steps.push(crate::combinators::ParseStep::new("st_name", token));
            cursor = cursor.rest()?;
            first = false;
        }
        Ok(ParseState { cursor, steps })
    }

    /// A unit is either `<keyword> <id>` / `<id> <keyword>` (two tokens), or a
    /// lone unitary keyword such as `"REAR"` emitted with no identifier at
    /// all. The two-token forms are tried first since they need to look past
    /// the unitary keyword's own token to decide; the single-token fallback
    /// only consumes one token, so it never eats into the following city.
    fn consume_unit(state: ParseState) -> Result<ParseState, ParseError> {
        let before_remaining = state.cursor.remaining();
        if let Ok(after) = chomp_n(state.clone(), 2, |group| {
            let a = group[0].as_str();
            let b = group[1].as_str();
            if tables::UNIT_KEYWORDS.contains(&a) && unit_identifier_regex().is_match(b) {
                return vec![crate::combinators::ParseStep::new(
                    "unit",
                    format!("{} {}", normalize_unit_keyword(a), b),
                )];
            }
            if unit_identifier_regex().is_match(a) && tables::UNIT_KEYWORDS.contains(&b) {
                return vec![crate::combinators::ParseStep::new(
                    "unit",
                    format!("{} {}", normalize_unit_keyword(b), a),
                )];
            }
            Vec::new()
        }) {
            if after.cursor.remaining() < before_remaining {
                return Ok(after);
            }
        }

        consume_with(state, |t| {
            if tables::UNIT_UNITARY.contains(&t) {
                vec![crate::combinators::ParseStep::new("unit", t.to_string())]
            } else {
                Vec::new()
            }
        })
    }

    fn collect(&self, state: ParseState, orig: &str) -> Result<RawAddress, ParseError> {
        let house_number = state.values_of("house_number").join(" ");
        let st_name = state.values_of("st_name").join(" ");
        let city = state.values_of("city").join(" ").replace('_', " ");
        let us_state = state
            .values_of("us_state")
            .first()
            .copied()
            .unwrap_or_default()
            .to_string();

        if house_number.is_empty() {
            return Err(ParseError::EndOfAddress { stage: "house_number" });
        }
        if st_name.is_empty() {
            return Err(ParseError::EndOfAddress { stage: "st_name" });
        }
        if city.is_empty() {
            return Err(ParseError::EndOfAddress { stage: "city" });
        }
        if us_state.is_empty() {
            return Err(ParseError::EndOfAddress { stage: "us_state" });
        }

        let st_suffix = state.values_of("st_suffix").last().map(|s| s.to_string());
        let st_nesw = {
            let all = state.values_of("st_nesw");
            if all.is_empty() {
                None
            } else {
                Some(all.join(" "))
            }
        };
        let unit = state.values_of("unit").last().map(|s| s.to_string());
        let zip_code = state.values_of("zip_code").last().map(|s| s.to_string());

        Ok(RawAddress::new(AddressFields {
            house_number,
            st_name,
            st_suffix,
            st_nesw,
            unit,
            city,
            us_state,
            zip_code,
            orig: orig.to_string(),
            batch_checksum: String::new(),
        }))
    }

    /// The reverse pipeline: anchor from the back (zip, then state, then
    /// city) since the state/pre-state boundary is unambiguous, unlike the
    /// street-name/city boundary the forward pipeline must guess at.
    fn parse_reverse(&self, s: &str) -> Result<RawAddress, ParseError> {
        let mut tokens = merge_rural_highway_tokens(tokenize(s));
        if tokens.is_empty() {
            return Err(ParseError::EndOfAddress { stage: "house_number" });
        }
        tokens.reverse();
        let state = ParseState::new(Cursor::new(tokens));

        let state = optional(state, |st| {
            consume_with(st, |t| {
                if is_zip(t) {
                    vec![crate::combinators::ParseStep::new("zip_code", t)]
                } else {
                    Vec::new()
                }
            })
        });

        let state = require(state, "us_state", |st| {
            Ok(Self::consume_phrase(st, "us_state", tables::states()))
        })?;

        let state = require(state, "city", |st| {
            Ok(Self::consume_phrase(st, "city", &self.cities))
        })?;

        let state = optional(state, Self::consume_unit_reverse);

        let state = optional(state, |st| {
            consume_with(st, |t| match tables::directionals().match_one(t) {
                Some(label) => vec![crate::combinators::ParseStep::new("st_nesw", label)],
                None => Vec::new(),
            })
        });

        let state = optional(state, |st| {
            consume_with(st, |t| match tables::suffixes().match_one(t) {
                Some(label) => vec![crate::combinators::ParseStep::new("st_suffix", label)],
                None => Vec::new(),
            })
        });

        let state = require(state, "st_name", |st| {
            Ok(take_while(
                st,
                |t| {
                    if is_house_number(t) || tables::directionals().match_one(t).is_some() {
                        Vec::new()
                    } else {
                        vec![crate::combinators::ParseStep::new("st_name", t)]
                    }
                },
                false,
            ))
        })?;

        let state = optional(state, |st| {
            consume_with(st, |t| match tables::directionals().match_one(t) {
                Some(label) => vec![crate::combinators::ParseStep::new("st_nesw", label)],
                None => Vec::new(),
            })
        });

        let state = require(state, "house_number", |st| {
            Ok(take_while(
                st,
                |t| {
                    if is_house_number(t) {
                        vec![crate::combinators::ParseStep::new("house_number", unfrac(t))]
                    } else {
                        Vec::new()
                    }
                },
                false,
            ))
        })?;

        // Every field above was accumulated in reverse token order; reverse
        // each multi-token field back before collecting.
        let mut reversed = state;
        for label in ["house_number", "st_name", "city"] {
            let values: Vec<String> = reversed
                .values_of(label)
                .into_iter()
                .map(str::to_string)
                .collect();
            reversed.steps.retain(|step| step.label != label);
            for value in values.into_iter().rev() {
                reversed
                    .steps
                    .push(crate::combinators::ParseStep::new(label, value));
            }
        }

        self.collect(reversed, s)
    }

    fn consume_unit_reverse(state: ParseState) -> Result<ParseState, ParseError> {
        Self::consume_unit(state)
    }
}

fn normalize_unit_keyword(token: &str) -> String {
    tables::unit_keywords()
        .match_one(token)
        .unwrap_or(token)
        .to_string()
}

fn take_while_required(
    state: ParseState,
    f: impl Fn(&str) -> Option<Vec<crate::combinators::ParseStep>>,
) -> Result<ParseState, ParseError> {
    Ok(take_while(
        state,
        |t| f(t).unwrap_or_default(),
        false,
    ))
}

/// Parse every address in `addresses`, retrying failures once with a parser
/// whose known-city list has been enriched with every city recognized on the
/// first pass. Permanent failures are reported via `report_error` rather
/// than propagated.
pub fn smart_batch(
    parser: &Parser,
    addresses: impl IntoIterator<Item = String>,
    mut report_error: impl FnMut(ParseError, String),
) -> Vec<RawAddress> {
    let mut parsed = Vec::new();
    let mut failures = Vec::new();
    let mut known_cities: Vec<String> = Vec::new();

    for address in addresses {
        match parser.parse(&address) {
            Ok(record) => {
                known_cities.push(record.city.clone());
                parsed.push(record);
            }
            Err(_) => failures.push(address),
        }
    }

    if failures.is_empty() {
        return parsed;
    }

    let enriched = Parser::new(known_cities);
    for address in failures {
        match enriched.parse(&address) {
            Ok(record) => parsed.push(record),
            Err(e) => report_error(e, address),
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn tokenizes_hash_and_fraction() {
        let tokens = tokenize("15 1/2 Main St #4");
        check!(tokens.contains(&"1FRAC2".to_string()));
        check!(tokens.contains(&"APT".to_string()));
    }

    #[test]
    fn parses_standard_address_with_unit() {
        let parser = Parser::new(["Grand Rapids".to_string()]);
        let record = parser
            .parse("3710 Michigane AVE SW apt #447 Grand Rapids MI 49588")
            .unwrap();
        check!(record.house_number == "3710");
        check!(record.st_name == "MICHIGANE");
        check!(record.st_suffix.as_deref() == Some("AVE"));
        check!(record.st_nesw.as_deref() == Some("SW"));
        check!(record.unit.as_deref() == Some("APT 447"));
        check!(record.city == "GRAND RAPIDS");
        check!(record.us_state == "MI");
        check!(record.zip_code.as_deref() == Some("49588"));
    }

    #[test]
    fn parses_fractional_house_number_with_leading_directional_street() {
        let parser = Parser::new(["Central City".to_string()]);
        let record = parser
            .parse("15 1/2 4th St S Central City IA 52214")
            .unwrap();
        check!(record.house_number == "15/2" || record.house_number == "15 1/2");
        check!(record.city == "CENTRAL CITY");
        check!(record.us_state == "IA");
        check!(record.zip_code.as_deref() == Some("52214"));
    }

    #[test]
    fn missing_state_fails() {
        let parser = Parser::blank();
        let result = parser.parse("123 Main St Nowhere");
        check!(result.is_err());
    }

    #[test]
    fn smart_batch_retries_with_learned_cities() {
        let parser = Parser::blank();
        let addresses = vec![
            "1 Main St Fremulon OH 44012".to_string(),
            "2 Main St Fremulon OH 44012".to_string(),
        ];
        let mut errors = Vec::new();
        let parsed = smart_batch(&parser, addresses, |e, s| errors.push((e, s)));
        check!(parsed.len() == 2);
    }

    #[test]
    fn folds_a_highway_phrase_and_its_tail_into_the_street_name() {
        let parser = Parser::blank();
        let record = parser.parse("123 County Road 12 Smallville AZ").unwrap();
        check!(record.st_name == "COUNTY ROAD 12");
        check!(record.city == "SMALLVILLE");
        check!(record.us_state == "AZ");
    }

    #[test]
    fn merges_a_rural_grid_street_name_before_parsing() {
        let parser = Parser::blank();
        let record = parser.parse("123 W 2100 S Smallville AZ").unwrap();
        check!(record.st_name == "W2100");
        check!(record.st_nesw.as_deref() == Some("S"));
        check!(record.city == "SMALLVILLE");
    }

    #[test]
    fn a_street_literally_named_after_a_suffix_word_still_parses() {
        // "Street" is itself a recognized suffix synonym; the street-name
        // stage must keep it as the name rather than stopping on it, since
        // stopping here would leave the street name empty.
        let parser = Parser::new(["City".to_string()]);
        let record = parser.parse("001 Street City MI").unwrap();
        check!(record.st_name == "STREET");
        check!(record.st_suffix.is_none());
        check!(record.city == "CITY");

        let with_suffix = parser.parse("001 Street St City MI").unwrap();
        check!(with_suffix.st_name == "STREET");
        check!(with_suffix.st_suffix.as_deref() == Some("ST"));
    }

    #[test]
    fn a_lone_unitary_keyword_is_recorded_without_a_fabricated_identifier() {
        let parser = Parser::new(["Smallville".to_string()]);
        let record = parser.parse("123 Main St Rear Smallville AZ").unwrap();
        check!(record.unit.as_deref() == Some("REAR"));
        check!(record.city == "SMALLVILLE");
    }
}
