//! Fixed data tables: US state names, street suffixes, directionals, unit
//! types and highway phrases.
//!
//! These are baked in as static data rather than loaded from disk (an
//! explicit non-goal per the specification's scope). Each table is compiled
//! once into a process-global [`OnceLock`] and shared by every [`Mealy`]
//! matcher built from it, matching the "data tables loaded once" design note:
//! no `Parser` rebuilds these from scratch.
//!
//! [`Mealy`]: crate::mealy::Mealy

use std::sync::OnceLock;

use crate::mealy::Mealy;

/// `(canonical abbreviation, phrases that mean it)` for the 50 states, DC
/// and the territories the original table covers.
const STATE_TABLE: &[(&str, &[&str])] = &[
    ("AL", &["ALABAMA"]),
    ("AK", &["ALASKA"]),
    ("AZ", &["ARIZONA"]),
    ("AR", &["ARKANSAS"]),
    ("CA", &["CALIFORNIA"]),
    ("CO", &["COLORADO"]),
    ("CT", &["CONNECTICUT"]),
    ("DE", &["DELAWARE"]),
    ("DC", &["DISTRICT OF COLUMBIA"]),
    ("FL", &["FLORIDA"]),
    ("GA", &["GEORGIA"]),
    ("HI", &["HAWAII"]),
    ("ID", &["IDAHO"]),
    ("IL", &["ILLINOIS"]),
    ("IN", &["INDIANA"]),
    ("IA", &["IOWA"]),
    ("KS", &["KANSAS"]),
    ("KY", &["KENTUCKY"]),
    ("LA", &["LOUISIANA"]),
    ("ME", &["MAINE"]),
    ("MD", &["MARYLAND"]),
    ("MA", &["MASSACHUSETTS"]),
    ("MI", &["MICHIGAN"]),
    ("MN", &["MINNESOTA"]),
    ("MS", &["MISSISSIPPI"]),
    ("MO", &["MISSOURI"]),
    ("MT", &["MONTANA"]),
    ("NE", &["NEBRASKA"]),
    ("NV", &["NEVADA"]),
    ("NH", &["NEW HAMPSHIRE"]),
    ("NJ", &["NEW JERSEY"]),
    ("NM", &["NEW MEXICO"]),
    ("NY", &["NEW YORK"]),
    ("NC", &["NORTH CAROLINA"]),
    ("ND", &["NORTH DAKOTA"]),
    ("OH", &["OHIO"]),
    ("OK", &["OKLAHOMA"]),
    ("OR", &["OREGON"]),
    ("PA", &["PENNSYLVANIA"]),
    ("PR", &["PUERTO RICO"]),
    ("RI", &["RHODE ISLAND"]),
    ("SC", &["SOUTH CAROLINA"]),
    ("SD", &["SOUTH DAKOTA"]),
    ("TN", &["TENNESSEE"]),
    ("TX", &["TEXAS"]),
    ("UT", &["UTAH"]),
    ("VT", &["VERMONT"]),
    ("VA", &["VIRGINIA"]),
    ("WA", &["WASHINGTON"]),
    ("WV", &["WEST VIRGINIA"]),
    ("WI", &["WISCONSIN"]),
    ("WY", &["WYOMING"]),
];

/// Every state's own abbreviation is also a recognized one-word phrase, and
/// is excluded from the street-suffix table below (a two-letter code like
/// "KY" must never be eaten as a suffix).
pub fn state_abbreviations() -> impl Iterator<Item = &'static str> {
    STATE_TABLE.iter().map(|(abbr, _)| *abbr)
}

/// USPS-style street suffix canonical forms with common synonyms. Two-letter
/// state codes are deliberately absent (see `state_abbreviations`).
const SUFFIX_TABLE: &[(&str, &[&str])] = &[
    ("AVE", &["AVENUE", "AV", "AVEN", "AVENU", "AVN", "AVNUE"]),
    ("BLVD", &["BOULEVARD", "BOUL", "BOULV"]),
    ("CIR", &["CIRCLE", "CIRC", "CIRCL", "CRCLE"]),
    ("CRT", &["COURT"]),
    ("DR", &["DRIVE", "DRV", "DRIV"]),
    ("EXPY", &["EXPRESSWAY", "EXPW", "EXPR"]),
    ("HWY", &["HIGHWAY", "HIWAY", "HIWY", "HWAY"]),
    ("LN", &["LANE", "LANES"]),
    ("LOOP", &["LOOP"]),
    ("PKWY", &["PARKWAY", "PARKWY", "PKWAY", "PKY"]),
    ("PL", &["PLACE"]),
    ("PLZ", &["PLAZA", "PLZA"]),
    ("RD", &["ROAD"]),
    ("RTE", &["ROUTE"]),
    ("SQ", &["SQUARE", "SQR", "SQRE"]),
    ("ST", &["STREET", "STRT", "STR"]),
    ("TER", &["TERRACE", "TERR"]),
    ("TPKE", &["TURNPIKE", "TRNPK"]),
    ("TRL", &["TRAIL", "TRAILS"]),
    ("WAY", &["WAY", "WY"]),
];

/// `(abbreviation, synonym phrases)` for the eight compass directionals,
/// ordered so two-word phrases ("NORTH WEST") are recognized before the
/// matcher would otherwise stop at the single word "NORTH".
const DIRECTIONAL_TABLE: &[(&str, &[&str])] = &[
    ("NE", &["NORTHEAST", "NORTH EAST"]),
    ("NW", &["NORTHWEST", "NORTH WEST"]),
    ("SE", &["SOUTHEAST", "SOUTH EAST"]),
    ("SW", &["SOUTHWEST", "SOUTH WEST"]),
    ("N", &["NORTH", "NTH"]),
    ("S", &["SOUTH", "STH"]),
    ("E", &["EAST"]),
    ("W", &["WEST"]),
];

/// Unit-type keywords that are always followed (or preceded) by an
/// identifier, e.g. `"APT 4"`.
pub const UNIT_KEYWORDS: &[&str] = &[
    "#", "APT", "BLDG", "STE", "UNIT", "RM", "DEPT", "TRLR", "LOT", "FL",
];

/// Synonyms for unit keywords that normalize to the canonical form above.
const UNIT_KEYWORD_SYNONYMS: &[(&str, &[&str])] = &[
    ("APT", &["APARTMENT"]),
    ("BLDG", &["BUILDING"]),
    ("STE", &["SUITE"]),
    ("TRLR", &["TRAILER"]),
    ("FL", &["FLOOR"]),
    ("RM", &["ROOM"]),
    ("DEPT", &["DEPARTMENT"]),
];

/// Unitary unit keywords, which may emit a unit with no identifier at all
/// (e.g. a lone "REAR" or "BSMT").
pub const UNIT_UNITARY: &[&str] = &[
    "BSMT", "FRNT", "LBBY", "LOBBY", "LOWR", "OFC", "PH", "REAR", "SIDE", "UPPR",
];

/// Highway phrase prefixes that are folded into the street name together
/// with their numeric/letter tail, e.g. `"COUNTY ROAD 12"`.
pub const HIGHWAY_PHRASES: &[&str] = &[
    "COUNTY ROAD",
    "COUNTY ROUTE",
    "COUNTY HIGHWAY",
    "STATE ROUTE",
    "STATE HIGHWAY",
    "RURAL ROUTE",
    "FARM ROAD",
    "FARM TO MARKET",
];

/// A modest built-in list of well-known cities, used as the default overlay
/// when a `Parser` is constructed with no caller-supplied known cities. This
/// is opaque seed data, not a maintained gazetteer.
pub const DEFAULT_CITIES: &[&str] = &[
    "NEW YORK",
    "LOS ANGELES",
    "CHICAGO",
    "HOUSTON",
    "PHOENIX",
    "PHILADELPHIA",
    "SAN ANTONIO",
    "SAN DIEGO",
    "DALLAS",
    "SAN JOSE",
    "AUSTIN",
    "JACKSONVILLE",
    "FORT WORTH",
    "COLUMBUS",
    "CHARLOTTE",
    "SAN FRANCISCO",
    "INDIANAPOLIS",
    "SEATTLE",
    "DENVER",
    "WASHINGTON",
    "BOSTON",
    "DETROIT",
    "PORTLAND",
    "MEMPHIS",
    "GRAND RAPIDS",
    "ATLANTA",
    "MIAMI",
    "CENTRAL CITY",
    "SMALLVILLE",
];

fn build_mealy(table: &[(&str, &[&str])]) -> Mealy {
    let mut builder = Mealy::builder();
    for (canonical, synonyms) in table {
        builder.add_phrase(canonical, canonical);
        for synonym in *synonyms {
            builder.add_phrase(canonical, synonym);
        }
    }
    builder.build()
}

/// The compiled state-name matcher, built once per process.
pub fn states() -> &'static Mealy {
    static TABLE: OnceLock<Mealy> = OnceLock::new();
    TABLE.get_or_init(|| build_mealy(STATE_TABLE))
}

/// The compiled street-suffix matcher, built once per process.
pub fn suffixes() -> &'static Mealy {
    static TABLE: OnceLock<Mealy> = OnceLock::new();
    TABLE.get_or_init(|| build_mealy(SUFFIX_TABLE))
}

/// The compiled directional matcher, built once per process.
pub fn directionals() -> &'static Mealy {
    static TABLE: OnceLock<Mealy> = OnceLock::new();
    TABLE.get_or_init(|| build_mealy(DIRECTIONAL_TABLE))
}

/// The compiled unit-keyword matcher (normalizes e.g. "APARTMENT" to "APT").
pub fn unit_keywords() -> &'static Mealy {
    static TABLE: OnceLock<Mealy> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut builder = Mealy::builder();
        for keyword in UNIT_KEYWORDS {
            builder.add_phrase(keyword, keyword);
        }
        for (canonical, synonyms) in UNIT_KEYWORD_SYNONYMS {
            for synonym in *synonyms {
                builder.add_phrase(canonical, synonym);
            }
        }
        builder.build()
    })
}

/// The compiled highway-phrase matcher (phrase only, caller appends the tail).
pub fn highway_phrases() -> &'static Mealy {
    static TABLE: OnceLock<Mealy> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut builder = Mealy::builder();
        for phrase in HIGHWAY_PHRASES {
            builder.add_phrase(phrase, phrase);
        }
        builder.build()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn two_letter_state_codes_are_absent_from_suffixes() {
        for (abbr, _) in STATE_TABLE {
            check!(SUFFIX_TABLE.iter().all(|(canon, _)| canon != abbr));
        }
    }

    #[test]
    fn states_table_matches_full_name() {
        let tokens: Vec<String> = "SOUTH DAKOTA".split(' ').map(str::to_string).collect();
        let (label, len) = states().match_at(&tokens, 0).unwrap();
        check!(label == "SD");
        check!(len == 2);
    }

    #[test]
    fn directionals_prefer_longest_match() {
        let tokens: Vec<String> = "NORTH WEST STREET".split(' ').map(str::to_string).collect();
        let (label, len) = directionals().match_at(&tokens, 0).unwrap();
        check!(label == "NW");
        check!(len == 2);
    }
}
