//! Black-box tests for the canonicalizer batch: fill-in, ambiguity
//! detection, unit disambiguation and checksum-scoped identity.

mod common;

use address_hammer::{Hammer, HammerConfig, RecordInput};
use assert2::check;

fn config() -> HammerConfig {
    HammerConfig {
        known_cities: vec!["Grand Rapids".to_string(), "Smallville".to_string()],
        ..HammerConfig::default()
    }
}

#[test]
fn single_address_round_trips_through_the_batch() {
    let hammer = Hammer::new(
        vec![common::STANDARD_WITH_UNIT.to_string()]
            .into_iter()
            .map(RecordInput::Text),
        config(),
    );
    check!(hammer.parse_errors().is_empty());
    let address = hammer
        .get(RecordInput::Text(common::STANDARD_WITH_UNIT.to_string()))
        .unwrap();
    check!(address.city == "GRAND RAPIDS");
    check!(address.zip_code.as_deref() == Some("49588"));
}

#[test]
fn ambiguous_suffixes_are_reported_not_silently_resolved() {
    let records: Vec<String> = common::AMBIGUOUS_SUFFIX_BATCH
        .iter()
        .map(|s| s.to_string())
        .collect();
    let hammer = Hammer::new(records.into_iter().map(RecordInput::Text), config());
    check!(hammer.ambiguous_groups().len() == 1);
    check!(hammer.ambiguous_groups()[0].len() == 2);
}

#[test]
fn multi_unit_batch_yields_one_candidate_per_unit() {
    let records: Vec<String> = common::MULTI_UNIT_BATCH
        .iter()
        .map(|s| s.to_string())
        .collect();
    let hammer = Hammer::new(records.into_iter().map(RecordInput::Text), config());

    let all = hammer
        .get_all(RecordInput::Text("1 Main St Smallville AZ".to_string()))
        .unwrap();
    check!(all.len() == 3);
}

#[test]
fn ambiguous_unit_lookup_falls_back_to_stripped_unit() {
    let records: Vec<String> = common::MULTI_UNIT_BATCH
        .iter()
        .map(|s| s.to_string())
        .collect();
    let hammer = Hammer::new(records.into_iter().map(RecordInput::Text), config());

    let resolved = hammer
        .get(RecordInput::Text("1 Main St Smallville AZ".to_string()))
        .unwrap();
    check!(resolved.unit.is_none());
}

#[test]
fn checksum_scoped_identity_rejects_foreign_records() {
    let hammer = Hammer::new(
        vec![common::STANDARD_WITH_UNIT.to_string()]
            .into_iter()
            .map(RecordInput::Text),
        config(),
    );
    let original = hammer
        .get(RecordInput::Text(common::STANDARD_WITH_UNIT.to_string()))
        .unwrap();
    let foreign = original.with_batch_checksum("deliberately-wrong");

    let result = hammer.get(RecordInput::Canonical(foreign));
    check!(result.is_err());
}

#[test]
fn fills_in_directional_and_suffix_across_a_shared_street_named_after_a_suffix_word() {
    let config = HammerConfig {
        known_cities: vec!["City".to_string()],
        ..HammerConfig::default()
    };
    let records = vec![
        "001 Street City MI".to_string(),
        "001 Street St City MI".to_string(),
        "001 E Street City MI".to_string(),
        "001 Street Apt 0 City MI".to_string(),
        "001 Street Apt 1 City MI".to_string(),
    ];
    let hammer = Hammer::new(records.into_iter().map(RecordInput::Text), config);

    let rendered: std::collections::HashSet<String> = hammer
        .iter()
        .map(|a| a.canonical_string().unwrap())
        .collect();
    check!(rendered.len() == 2);
    check!(rendered.contains("001 E Street St Apt 0 City MI"));
    check!(rendered.contains("001 E Street St Apt 1 City MI"));
}

#[test]
fn batch_checksum_is_invariant_under_record_permutation() {
    let forward = vec![
        "1 Main St Smallville AZ".to_string(),
        "2 Oak Ave Smallville AZ".to_string(),
        "3 Elm Rd Smallville AZ".to_string(),
    ];
    let mut reversed = forward.clone();
    reversed.reverse();

    let forward_hammer = Hammer::new(forward.into_iter().map(RecordInput::Text), config());
    let reversed_hammer = Hammer::new(reversed.into_iter().map(RecordInput::Text), config());

    check!(forward_hammer.batch_checksum() == reversed_hammer.batch_checksum());
    check!(!forward_hammer.batch_checksum().is_empty());
}

#[test]
fn batch_checksum_is_invariant_under_permutation_within_a_shared_hard_key() {
    // Both share the hard key ("0", "MAIN", "SMALLVILLE", "AZ") but disagree
    // on st_suffix; a hard-components-only sort would leave their relative
    // order (and thus the hashed soft bytes) dependent on input order.
    let forward: Vec<String> = common::AMBIGUOUS_SUFFIX_BATCH
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut reversed = forward.clone();
    reversed.reverse();

    let forward_hammer = Hammer::new(forward.into_iter().map(RecordInput::Text), config());
    let reversed_hammer = Hammer::new(reversed.into_iter().map(RecordInput::Text), config());

    check!(forward_hammer.batch_checksum() == reversed_hammer.batch_checksum());
}

#[test]
fn junk_cities_are_filtered_with_a_reported_error() {
    let config = HammerConfig {
        known_cities: vec!["Grand Rapids".to_string()],
        junk_cities: vec!["Nowhereville".to_string()],
        ..HammerConfig::default()
    };
    let hammer = Hammer::new(
        vec![
            "1 Main St Grand Rapids MI 49588".to_string(),
            "1 Main St Nowhereville MI 49588".to_string(),
        ]
        .into_iter()
        .map(RecordInput::Text),
        config,
    );
    check!(hammer.len() == 1);
    check!(!hammer.parse_errors().is_empty());
}
