//! Black-box tests for the typo-repair fuzzy matcher, exercised the way
//! `Hammer` exercises it: a vocabulary built from known/frequent values,
//! then repair applied to a batch containing an obvious misspelling.

mod common;

use address_hammer::{Hammer, HammerConfig, RecordInput};
use assert2::check;

#[test]
fn repairs_a_misspelled_city_against_a_frequent_vocabulary() {
    let config = HammerConfig {
        known_cities: vec!["Grand Rapids".to_string()],
        city_repair_level: 5,
        ..HammerConfig::default()
    };
    let addresses = vec![
        "1 Main St Grand Rapids MI 49588".to_string(),
        "2 Main St Grand Rapids MI 49588".to_string(),
        "3 Main St Grand Rapdis MI 49588".to_string(),
    ];
    let hammer = Hammer::new(addresses.into_iter().map(RecordInput::Text), config);

    // every record should have folded onto the single canonical spelling
    check!(hammer.iter().all(|a| a.city == "GRAND RAPIDS"));
}

#[test]
fn repair_level_zero_leaves_typos_untouched() {
    let config = HammerConfig {
        known_cities: vec!["Grand Rapids".to_string()],
        city_repair_level: 0,
        ..HammerConfig::default()
    };
    let addresses = vec![
        "1 Main St Grand Rapids MI 49588".to_string(),
        "2 Main St Grand Rapdis MI 49588".to_string(),
    ];
    let hammer = Hammer::new(addresses.into_iter().map(RecordInput::Text), config);

    let cities: std::collections::HashSet<_> = hammer.iter().map(|a| a.city.clone()).collect();
    check!(cities.len() == 2);
}
