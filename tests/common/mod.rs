//! Shared fixtures for integration tests: a handful of addresses drawn from
//! the specification's worked examples, reused across the parser and hammer
//! suites so both exercise the same ground truth.

#![allow(dead_code)] // not every fixture is used by every integration test binary

/// A standard, fully-specified address with a unit, suffix and trailing
/// directional.
pub const STANDARD_WITH_UNIT: &str = "3710 Michigane AVE SW apt #447 Grand Rapids MI 49588";

/// A fractional house number with a leading directional street name.
pub const FRACTIONAL_HOUSE_NUMBER: &str = "15 1/2 4th St S Central City IA 52214";

/// A batch of addresses sharing one hard key but disagreeing on suffix,
/// useful for ambiguous-group tests.
pub const AMBIGUOUS_SUFFIX_BATCH: &[&str] =
    &["0 Main St Smallville AZ", "0 Main Rd Smallville AZ"];

/// A batch sharing one hard key across several distinct units.
pub const MULTI_UNIT_BATCH: &[&str] = &[
    "1 Main St Apt 1 Smallville AZ",
    "1 Main St Apt 2 Smallville AZ",
    "1 Main St Apt 3 Smallville AZ",
];
