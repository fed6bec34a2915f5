//! Batch-level configuration for the canonicalizer.
//!
//! A `serde`+`toml`-deserializable struct, in the same spirit as the
//! teacher's `workspace::metadata`/`workspace::lockfile` structs: a plain
//! data type with `#[serde(default)]` fields instead of a constructor
//! accepting half a dozen optional keyword arguments (the idiomatic Rust
//! rendition of `Hammer.__init__`'s many defaulted parameters).

use serde::Deserialize;

use crate::error::HammerError;

fn default_repair_level() -> u8 {
    5
}

fn default_true() -> bool {
    true
}

/// Configuration for one [`crate::hammer::Hammer`] batch.
#[derive(Debug, Clone, Deserialize)]
pub struct HammerConfig {
    /// Cities to recognize in addition to the built-in default list.
    #[serde(default)]
    pub known_cities: Vec<String>,

    /// Street names to seed the street-name typo vocabulary with.
    #[serde(default)]
    pub known_streets: Vec<String>,

    /// Cities to drop records for, with an error reported via the batch's
    /// parse-error sink.
    #[serde(default)]
    pub junk_cities: Vec<String>,

    /// Street names to drop records for.
    #[serde(default)]
    pub junk_streets: Vec<String>,

    /// City-name typo-repair aggressiveness, 0 (disabled) to 10 (maximally
    /// permissive).
    #[serde(default = "default_repair_level")]
    pub city_repair_level: u8,

    /// Street-name typo-repair aggressiveness, 0 to 10.
    #[serde(default = "default_repair_level")]
    pub street_repair_level: u8,

    /// Whether to compute and stamp a batch checksum on every emitted
    /// record. Disabling this is only useful for tests that don't need
    /// checksum-scoped identity checks.
    #[serde(default = "default_true")]
    pub make_batch_checksum: bool,
}

impl Default for HammerConfig {
    fn default() -> Self {
        Self {
            known_cities: Vec::new(),
            known_streets: Vec::new(),
            junk_cities: Vec::new(),
            junk_streets: Vec::new(),
            city_repair_level: default_repair_level(),
            street_repair_level: default_repair_level(),
            make_batch_checksum: true,
        }
    }
}

impl HammerConfig {
    /// Parse a configuration from TOML source.
    ///
    /// # Errors
    /// Propagates `toml`'s deserialization error.
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Check that both repair levels fall within the documented `0..=10`
    /// range.
    ///
    /// # Errors
    /// Returns [`HammerError::InvalidRepairLevel`] naming whichever level is
    /// out of range.
    pub fn validate(&self) -> Result<(), HammerError> {
        for level in [self.city_repair_level, self.street_repair_level] {
            if level > 10 {
                return Err(HammerError::InvalidRepairLevel { level });
            }
        }
        Ok(())
    }
}
