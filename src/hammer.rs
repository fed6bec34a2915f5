//! The canonicalizer ("hammer"): batch fill-in, ambiguity detection, typo
//! repair application and MD5 batch checksumming.
//!
//! Grounded in `__hammer__.py`'s `Hammer` class and `__address__.py`'s
//! `HashableFactory.from_all_addresses` — the core fill-in algorithm that
//! resolves each record's missing soft components by cross-referencing every
//! other record sharing its hard key.

use ahash::{AHashMap, AHashSet};

use crate::address::{Address, AddressFields, RawAddress, CHECKSUM_IGNORE};
use crate::config::HammerConfig;
use crate::error::{HammerError, ParseError};
use crate::fuzzy::FixTypos;
use crate::parser::{smart_batch, Parser};

type HardKey = (String, String, String, String);

/// Either a raw string to be parsed, an already-parsed record, or a
/// previously canonicalized one (carrying a batch checksum to be checked).
pub enum RecordInput {
    Text(String),
    Parsed(RawAddress),
    Canonical(Address),
}

impl From<String> for RecordInput {
    fn from(value: String) -> Self {
        RecordInput::Text(value)
    }
}

impl From<RawAddress> for RecordInput {
    fn from(value: RawAddress) -> Self {
        RecordInput::Parsed(value)
    }
}

impl From<Address> for RecordInput {
    fn from(value: Address) -> Self {
        RecordInput::Canonical(value)
    }
}

#[derive(Default, Clone)]
struct SoftSets {
    st_suffix: AHashSet<String>,
    st_nesw: AHashSet<String>,
    zip_code: AHashSet<String>,
}

impl SoftSets {
    fn is_ambiguous(&self) -> bool {
        self.st_suffix.len() > 1 || self.st_nesw.len() > 1 || self.zip_code.len() > 1
    }
}

fn hard_key_of(fields: &AddressFields) -> HardKey {
    (
        fields.house_number.clone(),
        fields.st_name.clone(),
        fields.city.clone(),
        fields.us_state.clone(),
    )
}

fn check_checksum(expected: &str, found: &str) -> Result<(), HammerError> {
    if found == expected || found == CHECKSUM_IGNORE || expected == CHECKSUM_IGNORE {
        Ok(())
    } else {
        Err(HammerError::ChecksumMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}

/// A batch canonicalizer built from a collection of raw or already-parsed
/// address records plus a [`HammerConfig`].
pub struct Hammer {
    parser: Parser,
    fill_in: AHashMap<HardKey, SoftSets>,
    unit_table: AHashMap<HardKey, AHashMap<String, AddressFields>>,
    checksum: String,
    ambiguous_groups: Vec<Vec<Address>>,
    parse_errors: Vec<(ParseError, String)>,
    canonical_set: AHashSet<Address>,
}

impl Hammer {
    /// Build a canonicalizer from `records` and `config`.
    pub fn new(records: impl IntoIterator<Item = RecordInput>, mut config: HammerConfig) -> Self {
        let span = tracing::info_span!("hammer_build");
        let _enter = span.enter();

        if let Err(err) = config.validate() {
            tracing::warn!(%err, "clamping out-of-range repair level");
            config.city_repair_level = config.city_repair_level.min(10);
            config.street_repair_level = config.street_repair_level.min(10);
        }

        let parser = Parser::new(config.known_cities.iter().cloned());

        let mut texts = Vec::new();
        let mut already_parsed = Vec::new();
        for record in records {
            match record {
                RecordInput::Text(s) => texts.push(s),
                RecordInput::Parsed(raw) => already_parsed.push(raw),
                RecordInput::Canonical(addr) => {
                    already_parsed.push(RawAddress::new(addr.0));
                }
            }
        }

        let mut parse_errors = Vec::new();
        let mut survivors = smart_batch(&parser, texts, |e, s| parse_errors.push((e, s)));
        survivors.extend(already_parsed);

        let junk_cities: AHashSet<String> =
            config.junk_cities.iter().map(|s| s.to_uppercase()).collect();
        let junk_streets: AHashSet<String> =
            config.junk_streets.iter().map(|s| s.to_uppercase()).collect();

        survivors.retain(|record| {
            let junk = junk_cities.contains(&record.city) || junk_streets.contains(&record.st_name);
            if junk {
                parse_errors.push((
                    ParseError::Rejected {
                        stage: "junk_filter",
                        token: record.orig.clone(),
                    },
                    record.orig.clone(),
                ));
            }
            !junk
        });

        let city_bag = bag_from(survivors.iter().map(|r| r.city.as_str()));
        let street_bag = bag_from(survivors.iter().map(|r| r.st_name.as_str()));
        let cutoff = (survivors.len().max(1) as f64).ln();

        let city_vocab: AHashSet<String> = config
            .known_cities
            .iter()
            .map(|s| s.to_uppercase())
            .chain(
                city_bag
                    .into_iter()
                    .filter(|(_, freq)| f64::from(*freq) > cutoff)
                    .map(|(word, _)| word),
            )
            .collect();
        let street_vocab: AHashSet<String> = config
            .known_streets
            .iter()
            .map(|s| s.to_uppercase())
            .chain(
                street_bag
                    .into_iter()
                    .filter(|(_, freq)| f64::from(*freq) > cutoff)
                    .map(|(word, _)| word),
            )
            .collect();

        tracing::debug!(
            vocabulary_cities = city_vocab.len(),
            vocabulary_streets = street_vocab.len(),
            "typo repair vocabulary built"
        );

        let city_fixer = FixTypos::new(city_vocab, config.city_repair_level);
        let street_fixer = FixTypos::new(street_vocab, config.street_repair_level);

        for record in &mut survivors {
            record.0.city = city_fixer.repair(&record.city);
            record.0.st_name = street_fixer.repair(&record.st_name);
        }

        let (fill_in, unit_table) = build_tables(&survivors);
        let ambiguous_groups = build_ambiguous_groups(&survivors, &fill_in);

        let checksum = if config.make_batch_checksum {
            compute_checksum(&config, &survivors)
        } else {
            String::new()
        };

        let mut canonical_set = AHashSet::new();
        for record in &survivors {
            for address in resolve(record, &fill_in, &unit_table, &checksum) {
                canonical_set.insert(address);
            }
        }

        tracing::info!(
            records = survivors.len(),
            ambiguous_groups = ambiguous_groups.len(),
            parse_errors = parse_errors.len(),
            canonical_records = canonical_set.len(),
            "hammer batch built"
        );

        Self {
            parser,
            fill_in,
            unit_table,
            checksum,
            ambiguous_groups,
            parse_errors,
            canonical_set,
        }
    }

    /// The MD5 batch checksum stamped into every emitted record.
    pub fn batch_checksum(&self) -> &str {
        &self.checksum
    }

    /// Groups of original records sharing a hard key whose non-unit soft
    /// values disagreed; the caller is expected to resolve these out of
    /// band.
    pub fn ambiguous_groups(&self) -> &[Vec<Address>] {
        &self.ambiguous_groups
    }

    /// Inputs that could not be parsed or were filtered as junk, paired with
    /// the offending original string.
    pub fn parse_errors(&self) -> &[(ParseError, String)] {
        &self.parse_errors
    }

    /// The number of distinct canonical records this batch produced.
    pub fn len(&self) -> usize {
        self.canonical_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical_set.is_empty()
    }

    /// Iterate over every canonical record this batch produced.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.canonical_set.iter()
    }

    /// Resolve `record` to every canonical form the batch supports. Returns
    /// an empty vector when the hard key is unknown, or when a soft field is
    /// ambiguous and `record` does not resolve it itself.
    ///
    /// # Errors
    /// Returns [`HammerError::ChecksumMismatch`] if `record` is a
    /// [`RecordInput::Canonical`] from a different batch.
    pub fn get_all(&self, record: RecordInput) -> Result<Vec<Address>, HammerError> {
        let raw = self.into_raw(record)?;
        Ok(resolve(&raw, &self.fill_in, &self.unit_table, &self.checksum))
    }

    /// Like [`Hammer::get_all`], but returns exactly one record, falling
    /// back to stripping the unit when the hard key resolves to more than
    /// one candidate.
    ///
    /// # Errors
    /// Returns [`HammerError::KeyNotFound`] if no canonical record exists,
    /// or [`HammerError::ChecksumMismatch`] per [`Hammer::get_all`].
    pub fn get(&self, record: RecordInput) -> Result<Address, HammerError> {
        let mut results = self.get_all(record)?;
        match results.len() {
            0 => Err(HammerError::KeyNotFound),
            1 => Ok(results.remove(0)),
            _ => {
                tracing::warn!(count = results.len(), "ambiguous lookup, stripping unit");
                Ok(results.remove(0).without_unit())
            }
        }
    }

    fn into_raw(&self, record: RecordInput) -> Result<RawAddress, HammerError> {
        match record {
            RecordInput::Text(s) => self
                .parser
                .parse(&s)
                .map_err(|_| HammerError::KeyNotFound),
            RecordInput::Parsed(raw) => Ok(raw),
            RecordInput::Canonical(addr) => {
                check_checksum(&self.checksum, &addr.batch_checksum)?;
                Ok(RawAddress::new(addr.0))
            }
        }
    }

    /// Produce a derived `Hammer` applying `f` to every canonical record
    /// while preserving this batch's checksum, parser and ambiguous groups.
    pub fn map(&self, f: impl Fn(&Address) -> Address) -> Hammer {
        let mapped: AHashSet<Address> = self.canonical_set.iter().map(&f).collect();
        let mapped_raw: Vec<RawAddress> = mapped
            .iter()
            .map(|a| RawAddress::new(a.0.clone()))
            .collect();
        let (fill_in, unit_table) = build_tables(&mapped_raw);
        Hammer {
            parser: Parser::new(std::iter::empty::<String>()),
            fill_in,
            unit_table,
            checksum: self.checksum.clone(),
            ambiguous_groups: self.ambiguous_groups.clone(),
            parse_errors: self.parse_errors.clone(),
            canonical_set: mapped,
        }
    }
}

fn bag_from<'a>(words: impl Iterator<Item = &'a str>) -> AHashMap<String, u32> {
    let mut bag = AHashMap::new();
    for word in words {
        if word.is_empty() {
            continue;
        }
        *bag.entry(word.to_string()).or_insert(0) += 1;
    }
    bag
}

fn build_tables(
    survivors: &[RawAddress],
) -> (
    AHashMap<HardKey, SoftSets>,
    AHashMap<HardKey, AHashMap<String, AddressFields>>,
) {
    let mut fill_in: AHashMap<HardKey, SoftSets> = AHashMap::new();
    let mut unit_table: AHashMap<HardKey, AHashMap<String, AddressFields>> = AHashMap::new();

    for record in survivors {
        let key = hard_key_of(&record.0);
        let entry = fill_in.entry(key.clone()).or_default();
        if let Some(suffix) = &record.st_suffix {
            entry.st_suffix.insert(suffix.clone());
        }
        if let Some(nesw) = &record.st_nesw {
            entry.st_nesw.insert(nesw.clone());
        }
        if let Some(zip) = &record.zip_code {
            entry.zip_code.insert(zip.clone());
        }
        if let Some(unit) = &record.unit {
            unit_table
                .entry(key)
                .or_default()
                .insert(unit.clone(), record.0.clone());
        }
    }

    (fill_in, unit_table)
}

fn build_ambiguous_groups(
    survivors: &[RawAddress],
    fill_in: &AHashMap<HardKey, SoftSets>,
) -> Vec<Vec<Address>> {
    let mut groups: Vec<Vec<Address>> = Vec::new();
    for (key, softs) in fill_in {
        if !softs.is_ambiguous() {
            continue;
        }
        let members: Vec<Address> = survivors
            .iter()
            .filter(|r| &hard_key_of(&r.0) == key)
            .map(|r| Address::new(r.0.clone()))
            .collect();
        if members.len() > 1 {
            groups.push(members);
        }
    }
    groups
}

/// Resolve `record` against the fill-in and unit tables, implementing the
/// lookup contract: unknown hard key → empty; unresolved ambiguity → empty;
/// a record with its own unit → exactly one candidate; otherwise one
/// candidate per unit observed in the batch (or a single unit-less
/// candidate if none were observed).
fn resolve(
    record: &RawAddress,
    fill_in: &AHashMap<HardKey, SoftSets>,
    unit_table: &AHashMap<HardKey, AHashMap<String, AddressFields>>,
    checksum: &str,
) -> Vec<Address> {
    let key = hard_key_of(&record.0);
    let Some(softs) = fill_in.get(&key) else {
        return Vec::new();
    };

    let resolve_field = |own: &Option<String>, set: &AHashSet<String>| -> Option<Option<String>> {
        if own.is_some() {
            return Some(own.clone());
        }
        match set.len() {
            0 => Some(None),
            1 => Some(set.iter().next().cloned()),
            _ => None,
        }
    };

    let Some(st_suffix) = resolve_field(&record.st_suffix, &softs.st_suffix) else {
        return Vec::new();
    };
    let Some(st_nesw) = resolve_field(&record.st_nesw, &softs.st_nesw) else {
        return Vec::new();
    };
    let Some(zip_code) = resolve_field(&record.zip_code, &softs.zip_code) else {
        return Vec::new();
    };

    let base = AddressFields {
        house_number: record.house_number.clone(),
        st_name: record.st_name.clone(),
        st_suffix,
        st_nesw,
        unit: None,
        city: record.city.clone(),
        us_state: record.us_state.clone(),
        zip_code,
        orig: record.orig.clone(),
        batch_checksum: checksum.to_string(),
    };

    if let Some(unit) = &record.unit {
        let mut fields = base;
        fields.unit = Some(unit.clone());
        return vec![Address::new(fields)];
    }

    match unit_table.get(&key) {
        Some(units) if !units.is_empty() => units
            .keys()
            .map(|unit| {
                let mut fields = base.clone();
                fields.unit = Some(unit.clone());
                Address::new(fields)
            })
            .collect(),
        _ => vec![Address::new(base)],
    }
}

fn compute_checksum(config: &HammerConfig, survivors: &[RawAddress]) -> String {
    let mut hasher = md5::Context::new();

    for list in [
        &config.known_cities,
        &config.known_streets,
        &config.junk_cities,
        &config.junk_streets,
    ] {
        let mut sorted: Vec<String> = list.iter().map(|s| s.to_uppercase()).collect();
        sorted.sort();
        hasher.consume(sorted.join("|").as_bytes());
        hasher.consume(b"\0");
    }

    // Sort by the full hard+soft component string, not hard components alone,
    // so two survivors sharing a hard key but disagreeing on a soft field
    // (e.g. "0 Main St" vs "0 Main Rd") land in the same relative order
    // regardless of input order, keeping the checksum permutation-invariant.
    let sort_key = |r: &RawAddress| -> (String, String, String, String, String, String, String, String) {
        let (h1, h2, h3, h4) = r.hard_components();
        let (s1, s2, s3, s4) = r.soft_components();
        (
            h1.to_string(),
            h2.to_string(),
            h3.to_string(),
            h4.to_string(),
            s1.unwrap_or_default().to_string(),
            s2.unwrap_or_default().to_string(),
            s3.unwrap_or_default().to_string(),
            s4.unwrap_or_default().to_string(),
        )
    };
    let mut sorted_records: Vec<&RawAddress> = survivors.iter().collect();
    sorted_records.sort_by_key(|r| sort_key(r));
    for record in sorted_records {
        hasher.consume(record.house_number.as_bytes());
        hasher.consume(record.st_name.as_bytes());
        hasher.consume(record.city.as_bytes());
        hasher.consume(record.us_state.as_bytes());
        for soft in [&record.st_suffix, &record.st_nesw, &record.unit, &record.zip_code] {
            if let Some(v) = soft {
                hasher.consume(v.as_bytes());
            }
        }
        hasher.consume(b"\0");
    }

    format!("{:x}", hasher.compute())
}

/// Build a deduplicated, filled-in set of canonical addresses from an
/// iterable of already-canonical records, without needing a persistent
/// `Hammer` handle or a batch checksum. This is `Hammer`'s fill-in/unit-table
/// machinery factored out for single-shot use, grounded in
/// `__address__.py`'s module-level `merge_duplicates` (distinct from the
/// out-of-scope spreadsheet-level `merge_duplicates`).
pub fn merge_duplicates(addresses: impl IntoIterator<Item = Address>) -> AHashSet<Address> {
    let raws: Vec<RawAddress> = addresses
        .into_iter()
        .map(|a| RawAddress::new(a.0))
        .collect();
    let (fill_in, unit_table) = build_tables(&raws);
    let mut out = AHashSet::new();
    for record in &raws {
        for address in resolve(record, &fill_in, &unit_table, "") {
            out.insert(address);
        }
    }
    out
}
