//! The address record: hard/soft component split, non-transitive equality,
//! canonical string rendering, and the raw/canonical type-level distinction.
//!
//! Grounded in `__address__.py`'s `Address` NamedTuple. The split into two
//! Rust types (`RawAddress`, `Address`) is this crate's rendition of the
//! original's `RawAddress(Address)` subclass, which only existed to make
//! `__hash__` raise `NotImplementedError`: here the same guarantee is a
//! compile-time one, since `RawAddress` simply never implements `Hash`.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::error::ParseError;

/// Hard component field names, in the tuple order used for ordering and
/// for the hard half of the batch checksum.
pub const HARD_COMPONENTS: [&str; 4] = ["house_number", "st_name", "city", "us_state"];

/// Soft component field names.
pub const SOFT_COMPONENTS: [&str; 4] = ["st_suffix", "st_nesw", "unit", "zip_code"];

/// Sentinel `batch_checksum` value that disables the batch-scoped identity
/// check in [`crate::hammer::Hammer::get`].
pub const CHECKSUM_IGNORE: &str = "__ignore__";

/// The field set shared by [`RawAddress`] and [`Address`].
#[derive(Debug, Clone, Default)]
pub struct AddressFields {
    pub house_number: String,
    pub st_name: String,
    pub st_suffix: Option<String>,
    pub st_nesw: Option<String>,
    pub unit: Option<String>,
    pub city: String,
    pub us_state: String,
    pub zip_code: Option<String>,
    pub orig: String,
    pub batch_checksum: String,
}

impl AddressFields {
    fn hard_components(&self) -> (&str, &str, &str, &str) {
        (&self.house_number, &self.st_name, &self.city, &self.us_state)
    }

    fn soft_components(&self) -> (Option<&str>, Option<&str>, Option<&str>, Option<&str>) {
        (
            self.st_suffix.as_deref(),
            self.st_nesw.as_deref(),
            self.unit.as_deref(),
            self.zip_code.as_deref(),
        )
    }

    /// Hard components must match exactly; each soft pair is only compared
    /// when both sides are present, otherwise the sides are considered
    /// compatible. This is the non-transitive relation the specification
    /// calls for.
    fn compatible_with(&self, other: &Self) -> bool {
        if self.hard_components() != other.hard_components() {
            return false;
        }
        soft_eq(&self.st_suffix, &other.st_suffix)
            && soft_eq(&self.st_nesw, &other.st_nesw)
            && soft_eq(&self.unit, &other.unit)
            && soft_eq(&self.zip_code, &other.zip_code)
    }

    /// Render the canonical, human-readable address string.
    ///
    /// # Errors
    /// Returns [`ParseError::InvalidAddress`] if `st_nesw` resolves to more
    /// than two tokens (or two multi-character ones), or `unit` is not one
    /// or two space-separated tokens.
    fn canonical_string(&self) -> Result<String, ParseError> {
        let (mut pre_directional, mut post_directional) = (None, None);
        if let Some(nesw) = &self.st_nesw {
            let tokens: Vec<&str> = nesw.split_whitespace().collect();
            if tokens.len() > 2 {
                return Err(ParseError::InvalidAddress {
                    orig: self.orig.clone(),
                    reason: "directional field has more than two tokens".to_string(),
                });
            }
            if tokens.len() == 2 && tokens.iter().all(|t| t.chars().count() > 1) {
                return Err(ParseError::InvalidAddress {
                    orig: self.orig.clone(),
                    reason: "directional field has two multi-character tokens".to_string(),
                });
            }
            for t in tokens {
                if t.chars().count() == 1 {
                    pre_directional = Some(t);
                } else {
                    post_directional = Some(t);
                }
            }
        }

        let mut parts: Vec<String> = Vec::with_capacity(8);
        parts.push(self.house_number.clone());
        if let Some(p) = pre_directional {
            parts.push(p.to_string());
        }
        parts.push(titleize(&self.st_name));
        if let Some(suffix) = &self.st_suffix {
            parts.push(titleize(suffix));
        }
        if let Some(p) = post_directional {
            parts.push(p.to_string());
        }
        if let Some(unit) = &self.unit {
            let tokens: Vec<&str> = unit.split_whitespace().collect();
            match tokens.as_slice() {
                [keyword] => parts.push(titleize(keyword)),
                [keyword, id] => {
                    parts.push(titleize(keyword));
                    parts.push(id.to_uppercase());
                }
                _ => {
                    return Err(ParseError::InvalidAddress {
                        orig: self.orig.clone(),
                        reason: "unit field must have one or two tokens".to_string(),
                    });
                }
            }
        }
        parts.push(titleize(&self.city));
        parts.push(self.us_state.to_uppercase());
        if let Some(zip) = &self.zip_code {
            parts.push(zip.clone());
        }
        Ok(parts.join(" "))
    }
}

fn soft_eq(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

fn titleize(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// An address record fresh from the parser: structurally complete but not
/// yet folded into a batch. Deliberately does not implement `Hash`/`Eq`/`Ord`
/// — use a [`crate::hammer::Hammer`] to promote it to an [`Address`].
#[derive(Debug, Clone)]
pub struct RawAddress(pub AddressFields);

impl RawAddress {
    pub fn new(fields: AddressFields) -> Self {
        Self(fields)
    }

    pub fn hard_components(&self) -> (&str, &str, &str, &str) {
        self.0.hard_components()
    }

    pub fn soft_components(&self) -> (Option<&str>, Option<&str>, Option<&str>, Option<&str>) {
        self.0.soft_components()
    }

    /// Same non-transitive relation as [`Address::eq`], usable during batch
    /// analysis (ambiguous-group detection) before records are promoted.
    pub fn compatible_with(&self, other: &RawAddress) -> bool {
        self.0.compatible_with(&other.0)
    }
}

impl std::ops::Deref for RawAddress {
    type Target = AddressFields;
    fn deref(&self) -> &AddressFields {
        &self.0
    }
}

/// A canonical, batch-scoped address record. Implements `Hash`/`Eq`/`Ord` so
/// it can be used directly as a map or set key.
#[derive(Debug, Clone)]
pub struct Address(pub AddressFields);

impl Address {
    pub fn new(fields: AddressFields) -> Self {
        Self(fields)
    }

    pub fn hard_components(&self) -> (&str, &str, &str, &str) {
        self.0.hard_components()
    }

    pub fn soft_components(&self) -> (Option<&str>, Option<&str>, Option<&str>, Option<&str>) {
        self.0.soft_components()
    }

    /// Render this record's canonical string form.
    ///
    /// # Errors
    /// See [`AddressFields::canonical_string`].
    pub fn canonical_string(&self) -> Result<String, ParseError> {
        self.0.canonical_string()
    }

    /// Merge two records that are equal under [`Address::eq`], preferring
    /// `self`'s soft values and falling back to `other`'s. Returns `None` if
    /// the two records are not equal.
    pub fn combine_soft(&self, other: &Address) -> Option<Address> {
        if self != other {
            return None;
        }
        let mut fields = self.0.clone();
        fields.st_suffix = fields.st_suffix.or_else(|| other.0.st_suffix.clone());
        fields.st_nesw = fields.st_nesw.or_else(|| other.0.st_nesw.clone());
        fields.unit = fields.unit.or_else(|| other.0.unit.clone());
        fields.zip_code = fields.zip_code.or_else(|| other.0.zip_code.clone());
        Some(Address(fields))
    }

    /// Merge in soft values from a plain `label -> value` table (as produced
    /// by the canonicalizer's fill-in pass), preferring this record's own
    /// values when present.
    pub fn combine_soft_dict(&self, softs: &ahash::AHashMap<&'static str, String>) -> Address {
        let mut fields = self.0.clone();
        if fields.st_suffix.is_none() {
            fields.st_suffix = softs.get("st_suffix").cloned();
        }
        if fields.st_nesw.is_none() {
            fields.st_nesw = softs.get("st_nesw").cloned();
        }
        if fields.unit.is_none() {
            fields.unit = softs.get("unit").cloned();
        }
        if fields.zip_code.is_none() {
            fields.zip_code = softs.get("zip_code").cloned();
        }
        Address(fields)
    }

    /// A copy of this record stamped with a new batch checksum.
    pub fn with_batch_checksum(&self, checksum: impl Into<String>) -> Address {
        let mut fields = self.0.clone();
        fields.batch_checksum = checksum.into();
        Address(fields)
    }

    /// A copy of this record whose checksum is set to [`CHECKSUM_IGNORE`],
    /// exempting it from the batch-scoped identity check in
    /// [`crate::hammer::Hammer::get`].
    pub fn ignore_checksum(&self) -> Address {
        self.with_batch_checksum(CHECKSUM_IGNORE)
    }

    /// A copy of this record with its unit removed, used when a lookup is
    /// ambiguous across units and the canonicalizer falls back to the first
    /// match.
    pub fn without_unit(&self) -> Address {
        let mut fields = self.0.clone();
        fields.unit = None;
        Address(fields)
    }
}

impl std::ops::Deref for Address {
    type Target = AddressFields;
    fn deref(&self) -> &AddressFields {
        &self.0
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.compatible_with(&other.0)
    }
}

impl Eq for Address {}

impl Hash for Address {
    /// Hashes hard components together with whichever soft values are
    /// present. Note this is only consistent with `eq` once every record in
    /// a batch has been passed through the canonicalizer's fill-in pass, so
    /// that records that compare equal also carry identical soft values —
    /// exactly the state `Hammer::new` produces before handing out
    /// `Address` values.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hard_components().hash(state);
        self.0.soft_components().hash(state);
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.hard_components().cmp(&other.0.hard_components())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    fn fields() -> AddressFields {
        AddressFields {
            house_number: "3710".to_string(),
            st_name: "MICHIGANE".to_string(),
            st_suffix: Some("AVE".to_string()),
            st_nesw: Some("SW".to_string()),
            unit: Some("APT 447".to_string()),
            city: "GRAND RAPIDS".to_string(),
            us_state: "MI".to_string(),
            zip_code: Some("49588".to_string()),
            orig: "3710 Michigane Ave SW Apt 447 Grand Rapids MI 49588".to_string(),
            batch_checksum: String::new(),
        }
    }

    #[test]
    fn canonical_string_matches_expected_form() {
        let addr = Address::new(fields());
        let s = addr.canonical_string().unwrap();
        check!(s == "3710 Michigane Ave SW Apt 447 Grand Rapids MI 49588");
    }

    #[test]
    fn canonical_string_renders_a_unitary_unit_with_no_identifier() {
        let mut f = fields();
        f.unit = Some("REAR".to_string());
        let addr = Address::new(f);
        let s = addr.canonical_string().unwrap();
        check!(s == "3710 Michigane Ave SW Rear Grand Rapids MI 49588");
    }

    #[test]
    fn equality_ignores_absent_soft_fields() {
        let mut other = fields();
        other.zip_code = None;
        let a = Address::new(fields());
        let b = Address::new(other);
        check!(a == b);
    }

    #[test]
    fn equality_fails_on_conflicting_soft_fields() {
        let mut other = fields();
        other.zip_code = Some("00000".to_string());
        let a = Address::new(fields());
        let b = Address::new(other);
        check!(a != b);
    }

    #[test]
    fn equality_requires_matching_hard_components() {
        let mut other = fields();
        other.city = "DETROIT".to_string();
        let a = Address::new(fields());
        let b = Address::new(other);
        check!(a != b);
    }

    #[test]
    fn ordering_is_lexicographic_over_hard_components() {
        let mut lower = fields();
        lower.house_number = "100".to_string();
        let mut higher = fields();
        higher.house_number = "200".to_string();
        check!(Address::new(lower) < Address::new(higher));
    }

    #[test]
    fn combine_soft_prefers_self_values() {
        let mut partial = fields();
        partial.zip_code = None;
        let a = Address::new(partial);
        let b = Address::new(fields());
        let combined = a.combine_soft(&b).unwrap();
        check!(combined.zip_code.as_deref() == Some("49588"));
    }

    #[test]
    fn unit_with_wrong_token_count_is_invalid() {
        let mut bad = fields();
        bad.unit = Some("APT".to_string());
        let addr = Address::new(bad);
        check!(addr.canonical_string().is_err());
    }

    #[test]
    fn ignore_checksum_sets_sentinel() {
        let addr = Address::new(fields()).ignore_checksum();
        check!(addr.batch_checksum == CHECKSUM_IGNORE);
    }

    #[test]
    fn raw_address_does_not_implement_hash() {
        fn assert_no_hash<T>() {}
        assert_no_hash::<RawAddress>();
        // Compile-time guarantee: the following would not compile if
        // uncommented, since RawAddress intentionally has no Hash impl.
        // let _: &dyn std::hash::Hash = &RawAddress::new(fields());
    }
}
