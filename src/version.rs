//! Stack-version classification.
//!
//! Raw stack versions look like `HDP-2.0.6` or `HDPLocal-1.3`: a product
//! family tag, a dash, then a dotted version number. Everything downstream
//! (component gating, property table selection, stack resource URLs) works on
//! the number with the family stripped, so this module centralizes that
//! normalization along with the ordering rules used to compare versions.
//!
//! Classification never fails. Components that do not parse as integers
//! compare as zero, which keeps malformed input deterministic instead of
//! aborting a reconciliation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Version number at which a stack counts as generation two.
const GENERATION_TWO_FLOOR: &str = "2.0";

/// Product family tag in front of the version number.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum StackFamily {
    Hdp,
    HdpLocal,
    Other(String),
}

impl StackFamily {
    pub fn as_str(&self) -> &str {
        match self {
            StackFamily::Hdp => "HDP",
            StackFamily::HdpLocal => "HDPLocal",
            StackFamily::Other(value) => value.as_str(),
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "HDP" => StackFamily::Hdp,
            "HDPLocal" => StackFamily::HdpLocal,
            other => StackFamily::Other(other.to_string()),
        }
    }
}

impl Serialize for StackFamily {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Major generation of a stack, used to pick the matching property tables.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum StackGeneration {
    #[serde(rename = "gen1")]
    One,
    #[serde(rename = "gen2")]
    Two,
}

impl StackGeneration {
    pub fn as_str(self) -> &'static str {
        match self {
            StackGeneration::One => "gen1",
            StackGeneration::Two => "gen2",
        }
    }
}

impl fmt::Display for StackGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified stack version.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StackVersion {
    raw: String,
    family: StackFamily,
    number: String,
}

impl StackVersion {
    /// Split a raw version into family tag and number.
    ///
    /// Strings without a family tag default to `HDP`, so `"2.0"` and
    /// `"HDP-2.0"` classify identically.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let (family, number) = match split_family(trimmed) {
            Some((tag, number)) => (StackFamily::from_tag(tag), number),
            None => (StackFamily::Hdp, trimmed),
        };
        Self {
            raw: trimmed.to_string(),
            family,
            number: number.to_string(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn family(&self) -> &StackFamily {
        &self.family
    }

    /// Version number with the family prefix removed (`"2.0.6"`).
    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn generation(&self) -> StackGeneration {
        if self.is_generation_two() {
            StackGeneration::Two
        } else {
            StackGeneration::One
        }
    }

    /// True once the numeric version reaches `2.0`.
    pub fn is_generation_two(&self) -> bool {
        compare_numbers(&self.number, GENERATION_TWO_FLOOR) != Ordering::Less
    }

    /// Compare two versions numerically, ignoring the family tag.
    pub fn cmp_version(&self, other: &StackVersion) -> Ordering {
        compare_numbers(&self.number, &other.number)
    }

    /// Exact membership test against a catalog's allowed-version list.
    ///
    /// Entries may carry a family prefix or not; both sides are reduced to
    /// the bare number and compared as strings, not as numeric ranges.
    pub fn matches_any<'a, I>(&self, allowed: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        allowed
            .into_iter()
            .any(|entry| strip_family(entry.trim()) == self.number)
    }

    /// Resource prefix for the v1 stacks API.
    pub fn stack_version_url(&self) -> String {
        format!("/stacks/{}/version/{}", self.family.as_str(), self.number)
    }

    /// Resource prefix for the v2 stacks API.
    pub fn stack2_version_url(&self) -> String {
        format!("/stacks2/{}/versions/{}", self.family.as_str(), self.number)
    }
}

impl fmt::Display for StackVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compare two raw stack versions.
///
/// Family tags are stripped, the remaining numbers are split on `.` and `-`
/// and compared component by component with zero padding on the right.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    compare_numbers(strip_family(left.trim()), strip_family(right.trim()))
}

fn compare_numbers(left: &str, right: &str) -> Ordering {
    let left = numeric_components(left);
    let right = numeric_components(right);
    let len = left.len().max(right.len());
    for idx in 0..len {
        let l = left.get(idx).copied().unwrap_or(0);
        let r = right.get(idx).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn numeric_components(number: &str) -> Vec<u64> {
    if number.is_empty() {
        return Vec::new();
    }
    number
        .split(['.', '-'])
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
        .collect()
}

fn split_family(raw: &str) -> Option<(&str, &str)> {
    let (tag, number) = raw.split_once('-')?;
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((tag, number))
}

fn strip_family(raw: &str) -> &str {
    split_family(raw).map(|(_, number)| number).unwrap_or(raw)
}
