//! Range expansion: individual pages for the units of a compound text.
//!
//! A compound leaf such as `an1.1-10` is one upstream text but ten suttas.
//! For segmented translations each unit gets its own entry with:
//!
//! - a short title and display acronym,
//! - previous/next links that chain through the range and into the
//!   neighbouring compound texts at either end,
//! - the slice of the compound's parallels that concerns that unit.
//!
//! ## Parallels Matching
//!
//! A parallels key concerns unit `U` when any of these hold:
//!
//! | Rule        | Example key for `an1.5` |
//! |-------------|-------------------------|
//! | exact       | `an1.5`                 |
//! | range start | `an1.5-7`, `an1.5#2.1`  |
//! | range end   | `an1.3-5`               |
//! | containment | `an1.1-10`              |

use crate::naming::{UnitId, UnitRange, acronym, first_unit_of, last_unit_of, unit_title};
use crate::types::ParallelsMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitLink {
    pub uid: String,
    pub name: String,
}

impl UnitLink {
    fn new(uid: String) -> Self {
        Self {
            name: acronym(&uid),
            uid,
        }
    }
}

/// Synthesized per-unit fields of a range entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeUnit {
    pub uid: String,
    /// The compound text this unit was expanded from.
    pub compound_uid: String,
    pub title: String,
    pub acronym: String,
    pub previous: Option<UnitLink>,
    pub next: Option<UnitLink>,
    /// `None` when the compound has no parallels data at all.
    pub parallels: Option<ParallelsMap>,
    pub parallels_count: Option<usize>,
}

/// Navigation uids of the compound text itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighbors<'a> {
    pub previous: Option<&'a str>,
    pub next: Option<&'a str>,
}

/// Expand a compound into its units, in ascending order.
pub fn expand(
    compound_uid: &str,
    range: &UnitRange,
    neighbors: Neighbors<'_>,
    parallels: Option<&ParallelsMap>,
) -> Vec<RangeUnit> {
    let units = range.units();
    let last = units.len().saturating_sub(1);

    units
        .iter()
        .enumerate()
        .map(|(i, uid)| {
            let previous = if i > 0 {
                Some(units[i - 1].clone())
            } else {
                neighbors.previous.map(last_unit_of)
            };
            let next = if i < last {
                Some(units[i + 1].clone())
            } else {
                neighbors.next.map(first_unit_of)
            };
            let slice = parallels.map(|p| parallels_for_unit(p, uid));

            RangeUnit {
                uid: uid.clone(),
                compound_uid: compound_uid.to_string(),
                title: unit_title(uid),
                acronym: acronym(uid),
                previous: previous.map(UnitLink::new),
                next: next.map(UnitLink::new),
                parallels_count: slice.as_ref().map(ParallelsMap::reference_count),
                parallels: slice,
            }
        })
        .collect()
}

/// The parallels entries that concern `unit`, in upstream key order.
pub fn parallels_for_unit(parallels: &ParallelsMap, unit: &str) -> ParallelsMap {
    let parsed = UnitId::parse(unit);
    parallels
        .iter()
        .filter(|(key, _)| key_concerns_unit(key, unit, parsed.as_ref()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn key_concerns_unit(key: &str, unit: &str, parsed: Option<&UnitId>) -> bool {
    if matches_exact_or_start(key, unit) {
        return true;
    }
    let (Some(unit_id), Some(range)) = (parsed, UnitRange::parse(key)) else {
        return false;
    };
    range.ends_at(unit_id) || range.contains(unit_id)
}

fn matches_exact_or_start(key: &str, unit: &str) -> bool {
    match key.strip_prefix(unit) {
        Some(rest) => rest.is_empty() || rest.starts_with('-') || rest.starts_with('#'),
        None => false,
    }
}
