//! Unit identifier parsing.
//!
//! SuttaCentral uids name a text as a collection prefix followed by numbers:
//! `mn10`, `an1.5`, `dhp21`. Compound leaves bundle consecutive units under a
//! single range uid in one of two shapes:
//!
//! | Shape  | Example    | Units                    |
//! |--------|------------|--------------------------|
//! | dotted | `an1.1-10` | `an1.1` … `an1.10`       |
//! | flat   | `dhp1-20`  | `dhp1` … `dhp20`         |
//!
//! Parallels keys follow the same grammar and may carry a `#segment` suffix,
//! which is ignored for matching.
//!
//! ## Display Names
//!
//! Acronyms uppercase the letter prefix and separate it from the numbers:
//! `an1.5` → "AN 1.5". Dhammapada is the one exception and keeps its
//! conventional casing: `dhp21` → "Dhp 21".

use regex::Regex;
use std::sync::LazyLock;

/// Upper bound on units expanded from one compound uid.
pub const MAX_RANGE_UNITS: u32 = 500;

static UNIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)(\d+)(?:\.(\d+))?$").expect("unit pattern compiles"));

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)(\d+)(?:\.(\d+))?-(\d+)$").expect("range pattern compiles")
});

static COMPOUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]+)(\d+)(?:\.(\d+))?-(\d+)$").expect("compound pattern compiles")
});

static ACRONYM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z]+)(.*)$").expect("acronym pattern compiles"));

/// A single unit such as `an1.5` or `dhp21`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitId {
    pub prefix: String,
    /// Major number (`1` in `an1.5`, `21` in `dhp21`).
    pub number: u32,
    /// Minor number for dotted ids (`5` in `an1.5`).
    pub decimal: Option<u32>,
}

impl UnitId {
    pub fn parse(uid: &str) -> Option<Self> {
        let caps = UNIT_RE.captures(uid)?;
        Some(Self {
            prefix: caps[1].to_string(),
            number: caps[2].parse().ok()?,
            decimal: match caps.get(3) {
                Some(m) => Some(m.as_str().parse().ok()?),
                None => None,
            },
        })
    }

    /// The trailing number: the minor for dotted ids, else the major.
    pub fn last_number(&self) -> u32 {
        self.decimal.unwrap_or(self.number)
    }
}

/// A span of consecutive units such as `an1.1-10` or `dhp1-20`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRange {
    pub prefix: String,
    /// Major number; also the first unit for flat ranges.
    pub number: u32,
    /// First minor number for dotted ranges.
    pub start: Option<u32>,
    /// Last unit (minor for dotted ranges, major for flat ones).
    pub end: u32,
}

impl UnitRange {
    /// Parse a range-shaped key. Accepts any prefix and a trailing `#segment`.
    pub fn parse(key: &str) -> Option<Self> {
        let base = key.split('#').next().unwrap_or(key);
        Self::from_captures(RANGE_RE.captures(base)?)
    }

    /// Parse a compound leaf uid. Only lowercase letter prefixes qualify,
    /// the span must be ascending and no larger than [`MAX_RANGE_UNITS`].
    pub fn parse_compound(uid: &str) -> Option<Self> {
        let range = Self::from_captures(COMPOUND_RE.captures(uid)?)?;
        let first = range.first();
        (first <= range.end && range.end - first < MAX_RANGE_UNITS).then_some(range)
    }

    fn from_captures(caps: regex::Captures<'_>) -> Option<Self> {
        Some(Self {
            prefix: caps[1].to_string(),
            number: caps[2].parse().ok()?,
            start: match caps.get(3) {
                Some(m) => Some(m.as_str().parse().ok()?),
                None => None,
            },
            end: caps[4].parse().ok()?,
        })
    }

    pub fn is_dotted(&self) -> bool {
        self.start.is_some()
    }

    pub fn first(&self) -> u32 {
        self.start.unwrap_or(self.number)
    }

    /// Whether `unit` falls inside this span.
    ///
    /// Dotted spans require the same major number and compare minors. Flat
    /// spans compare the unit's major number only.
    pub fn contains(&self, unit: &UnitId) -> bool {
        if unit.prefix != self.prefix {
            return false;
        }
        match self.start {
            Some(start) => {
                unit.number == self.number
                    && unit.decimal.is_some_and(|d| (start..=self.end).contains(&d))
            }
            None => (self.number..=self.end).contains(&unit.number),
        }
    }

    /// Whether this span ends exactly at `unit`.
    pub fn ends_at(&self, unit: &UnitId) -> bool {
        if unit.prefix != self.prefix || self.end != unit.last_number() {
            return false;
        }
        match (self.start, unit.decimal) {
            (Some(_), Some(_)) => self.number == unit.number,
            (None, None) => true,
            _ => false,
        }
    }

    /// Every unit uid in the span, in ascending order.
    pub fn units(&self) -> Vec<String> {
        (self.first()..=self.end).map(|n| self.unit(n)).collect()
    }

    /// Uid of the unit numbered `n` within this span.
    fn unit(&self, n: u32) -> String {
        match self.start {
            Some(_) => format!("{}{}.{}", self.prefix, self.number, n),
            None => format!("{}{}", self.prefix, n),
        }
    }
}

/// Display acronym for a uid: `an1.5` → "AN 1.5", `dhp21` → "Dhp 21".
///
/// Uids without a leading letter run are returned unchanged.
pub fn acronym(uid: &str) -> String {
    match ACRONYM_RE.captures(uid) {
        Some(caps) => {
            let letters = caps[1].to_uppercase().replace("DHP", "Dhp");
            format!("{} {}", letters, &caps[2])
        }
        None => uid.to_string(),
    }
}

/// Short title of a unit: the minor number for dotted ids, else the number.
pub fn unit_title(uid: &str) -> String {
    if let Some((_, minor)) = uid.split_once('.') {
        return minor.to_string();
    }
    uid.trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .to_string()
}

/// Last unit of a neighbouring compound uid: `an1.250-257` → `an1.257`,
/// `dhp1-20` → `dhp20`. Non-range uids are returned unchanged.
pub fn last_unit_of(uid: &str) -> String {
    UnitRange::parse(uid).map_or_else(|| uid.to_string(), |r| r.unit(r.end))
}

/// First unit of a neighbouring compound uid: `an1.11-20` → `an1.11`.
/// Non-range uids are returned unchanged.
pub fn first_unit_of(uid: &str) -> String {
    UnitRange::parse(uid).map_or_else(|| uid.to_string(), |r| r.unit(r.first()))
}
