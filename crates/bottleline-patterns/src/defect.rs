//! Defect vocabulary shared by the simulator and the analytics
//!
//! A bottle carries either the `none` sentinel or one or more distinct defect tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a defect name cannot be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown defect type: {0}")]
pub struct ParseDefectError(pub String);

/// Defect tag detected by the (simulated) camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefectType {
    /// Sentinel for a defect-free bottle
    None,
    /// Crooked or missing label
    Label,
    /// Dented bottle body
    Dent,
    /// Badly seated cap
    Cap,
    /// Irregular liquid level
    Liquid,
}

impl DefectType {
    /// Every real defect, in reporting order
    pub const DEFECTS: [DefectType; 4] = [
        DefectType::Label,
        DefectType::Dent,
        DefectType::Cap,
        DefectType::Liquid,
    ];

    pub fn is_defect(self) -> bool {
        self != DefectType::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DefectType::None => "none",
            DefectType::Label => "label",
            DefectType::Dent => "dent",
            DefectType::Cap => "cap",
            DefectType::Liquid => "liquid",
        }
    }

    /// Short operator-facing tag, as printed on the inspection overlay
    pub fn display_name(self) -> &'static str {
        match self {
            DefectType::None => "OK",
            DefectType::Label => "LABEL",
            DefectType::Dent => "DENT",
            DefectType::Cap => "CAP",
            DefectType::Liquid => "LEVEL",
        }
    }
}

impl fmt::Display for DefectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DefectType {
    type Err = ParseDefectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(DefectType::None),
            "label" => Ok(DefectType::Label),
            "dent" => Ok(DefectType::Dent),
            "cap" => Ok(DefectType::Cap),
            "liquid" => Ok(DefectType::Liquid),
            other => Err(ParseDefectError(other.to_string())),
        }
    }
}

/// Ordered set of defect tags carried by one bottle
///
/// Either the singleton `[none]` or one or more distinct real defects in the
/// order they were drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<DefectType>", into = "Vec<DefectType>")]
pub struct DefectSet(Vec<DefectType>);

impl DefectSet {
    /// The defect-free set `[none]`
    pub fn clean() -> Self {
        DefectSet(vec![DefectType::None])
    }

    /// A set holding a single tag (`none` yields the clean set)
    pub fn single(defect: DefectType) -> Self {
        Self::from_defects([defect])
    }

    /// Build a set from drawn tags, dropping duplicates and the `none` sentinel.
    /// An empty result collapses to the clean set.
    pub fn from_defects(defects: impl IntoIterator<Item = DefectType>) -> Self {
        let mut tags: Vec<DefectType> = Vec::with_capacity(2);
        for defect in defects {
            if defect.is_defect() && !tags.contains(&defect) {
                tags.push(defect);
            }
        }
        if tags.is_empty() {
            Self::clean()
        } else {
            DefectSet(tags)
        }
    }

    pub fn is_clean(&self) -> bool {
        self.0.first() == Some(&DefectType::None)
    }

    pub fn contains(&self, defect: DefectType) -> bool {
        self.0.contains(&defect)
    }

    /// Real defects only (empty for a clean bottle)
    pub fn defects(&self) -> impl Iterator<Item = DefectType> + '_ {
        self.0.iter().copied().filter(|d| d.is_defect())
    }

    pub fn iter(&self) -> impl Iterator<Item = DefectType> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[DefectType] {
        &self.0
    }

}

impl From<Vec<DefectType>> for DefectSet {
    fn from(defects: Vec<DefectType>) -> Self {
        Self::from_defects(defects)
    }
}

impl From<DefectSet> for Vec<DefectType> {
    fn from(set: DefectSet) -> Self {
        set.0
    }
}

impl Default for DefectSet {
    fn default() -> Self {
        Self::clean()
    }
}

impl fmt::Display for DefectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|d| d.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

/// Cumulative per-type occurrence counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectCounts {
    pub label: u64,
    pub dent: u64,
    pub cap: u64,
    pub liquid: u64,
}

impl DefectCounts {
    pub fn get(&self, defect: DefectType) -> u64 {
        match defect {
            DefectType::None => 0,
            DefectType::Label => self.label,
            DefectType::Dent => self.dent,
            DefectType::Cap => self.cap,
            DefectType::Liquid => self.liquid,
        }
    }

    /// Increment the counter for `defect` and return the new count.
    /// `none` is never counted.
    pub fn increment(&mut self, defect: DefectType) -> u64 {
        let slot = match defect {
            DefectType::None => return 0,
            DefectType::Label => &mut self.label,
            DefectType::Dent => &mut self.dent,
            DefectType::Cap => &mut self.cap,
            DefectType::Liquid => &mut self.liquid,
        };
        *slot += 1;
        *slot
    }

    pub fn total(&self) -> u64 {
        self.label + self.dent + self.cap + self.liquid
    }

    /// Defect types with a non-zero count, in reporting order
    pub fn present(&self) -> Vec<DefectType> {
        DefectType::DEFECTS
            .iter()
            .copied()
            .filter(|&d| self.get(d) > 0)
            .collect()
    }

    /// `(type, count)` pairs for all four defects
    pub fn iter(&self) -> impl Iterator<Item = (DefectType, u64)> + '_ {
        DefectType::DEFECTS.iter().map(move |&d| (d, self.get(d)))
    }
}
