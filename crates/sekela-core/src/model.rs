//! Data model for the university catalog.
//!
//! An [`Institution`] owns its [`Program`]s and [`Facility`]s. Children carry the
//! owning `institution_id`; the owner holds the children by value, so there are no
//! back references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative difficulty rating, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Low,
        Difficulty::Medium,
        Difficulty::High,
        Difficulty::VeryHigh,
    ];

    /// Canonical label as stored and served.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    /// Parse a canonical label. Matching is exact: "high" is not a canonical level.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.label() == label)
    }

    /// Position in the ordered set, `Low` = 0 through `Very High` = 3.
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sort rank for a stored difficulty value.
///
/// Missing or non-canonical values rank 0, the same as "Low", so they sort
/// first. This is long-standing behavior that clients rely on.
pub fn difficulty_rank(value: Option<&str>) -> u8 {
    value.and_then(Difficulty::parse).map_or(0, Difficulty::rank)
}

/// Ownership labels used by the catalog.
pub const OWNERSHIP_PUBLIC: &str = "Public";
pub const OWNERSHIP_PRIVATE: &str = "Private";

// ---------------------------------------------------------------------------
// Import records
// ---------------------------------------------------------------------------

fn default_difficulty() -> Option<String> {
    Some(Difficulty::Medium.label().to_string())
}

fn default_duration() -> f64 {
    3.0
}

fn default_text() -> Option<String> {
    Some(String::new())
}

/// An institution as it appears in the catalog dataset, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInstitution {
    pub name: String,
    #[serde(default)]
    pub acronym: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "type", default)]
    pub ownership: Option<String>,
    #[serde(default)]
    pub avg_fees: Option<i64>,
    #[serde(default = "default_difficulty")]
    pub difficulty: Option<String>,
    #[serde(default = "default_text")]
    pub description: Option<String>,
    #[serde(default = "default_text")]
    pub admission_requirements: Option<String>,
    #[serde(default)]
    pub programs: Vec<NewProgram>,
    #[serde(default)]
    pub facilities: Vec<String>,
}

impl NewInstitution {
    /// A bare record with import defaults and no children.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            acronym: None,
            region: None,
            location: None,
            ownership: None,
            avg_fees: None,
            difficulty: default_difficulty(),
            description: default_text(),
            admission_requirements: default_text(),
            programs: Vec::new(),
            facilities: Vec::new(),
        }
    }
}

/// A program as it appears in the catalog dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProgram {
    pub name: String,
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default = "default_difficulty")]
    pub program_difficulty: Option<String>,
    #[serde(default = "default_text")]
    pub prospects: Option<String>,
}

impl NewProgram {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration: default_duration(),
            program_difficulty: default_difficulty(),
            prospects: default_text(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stored rows
// ---------------------------------------------------------------------------

/// A stored institution, eagerly joined with its programs and facilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub id: i64,
    pub name: String,
    pub acronym: Option<String>,
    pub region: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub ownership: Option<String>,
    pub avg_fees: Option<i64>,
    pub difficulty: Option<String>,
    pub description: Option<String>,
    pub admission_requirements: Option<String>,
    pub programs: Vec<Program>,
    pub facilities: Vec<Facility>,
}

impl Institution {
    /// Rank of this institution's difficulty for recommendation ordering.
    pub fn difficulty_rank(&self) -> u8 {
        difficulty_rank(self.difficulty.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub institution_id: i64,
    pub name: Option<String>,
    pub duration: Option<f64>,
    pub program_difficulty: Option<String>,
    pub prospects: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: i64,
    pub institution_id: i64,
    pub name: Option<String>,
}
