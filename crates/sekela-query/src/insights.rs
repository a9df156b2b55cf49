//! Frequency counts over a categorical institution field.

use sekela_core::Result;
use sekela_core::model::Institution;
use sekela_core::storage::Session;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Count per distinct value. `None` is the bucket for institutions with no value.
pub type Histogram = BTreeMap<Option<String>, usize>;

/// JSON key used for the `None` bucket.
pub const NULL_KEY: &str = "null";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightField {
    Region,
    Type,
    Difficulty,
}

impl InsightField {
    pub fn value_of(self, institution: &Institution) -> Option<&str> {
        match self {
            Self::Region => institution.region.as_deref(),
            Self::Type => institution.ownership.as_deref(),
            Self::Difficulty => institution.difficulty.as_deref(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Region => "regions",
            Self::Type => "types",
            Self::Difficulty => "difficulty",
        }
    }
}

impl fmt::Display for InsightField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsightField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "region" | "regions" => Ok(Self::Region),
            "type" | "types" => Ok(Self::Type),
            "difficulty" | "difficulties" => Ok(Self::Difficulty),
            other => Err(format!(
                "unknown insight field '{other}': expected regions, types or difficulty"
            )),
        }
    }
}

/// Count `field` values across `institutions`.
pub fn histogram<'a>(
    institutions: impl IntoIterator<Item = &'a Institution>,
    field: InsightField,
) -> Histogram {
    let mut counts = Histogram::new();
    for inst in institutions {
        *counts
            .entry(field.value_of(inst).map(String::from))
            .or_default() += 1;
    }
    counts
}

/// Histogram of `field` over the full catalog at call time.
pub fn insights(session: &Session, field: InsightField) -> Result<Histogram> {
    let all = session.all()?;
    Ok(histogram(&all, field))
}

/// Render a histogram as a JSON object, with the `None` bucket keyed `"null"`.
///
/// A stored value spelled `"null"` shares that key, and the two counts are summed so
/// the object's counts still add up to the catalog size.
pub fn histogram_to_json(histogram: &Histogram) -> Value {
    let mut merged: BTreeMap<&str, usize> = BTreeMap::new();
    for (key, count) in histogram {
        *merged.entry(key.as_deref().unwrap_or(NULL_KEY)).or_default() += count;
    }
    let map: Map<String, Value> = merged
        .into_iter()
        .map(|(key, count)| (key.to_string(), Value::from(count)))
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn institution(region: Option<&str>, difficulty: Option<&str>) -> Institution {
        Institution {
            id: 0,
            name: String::new(),
            acronym: None,
            region: region.map(String::from),
            location: None,
            ownership: Some("Public".to_string()),
            avg_fees: None,
            difficulty: difficulty.map(String::from),
            description: None,
            admission_requirements: None,
            programs: Vec::new(),
            facilities: Vec::new(),
        }
    }

    #[test]
    fn test_histogram_counts_none_bucket() {
        let list = vec![
            institution(Some("Arusha"), Some("High")),
            institution(Some("Arusha"), Some("Medium")),
            institution(None, Some("Medium")),
        ];
        let counts = histogram(&list, InsightField::Region);
        assert_eq!(counts.get(&Some("Arusha".to_string())), Some(&2));
        assert_eq!(counts.get(&None), Some(&1));
        assert_eq!(counts.values().sum::<usize>(), list.len());
    }

    #[test]
    fn test_histogram_json_null_key() {
        let list = vec![institution(None, None), institution(Some("Mbeya"), None)];
        let json = histogram_to_json(&histogram(&list, InsightField::Region));
        assert_eq!(json["null"], 1);
        assert_eq!(json["Mbeya"], 1);
    }

    #[test]
    fn test_histogram_json_null_string_keeps_total() {
        let list = vec![
            institution(None, None),
            institution(Some("null"), None),
            institution(Some("Arusha"), None),
        ];
        let json = histogram_to_json(&histogram(&list, InsightField::Region));
        assert_eq!(json["null"], 2);
        let total: u64 = json
            .as_object()
            .unwrap()
            .values()
            .map(|v| v.as_u64().unwrap())
            .sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_field_parse() {
        assert_eq!("regions".parse::<InsightField>(), Ok(InsightField::Region));
        assert_eq!("Types".parse::<InsightField>(), Ok(InsightField::Type));
        assert_eq!("difficulty".parse::<InsightField>(), Ok(InsightField::Difficulty));
        assert!("fees".parse::<InsightField>().is_err());
    }

    #[test]
    fn test_empty_catalog_is_empty_histogram() {
        let counts = histogram(&Vec::<Institution>::new(), InsightField::Type);
        assert!(counts.is_empty());
    }
}
