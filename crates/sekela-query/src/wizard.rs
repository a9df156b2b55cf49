//! Wizard: preference-driven university recommendations.
//!
//! Every supplied preference must hold (AND semantics). Results are ordered by
//! ascending difficulty rank; ties keep the store's fetch order.

use sekela_core::Result;
use sekela_core::model::Institution;
use sekela_core::storage::{InstitutionFilter, Session};
use serde::{Deserialize, Serialize};

/// Sentinel meaning "no constraint on this field".
pub const ANY: &str = "Any";

/// Sparse preferences submitted by the wizard. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardPreferences {
    #[serde(default)]
    pub region: Option<String>,
    /// Ownership type, "Public" or "Private".
    #[serde(rename = "type", default)]
    pub ownership: Option<String>,
    /// Inclusive upper bound on average annual fees. Zero means no bound.
    #[serde(default)]
    pub max_fees: Option<i64>,
    /// Matched case-insensitively against program names.
    #[serde(default)]
    pub academic_interest: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl WizardPreferences {
    /// Translate preferences into a store predicate, dropping inactive fields.
    pub fn to_filter(&self) -> InstitutionFilter {
        InstitutionFilter {
            region: active(self.region.as_deref()),
            ownership: active(self.ownership.as_deref()),
            max_fees: self.max_fees.filter(|&fees| fees != 0),
            difficulty: active(self.difficulty.as_deref()),
            program_name_contains: active(self.academic_interest.as_deref()),
        }
    }
}

/// `None`, the empty string, and the `"Any"` sentinel mean unconstrained.
///
/// Whitespace is not trimmed, so `"  "` still filters.
fn active(value: Option<&str>) -> Option<String> {
    match value {
        Some(v) if !v.is_empty() && v != ANY => Some(v.to_string()),
        _ => None,
    }
}

/// Stable sort by difficulty rank. Unknown difficulties rank with "Low".
pub fn rank_by_difficulty(institutions: &mut [Institution]) {
    institutions.sort_by_key(Institution::difficulty_rank);
}

/// Run the wizard against the catalog.
pub fn recommend(session: &Session, prefs: &WizardPreferences) -> Result<Vec<Institution>> {
    let filter = prefs.to_filter();
    tracing::debug!(?filter, "wizard recommendation");
    let mut results = session.query(&filter)?;
    rank_by_difficulty(&mut results);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn institution(id: i64, difficulty: Option<&str>) -> Institution {
        Institution {
            id,
            name: format!("Institution {id}"),
            acronym: None,
            region: None,
            location: None,
            ownership: None,
            avg_fees: None,
            difficulty: difficulty.map(String::from),
            description: None,
            admission_requirements: None,
            programs: Vec::new(),
            facilities: Vec::new(),
        }
    }

    #[test]
    fn test_any_sentinel_is_inactive() {
        let prefs = WizardPreferences {
            region: Some(ANY.to_string()),
            ownership: Some(ANY.to_string()),
            academic_interest: Some(ANY.to_string()),
            difficulty: Some(ANY.to_string()),
            max_fees: None,
        };
        assert!(prefs.to_filter().is_empty());
        assert_eq!(prefs.to_filter(), WizardPreferences::default().to_filter());
    }

    #[test]
    fn test_empty_and_zero_are_inactive() {
        let prefs = WizardPreferences {
            region: Some(String::new()),
            academic_interest: Some(String::new()),
            max_fees: Some(0),
            ..Default::default()
        };
        assert!(prefs.to_filter().is_empty());
    }

    #[test]
    fn test_whitespace_still_filters() {
        let prefs = WizardPreferences {
            region: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(prefs.to_filter().region.as_deref(), Some("  "));
    }

    #[test]
    fn test_active_fields_carry_through() {
        let prefs = WizardPreferences {
            region: Some("Arusha".to_string()),
            ownership: Some("Public".to_string()),
            max_fees: Some(2_000_000),
            academic_interest: Some("computer".to_string()),
            difficulty: Some("High".to_string()),
        };
        let filter = prefs.to_filter();
        assert_eq!(filter.region.as_deref(), Some("Arusha"));
        assert_eq!(filter.ownership.as_deref(), Some("Public"));
        assert_eq!(filter.max_fees, Some(2_000_000));
        assert_eq!(filter.program_name_contains.as_deref(), Some("computer"));
        assert_eq!(filter.difficulty.as_deref(), Some("High"));
    }

    #[test]
    fn test_rank_orders_by_difficulty() {
        let mut list = vec![
            institution(1, Some("High")),
            institution(2, Some("Low")),
            institution(3, Some("Very High")),
            institution(4, Some("Medium")),
        ];
        rank_by_difficulty(&mut list);
        let order: Vec<_> = list.iter().map(|i| i.difficulty.as_deref().unwrap()).collect();
        assert_eq!(order, vec!["Low", "Medium", "High", "Very High"]);
    }

    #[test]
    fn test_rank_is_stable_and_unknown_sorts_first() {
        let mut list = vec![
            institution(1, Some("Medium")),
            institution(2, Some("Extreme")),
            institution(3, Some("Low")),
            institution(4, None),
            institution(5, Some("Medium")),
        ];
        rank_by_difficulty(&mut list);
        let ids: Vec<_> = list.iter().map(|i| i.id).collect();
        // Rank 0 group keeps fetch order: Extreme(2), Low(3), None(4).
        assert_eq!(ids, vec![2, 3, 4, 1, 5]);
    }

    #[test]
    fn test_preferences_json_uses_type_key() {
        let prefs: WizardPreferences =
            serde_json::from_str(r#"{"type": "Private", "max_fees": 3000000}"#).unwrap();
        assert_eq!(prefs.ownership.as_deref(), Some("Private"));
        assert_eq!(prefs.max_fees, Some(3_000_000));
        assert!(prefs.region.is_none());
    }
}
