use sekela_core::dataset::CatalogDataset;
use sekela_core::model::{Difficulty, NewInstitution, NewProgram};
use sekela_core::seed::Seeder;
use sekela_core::storage::{CatalogStore, Session};
use sekela_query::insights::{InsightField, insights};
use sekela_query::wizard::{ANY, WizardPreferences, recommend};

fn seeded_store() -> CatalogStore {
    let dataset = CatalogDataset::builtin().unwrap();
    let store = CatalogStore::in_memory().unwrap();
    let mut session = store.session().unwrap();
    Seeder::new(&dataset).seed(&mut session).unwrap();
    store
}

fn names(session: &Session, prefs: &WizardPreferences) -> Vec<String> {
    recommend(session, prefs)
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect()
}

#[test]
fn test_region_and_fee_conjunction() {
    let store = seeded_store();
    let session = store.session().unwrap();
    let prefs = WizardPreferences {
        region: Some("Arusha".to_string()),
        max_fees: Some(2_000_000),
        ..Default::default()
    };

    let results = recommend(&session, &prefs).unwrap();
    assert!(!results.is_empty());
    for inst in &results {
        assert_eq!(inst.region.as_deref(), Some("Arusha"));
        assert!(inst.avg_fees.unwrap() <= 2_000_000);
    }
    // Medium ranks before High.
    let got: Vec<_> = results.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(
        got,
        vec![
            "Mwalimu Nyerere University of Agriculture and Technology",
            "Nelson Mandela African Institution of Science and Technology",
        ]
    );
}

#[test]
fn test_any_behaves_like_absent() {
    let store = seeded_store();
    let session = store.session().unwrap();

    let with_any = WizardPreferences {
        region: Some(ANY.to_string()),
        ownership: Some("Private".to_string()),
        academic_interest: Some(ANY.to_string()),
        difficulty: Some(ANY.to_string()),
        max_fees: None,
    };
    let without = WizardPreferences {
        ownership: Some("Private".to_string()),
        ..Default::default()
    };
    assert_eq!(names(&session, &with_any), names(&session, &without));
    assert_eq!(names(&session, &without).len(), 18);
}

#[test]
fn test_no_preferences_returns_whole_catalog_ordered() {
    let store = seeded_store();
    let session = store.session().unwrap();
    let results = recommend(&session, &WizardPreferences::default()).unwrap();
    assert_eq!(results.len(), session.count_institutions().unwrap());

    let ranks: Vec<u8> = results.iter().map(|i| i.difficulty_rank()).collect();
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_ties_keep_fetch_order() {
    let store = seeded_store();
    let session = store.session().unwrap();
    let results = recommend(&session, &WizardPreferences::default()).unwrap();
    for pair in results.windows(2) {
        if pair[0].difficulty_rank() == pair[1].difficulty_rank() {
            assert!(pair[0].id < pair[1].id);
        }
    }
}

#[test]
fn test_computer_interest_matches_once() {
    let store = CatalogStore::in_memory().unwrap();
    let mut session = store.session().unwrap();
    let mut udsm = NewInstitution::named("University of Dar es Salaam");
    udsm.programs = vec![
        NewProgram::named("Bachelor of Science in Computer Science"),
        NewProgram::named("Bachelor of Science in Computer Engineering"),
    ];
    session.insert_institution(&udsm).unwrap();
    let mut other = NewInstitution::named("Ardhi University");
    other.programs = vec![NewProgram::named("Bachelor of Architecture")];
    session.insert_institution(&other).unwrap();

    let prefs = WizardPreferences {
        academic_interest: Some("computer".to_string()),
        ..Default::default()
    };
    assert_eq!(names(&session, &prefs), vec!["University of Dar es Salaam"]);
}

#[test]
fn test_difficulty_order_for_mixed_levels() {
    let store = CatalogStore::in_memory().unwrap();
    let mut session = store.session().unwrap();
    for (name, level) in [
        ("H", Difficulty::High),
        ("L", Difficulty::Low),
        ("V", Difficulty::VeryHigh),
        ("M", Difficulty::Medium),
    ] {
        let mut record = NewInstitution::named(name);
        record.difficulty = Some(level.label().to_string());
        session.insert_institution(&record).unwrap();
    }

    let order: Vec<_> = recommend(&session, &WizardPreferences::default())
        .unwrap()
        .into_iter()
        .map(|i| i.difficulty.unwrap())
        .collect();
    assert_eq!(order, vec!["Low", "Medium", "High", "Very High"]);
}

#[test]
fn test_unmatched_preferences_return_empty() {
    let store = seeded_store();
    let session = store.session().unwrap();
    let prefs = WizardPreferences {
        region: Some("Atlantis".to_string()),
        ..Default::default()
    };
    assert!(recommend(&session, &prefs).unwrap().is_empty());
}

#[test]
fn test_exact_difficulty_filter() {
    let store = seeded_store();
    let session = store.session().unwrap();
    let prefs = WizardPreferences {
        difficulty: Some("Very High".to_string()),
        ..Default::default()
    };
    assert_eq!(
        names(&session, &prefs),
        vec!["Muhimbili University of Health and Allied Sciences"]
    );
}

#[test]
fn test_insight_totals_match_catalog() {
    let store = seeded_store();
    let session = store.session().unwrap();
    let total = session.count_institutions().unwrap();

    for field in [InsightField::Region, InsightField::Type, InsightField::Difficulty] {
        let counts = insights(&session, field).unwrap();
        assert_eq!(counts.values().sum::<usize>(), total, "field {field}");
    }

    let types = insights(&session, InsightField::Type).unwrap();
    assert_eq!(types.get(&Some("Public".to_string())), Some(&12));
    assert_eq!(types.get(&Some("Private".to_string())), Some(&18));
}

#[test]
fn test_whitespace_region_is_a_real_constraint() {
    let store = seeded_store();
    let session = store.session().unwrap();
    let prefs = WizardPreferences {
        region: Some(" ".to_string()),
        ..Default::default()
    };
    assert!(recommend(&session, &prefs).unwrap().is_empty());
}
