use std::collections::BTreeMap;

use ncp_core::models::assessment::{AssessmentPayload, SectionValue};
use ncp_core::models::diagnosis::NnnEntry;
use ncp_search::index::{build_index, load_index};
use ncp_search::keywords::assessment_keywords;
use ncp_search::query::{find_by_id, find_by_name, find_candidates, DEFAULT_CANDIDATES};
use ncp_storage::ncps::save_lookup_table;
use ncp_storage::store::Store;

fn entry(id: &str, diagnosis: &str, characteristics: &[&str]) -> NnnEntry {
    NnnEntry {
        id: id.to_string(),
        diagnosis: diagnosis.to_string(),
        definition: None,
        defining_characteristics: characteristics.iter().map(|s| s.to_string()).collect(),
        related_factors: Vec::new(),
        risk_factors: Vec::new(),
        suggested_outcomes: vec!["Pain Level".to_string()],
        suggested_interventions: vec!["Pain Management".to_string()],
    }
}

fn table() -> Vec<NnnEntry> {
    vec![
        entry("1", "Acute Pain", &["guarding behavior", "expressive behavior", "self-report of pain"]),
        entry("2", "Ineffective Breathing Pattern", &["dyspnea", "use of accessory muscles"]),
        entry("3", "Anxiety", &["restlessness", "worried", "insomnia"]),
    ]
}

#[test]
fn candidates_rank_matching_entry_first() {
    let lookup = build_index(table()).unwrap();
    let found = find_candidates(&lookup, "dyspnea accessory muscles", DEFAULT_CANDIDATES).unwrap();
    assert!(!found.is_empty());
    assert_eq!(found[0].entry.diagnosis, "Ineffective Breathing Pattern");
    assert_eq!(found[0].entry.suggested_outcomes, vec!["Pain Level"]);
}

#[test]
fn limit_is_respected() {
    let lookup = build_index(table()).unwrap();
    let found = find_candidates(&lookup, "pain dyspnea restlessness", 2).unwrap();
    assert!(found.len() <= 2);
}

#[test]
fn malformed_query_is_tolerated() {
    let lookup = build_index(table()).unwrap();
    let found = find_candidates(&lookup, "pain AND (", DEFAULT_CANDIDATES).unwrap();
    assert_eq!(found[0].entry.diagnosis, "Acute Pain");
}

#[test]
fn empty_keywords_or_index_give_no_candidates() {
    let lookup = build_index(table()).unwrap();
    assert!(find_candidates(&lookup, "   ", DEFAULT_CANDIDATES).unwrap().is_empty());

    let empty = build_index(Vec::new()).unwrap();
    assert!(find_candidates(&empty, "pain", DEFAULT_CANDIDATES).unwrap().is_empty());
}

#[test]
fn lookup_by_id_and_name() {
    let lookup = build_index(table()).unwrap();
    assert_eq!(find_by_id(&lookup, "3").unwrap().unwrap().diagnosis, "Anxiety");
    assert!(find_by_id(&lookup, "99").unwrap().is_none());
    assert_eq!(find_by_name(&lookup, "  acute pain ").unwrap().id, "1");
    assert!(find_by_name(&lookup, "Acute").is_none());
}

#[test]
fn keywords_drop_stopwords_and_duplicates() {
    let mut subjective = BTreeMap::new();
    subjective.insert(
        "statements".to_string(),
        SectionValue::Lines(vec!["Patient reports pain in the abdomen".to_string()]),
    );
    let mut objective = BTreeMap::new();
    objective.insert(
        "observations".to_string(),
        SectionValue::Lines(vec!["Guarding of abdomen, HR 112".to_string()]),
    );
    let mut data = BTreeMap::new();
    data.insert("subjective".to_string(), subjective);
    data.insert("objective".to_string(), objective);

    let payload = AssessmentPayload {
        data,
        ..Default::default()
    };
    assert_eq!(assessment_keywords(&payload), "pain abdomen guarding");
}

#[tokio::test]
async fn load_index_reads_table_from_store() {
    let store = Store::in_memory();
    assert!(load_index(&store).await.unwrap().is_empty());

    save_lookup_table(&store, &table()).await.unwrap();
    let lookup = load_index(&store).await.unwrap();
    assert_eq!(lookup.len(), 3);
}
