use std::collections::BTreeMap;

use ncp_core::models::care_plan::{CarePlan, CarePlanSections, FormatType};
use ncp_core::models::explanation::{Explanation, SectionExplanation};
use ncp_core::models::care_plan::Section;
use ncp_core::models::transaction::ProviderKind;
use ncp_storage::ncps;
use ncp_storage::state::{load_state, load_state_opt, save_state};
use ncp_storage::store::Store;

fn plan(owner: &str, title: &str) -> CarePlan {
    let mut plan = CarePlan::new(title, FormatType::Four, CarePlanSections::default());
    plan.user_id = Some(owner.to_string());
    plan
}

#[tokio::test]
async fn missing_key_is_not_found() {
    let store = Store::in_memory();
    let err = store.get("nope.json").await.unwrap_err();
    assert!(err.is_not_found());

    let opt: Option<serde_json::Value> = load_state_opt(&store, "nope.json").await.unwrap();
    assert!(opt.is_none());
}

#[tokio::test]
async fn state_round_trips_json() {
    let store = Store::in_memory();
    save_state(&store, "settings/x.json", &serde_json::json!({"a": 1})).await.unwrap();
    let value: serde_json::Value = load_state(&store, "settings/x.json").await.unwrap();
    assert_eq!(value["a"], 1);
}

#[tokio::test]
async fn list_only_returns_prefix() {
    let store = Store::in_memory();
    for key in ["ncps/a.json", "ncps/b.json", "ncpsx/c.json", "other/d.json"] {
        store.put(key, b"{}".to_vec(), None).await.unwrap();
    }
    assert_eq!(store.list("ncps/").await.unwrap(), vec!["ncps/a.json", "ncps/b.json"]);
}

#[tokio::test]
async fn list_ncps_filters_by_owner_newest_first() {
    let store = Store::in_memory();
    let mut older = plan("u1", "older");
    older.created_at = jiff::Timestamp::from_second(1_000).unwrap();
    let newer = plan("u1", "newer");
    let other = plan("u2", "other");

    for p in [&older, &newer, &other] {
        ncps::save_ncp(&store, p).await.unwrap();
    }
    // Junk under the prefix is skipped.
    store.put("ncps/notes.txt", b"hello".to_vec(), None).await.unwrap();

    let mine = ncps::list_ncps(&store, Some("u1")).await.unwrap();
    assert_eq!(mine.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(), ["newer", "older"]);
    assert_eq!(ncps::list_ncps(&store, None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn delete_ncp_removes_explanation() {
    let store = Store::in_memory();
    let p = plan("u1", "plan");
    ncps::save_ncp(&store, &p).await.unwrap();

    let mut sections = BTreeMap::new();
    sections.insert(
        Section::Assessment,
        SectionExplanation {
            clinical_reasoning: "Cues gathered first".to_string(),
            evidence_based_support: "Guidelines".to_string(),
            student_guidance: "Look for patterns".to_string(),
        },
    );
    let explanation = Explanation {
        ncp_id: p.id,
        sections,
        model_id: None,
        generated_at: jiff::Timestamp::now(),
    };
    ncps::save_explanation(&store, &explanation).await.unwrap();
    assert!(ncps::load_explanation(&store, p.id).await.unwrap().is_some());

    ncps::delete_ncp(&store, p.id).await.unwrap();
    assert!(ncps::load_ncp(&store, p.id).await.unwrap_err().is_not_found());
    assert!(ncps::load_explanation(&store, p.id).await.unwrap().is_none());
}

#[tokio::test]
async fn provider_setting_persists() {
    let store = Store::in_memory();
    assert_eq!(ncps::load_provider_setting(&store).await.unwrap(), None);
    ncps::save_provider_setting(&store, ProviderKind::Gemini).await.unwrap();
    assert_eq!(
        ncps::load_provider_setting(&store).await.unwrap(),
        Some(ProviderKind::Gemini)
    );
}

#[tokio::test]
async fn missing_lookup_table_is_empty() {
    let store = Store::in_memory();
    assert!(ncps::load_lookup_table(&store).await.unwrap().is_empty());
}
