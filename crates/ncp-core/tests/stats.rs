use jiff::{Timestamp, ToSpan};
use ncp_core::models::care_plan::{CarePlan, CarePlanSections, FormatType, Section};
use ncp_core::models::user::UserRecord;
use ncp_core::stats::{
    format_time_ago, percentage_change, top_diagnoses, truncate_diagnosis_name, DashboardStats,
};

fn now() -> Timestamp {
    "2025-03-15T12:00:00Z".parse().unwrap()
}

fn plan(diagnosis: &str, created_at: Timestamp) -> CarePlan {
    let mut sections = CarePlanSections::default();
    sections.set(Section::Diagnosis, diagnosis);
    let mut plan = CarePlan::new("Plan", FormatType::Seven, sections);
    plan.created_at = created_at;
    plan
}

fn user(email: &str, last_sign_in_at: Option<Timestamp>) -> UserRecord {
    UserRecord {
        id: email.to_string(),
        email: Some(email.to_string()),
        full_name: String::new(),
        created_at: Some(now() - 48.hours()),
        last_sign_in_at,
        email_confirmed: true,
        is_suspended: false,
        is_admin: false,
        admin_level: None,
        ncp_count: 0,
    }
}

#[test]
fn percentage_change_rules() {
    assert_eq!(percentage_change(0, 0), 0.0);
    assert_eq!(percentage_change(3, 0), 100.0);
    assert_eq!(percentage_change(3, 2), 50.0);
    assert_eq!(percentage_change(1, 3), -66.7);
}

#[test]
fn long_diagnosis_names_truncated() {
    let long = "x".repeat(60);
    let cut = truncate_diagnosis_name(&long);
    assert_eq!(cut.len(), 53);
    assert!(cut.ends_with("..."));
    assert_eq!(truncate_diagnosis_name("Acute Pain"), "Acute Pain");
}

#[test]
fn time_ago_units() {
    let now = now();
    assert_eq!(format_time_ago(now - 30.seconds(), now), "Just now");
    assert_eq!(format_time_ago(now - 1.minute(), now), "1 minute ago");
    assert_eq!(format_time_ago(now - 5.minutes(), now), "5 minutes ago");
    assert_eq!(format_time_ago(now - 2.hours(), now), "2 hours ago");
    assert_eq!(format_time_ago(now - 24.hours(), now), "1 day ago");
    assert_eq!(format_time_ago(now - 72.hours(), now), "3 days ago");
}

#[test]
fn top_diagnoses_are_ranked_and_limited() {
    let names = ["A", "B", "B", "C", "C", "C", "D", "E", "F"];
    let top = top_diagnoses(names, names.len() as u64);
    assert_eq!(top.len(), 5);
    assert_eq!(top[0].name, "C");
    assert_eq!(top[0].count, 3);
    assert_eq!(top[0].percentage, 33.3);
    assert_eq!(top[1].name, "B");
}

#[test]
fn dashboard_counts_today_and_yesterday() {
    let now = now();
    let plans = vec![
        plan("Acute Pain", now - 1.hour()),
        plan("Acute Pain", now - 2.hours()),
        plan("Risk for Falls", now - 24.hours()),
        plan("Anxiety", now - (40 * 24).hours()),
    ];
    let users = vec![
        user("ada.king@example.com", Some(now - 24.hours())),
        user("old.user@example.com", Some(now - (40 * 24).hours())),
        user("never@example.com", None),
    ];

    let dash = DashboardStats::compute(&users, &plans, now);

    assert_eq!(dash.stats.total_users, 3);
    assert_eq!(dash.stats.active_users, 1);
    assert_eq!(dash.stats.total_ncps, 4);
    assert_eq!(dash.stats.ncps_today, 2);
    assert_eq!(dash.stats.today_vs_yesterday, 100.0);
    assert_eq!(dash.chart_data.len(), 30);
    assert_eq!(dash.chart_data.last().unwrap().date, "Mar 15");
    assert_eq!(dash.chart_data.last().unwrap().count, 2);
    assert_eq!(dash.top_diagnoses[0].name, "Acute Pain");
    assert!(dash.recent_activity.len() <= 8);

    let json = serde_json::to_value(&dash).unwrap();
    assert!(json["stats"].get("totalNCPs").is_some());
    assert!(json.get("recentActivity").is_some());
}
