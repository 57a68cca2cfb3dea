//! Admin dashboard statistics.
//!
//! Everything here is computed from plain records so the API only has to
//! gather users and care plans.

use std::collections::HashMap;

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{Timestamp, ToSpan};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::care_plan::CarePlan;
use crate::models::user::UserRecord;

pub const ACTIVE_WINDOW_DAYS: i64 = 30;
pub const CHART_DAYS: i64 = 30;
pub const TOP_DIAGNOSES: usize = 5;
pub const DIAGNOSIS_NAME_CHARS: usize = 50;
const RECENT_USERS: usize = 3;
const RECENT_NCPS: usize = 3;
const RECENT_ACTIVITY: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Totals {
    pub total_users: u64,
    pub active_users: u64,
    #[serde(rename = "totalNCPs")]
    pub total_ncps: u64,
    pub ncps_this_month: u64,
    pub ncps_today: u64,
    pub today_vs_yesterday: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChartPoint {
    /// `Jan 05`
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiagnosisShare {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ActivityKind {
    User,
    Ncp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub user_initials: String,
    pub description: String,
    pub time: String,
    #[serde(skip)]
    #[ts(skip)]
    at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SystemHealthSummary {
    pub status: String,
    pub uptime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub stats: Totals,
    pub system_health: SystemHealthSummary,
    pub chart_data: Vec<ChartPoint>,
    pub top_diagnoses: Vec<DiagnosisShare>,
    pub recent_activity: Vec<Activity>,
}

impl DashboardStats {
    /// Build the dashboard from every known user and plan as of `now` (UTC days).
    pub fn compute(users: &[UserRecord], plans: &[CarePlan], now: Timestamp) -> Self {
        let today = utc_date(now);
        let yesterday = today.checked_sub(1.day()).unwrap_or(today);
        let active_cutoff = now
            .checked_sub((ACTIVE_WINDOW_DAYS * 24).hours())
            .unwrap_or(Timestamp::MIN);

        let active_users = users
            .iter()
            .filter(|u| u.last_sign_in_at.is_some_and(|t| t >= active_cutoff))
            .count() as u64;

        let mut per_day: HashMap<Date, u64> = HashMap::new();
        for plan in plans {
            *per_day.entry(utc_date(plan.created_at)).or_default() += 1;
        }
        let on = |d: Date| per_day.get(&d).copied().unwrap_or(0);

        let ncps_today = on(today);
        let ncps_yesterday = on(yesterday);
        let ncps_this_month = per_day
            .iter()
            .filter(|(d, _)| d.year() == today.year() && d.month() == today.month() && **d <= today)
            .map(|(_, n)| n)
            .sum();

        let chart_data = (0..CHART_DAYS)
            .rev()
            .filter_map(|back| today.checked_sub(back.days()).ok())
            .map(|day| ChartPoint {
                date: day.strftime("%b %d").to_string(),
                count: on(day),
            })
            .collect();

        let total_ncps = plans.len() as u64;

        Self {
            stats: Totals {
                total_users: users.len() as u64,
                active_users,
                total_ncps,
                ncps_this_month,
                ncps_today,
                today_vs_yesterday: percentage_change(ncps_today, ncps_yesterday),
            },
            system_health: SystemHealthSummary {
                status: "healthy".to_string(),
                uptime: "All systems operational".to_string(),
            },
            chart_data,
            top_diagnoses: top_diagnoses(plans.iter().filter_map(CarePlan::diagnosis_name), total_ncps),
            recent_activity: recent_activity(users, plans, now),
        }
    }
}

fn utc_date(ts: Timestamp) -> Date {
    ts.to_zoned(TimeZone::UTC).date()
}

/// Today versus yesterday as a percentage, one decimal place. A rise from
/// zero reads as 100; no plans on either day reads as 0.
pub fn percentage_change(today: u64, yesterday: u64) -> f64 {
    if yesterday > 0 {
        let change = (today as f64 - yesterday as f64) / yesterday as f64 * 100.0;
        (change * 10.0).round() / 10.0
    } else if today > 0 {
        100.0
    } else {
        0.0
    }
}

/// Cut a diagnosis name to 50 characters plus `...`.
pub fn truncate_diagnosis_name(name: &str) -> String {
    if name.chars().count() > DIAGNOSIS_NAME_CHARS {
        let head: String = name.chars().take(DIAGNOSIS_NAME_CHARS).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

/// The five most frequent diagnosis names with their share of `total`.
/// Ties are broken alphabetically.
pub fn top_diagnoses<'a>(names: impl IntoIterator<Item = &'a str>, total: u64) -> Vec<DiagnosisShare> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }

    let mut sorted: Vec<(&str, u64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    sorted
        .into_iter()
        .take(TOP_DIAGNOSES)
        .map(|(name, count)| DiagnosisShare {
            name: truncate_diagnosis_name(name),
            count,
            percentage: if total > 0 {
                (count as f64 / total as f64 * 1000.0).round() / 10.0
            } else {
                0.0
            },
        })
        .collect()
}

/// `N days ago`, `N hours ago`, `N minutes ago` or `Just now`.
pub fn format_time_ago(at: Timestamp, now: Timestamp) -> String {
    let secs = (now.as_second() - at.as_second()).max(0);
    let (n, unit) = if secs >= 86_400 {
        (secs / 86_400, "day")
    } else if secs >= 3_600 {
        (secs / 3_600, "hour")
    } else if secs >= 60 {
        (secs / 60, "minute")
    } else {
        return "Just now".to_string();
    };
    let plural = if n > 1 { "s" } else { "" };
    format!("{n} {unit}{plural} ago")
}

fn initials(email: Option<&str>) -> String {
    match email {
        Some(e) if !e.is_empty() => e.chars().take(2).collect::<String>().to_uppercase(),
        _ => "U".to_string(),
    }
}

/// Newest users and plans, newest first.
fn recent_activity(users: &[UserRecord], plans: &[CarePlan], now: Timestamp) -> Vec<Activity> {
    let mut users: Vec<&UserRecord> = users.iter().collect();
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut plans: Vec<&CarePlan> = plans.iter().collect();
    plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut activity: Vec<Activity> = users
        .into_iter()
        .take(RECENT_USERS)
        .map(|u| {
            let email = u.email.as_deref().unwrap_or("Unknown");
            Activity {
                id: format!("user-{}", u.id),
                kind: ActivityKind::User,
                user_initials: initials(u.email.as_deref()),
                description: format!("New user registered: {email}"),
                time: u
                    .created_at
                    .map(|t| format_time_ago(t, now))
                    .unwrap_or_else(|| "Unknown".to_string()),
                at: u.created_at,
            }
        })
        .chain(plans.into_iter().take(RECENT_NCPS).map(|p| Activity {
            id: format!("ncp-{}", p.id),
            kind: ActivityKind::Ncp,
            user_initials: "NC".to_string(),
            description: "New NCP generated".to_string(),
            time: format_time_ago(p.created_at, now),
            at: Some(p.created_at),
        }))
        .collect();

    activity.sort_by(|a, b| b.at.cmp(&a.at));
    activity.truncate(RECENT_ACTIVITY);
    activity
}
