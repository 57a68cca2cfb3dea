//! Plain-text rendering for terminal output.

use std::collections::BTreeMap;
use std::fmt::Write;

use ncp_auth::flows::Profile;
use ncp_client::GenerationOutcome;
use ncp_core::health::{ComponentStatus, SystemHealth};
use ncp_core::models::care_plan::CarePlan;
use ncp_core::models::diagnosis::NcpValidationResult;
use ncp_core::models::explanation::Explanation;
use ncp_core::models::user::UserRecord;
use ncp_core::progress::ProgressSnapshot;
use ncp_core::stats::DashboardStats;

const BAR_WIDTH: usize = 20;

/// `Generating care plan [#########-----------]  45% (0:54)`
pub fn progress_line(snapshot: &ProgressSnapshot) -> String {
    let filled = usize::from(snapshot.percent) * BAR_WIDTH / 100;
    format!(
        "{} [{}{}] {:>3}% ({})",
        snapshot.kind.label(),
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        snapshot.percent,
        snapshot.elapsed_display()
    )
}

pub fn field_errors(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("  {field}: {message}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn plan_text(plan: &CarePlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", plan.title);
    let _ = writeln!(out, "id: {}  format: {} columns  updated: {}", plan.id, plan.format_type, plan.updated_at);
    for (section, content) in plan.visible_sections() {
        let _ = writeln!(out, "\n== {} ==", section.title());
        if content.trim().is_empty() {
            let _ = writeln!(out, "(empty)");
        } else {
            let _ = writeln!(out, "{}", content.trim_end());
        }
    }
    out
}

pub fn plan_row(plan: &CarePlan) -> String {
    let created = plan.created_at.strftime("%Y-%m-%d %H:%M");
    format!("{}  {}  {}", plan.id, created, plan.title)
}

pub fn outcome_text(outcome: &GenerationOutcome) -> String {
    match outcome {
        GenerationOutcome::Complete { plan, diagnosis, .. } => {
            let mut out = String::new();
            if let Some(reasoning) = diagnosis.as_ref().map(|d| d.reasoning.trim()).filter(|r| !r.is_empty()) {
                let _ = writeln!(out, "Diagnosis reasoning: {reasoning}\n");
            }
            out.push_str(&plan_text(plan));
            out
        }
        GenerationOutcome::Partial { diagnosis, message, .. } => {
            let mut out = String::from("Partial result: no care plan was generated.\n");
            if let Some(diagnosis) = diagnosis {
                match diagnosis.name() {
                    Some(name) => {
                        let _ = writeln!(out, "Selected diagnosis: {name}");
                    }
                    None => {
                        let _ = writeln!(out, "No diagnosis could be selected.");
                    }
                }
                if !diagnosis.reasoning.trim().is_empty() {
                    let _ = writeln!(out, "Reasoning: {}", diagnosis.reasoning.trim());
                }
            }
            if let Some(message) = message.as_deref().filter(|m| !m.trim().is_empty()) {
                let _ = writeln!(out, "{message}");
            }
            out
        }
    }
}

pub fn explanation_text(plan: &CarePlan, explanation: &Explanation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Explanation for {}", plan.title);
    for section in plan.format_type.available_sections() {
        let Some(entry) = explanation.get(*section) else {
            continue;
        };
        let _ = writeln!(out, "\n== {} ==", section.title());
        for (label, text) in entry.parts() {
            if !text.trim().is_empty() {
                let _ = writeln!(out, "{label}: {}", text.trim());
            }
        }
    }
    let missing = explanation.missing(plan.format_type);
    if !missing.is_empty() {
        let names: Vec<_> = missing.iter().map(|s| s.title()).collect();
        let _ = writeln!(out, "\nNot explained: {}", names.join(", "));
    }
    out
}

pub fn validation_text(result: &NcpValidationResult) -> String {
    let mut out = String::new();
    let verdict = if result.is_valid { "Valid" } else { "Needs work" };
    let _ = writeln!(out, "{verdict}: {}", result.feedback);
    for suggestion in &result.suggestions {
        let _ = writeln!(out, "  - {suggestion}");
    }
    out
}

pub fn stats_text(stats: &DashboardStats) -> String {
    let t = &stats.stats;
    let mut out = String::new();
    let _ = writeln!(out, "Users: {} total, {} active (30 days)", t.total_users, t.active_users);
    let _ = writeln!(
        out,
        "NCPs: {} total, {} this month, {} today ({:+.1}% vs yesterday)",
        t.total_ncps, t.ncps_this_month, t.ncps_today, t.today_vs_yesterday
    );
    let _ = writeln!(out, "System: {} (uptime {})", stats.system_health.status, stats.system_health.uptime);
    if !stats.top_diagnoses.is_empty() {
        let _ = writeln!(out, "\nTop diagnoses:");
        for d in &stats.top_diagnoses {
            let _ = writeln!(out, "  {:>5.1}%  {:>4}  {}", d.percentage, d.count, d.name);
        }
    }
    if !stats.recent_activity.is_empty() {
        let _ = writeln!(out, "\nRecent activity:");
        for a in &stats.recent_activity {
            let _ = writeln!(out, "  [{}] {} ({})", a.user_initials, a.description, a.time);
        }
    }
    out
}

pub fn users_table(users: &[UserRecord]) -> String {
    if users.is_empty() {
        return "No users found.\n".to_string();
    }
    let mut out = String::new();
    for u in users {
        let role = match (u.is_admin, u.admin_level) {
            (true, Some(level)) => format!("admin ({level})"),
            (true, None) => "admin".to_string(),
            (false, _) => "user".to_string(),
        };
        let status = if u.is_suspended { "suspended" } else { "active" };
        let _ = writeln!(
            out,
            "{}  {:<30}  {:<24}  {:<16}  {:<9}  {} NCPs",
            u.id,
            u.email.as_deref().unwrap_or("-"),
            u.full_name,
            role,
            status,
            u.ncp_count
        );
    }
    out
}

fn component_line(out: &mut String, name: &str, status: &ComponentStatus) {
    let mark = if status.is_healthy() { "ok " } else { "ERR" };
    let _ = writeln!(out, "  [{mark}] {name:<8} {}", status.message);
}

pub fn health_text(health: &SystemHealth) -> String {
    let mut out = String::new();
    let info = &health.system_info;
    let _ = writeln!(out, "{} v{} (uptime {})", info.environment, info.version, info.uptime);
    component_line(&mut out, "backend", &health.health.backend);
    component_line(&mut out, "storage", &health.health.storage);
    component_line(&mut out, "claude", &health.health.claude);
    component_line(&mut out, "gemini", &health.health.gemini);
    let m = &health.health.metrics;
    let _ = writeln!(
        out,
        "Requests: {} total, {:.1}% successful, {} ms average",
        m.total_requests, m.success_rate, m.avg_response_time
    );
    if !health.error_logs.is_empty() {
        let _ = writeln!(out, "\nErrors (last 24h):");
        for e in &health.error_logs {
            let _ = writeln!(out, "  {} {} {}: {}", e.timestamp, e.request_id, e.step, e.message);
        }
    }
    out
}

pub fn profile_text(profile: &Profile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "user:  {}", profile.username);
    let _ = writeln!(out, "email: {}", profile.email.as_deref().unwrap_or("-"));
    let name: Vec<&str> = [&profile.first_name, &profile.last_name]
        .into_iter()
        .filter_map(|n| n.as_deref())
        .collect();
    if !name.is_empty() {
        let _ = writeln!(out, "name:  {}", name.join(" "));
    }
    let mut custom: Vec<_> = profile
        .attributes
        .iter()
        .filter_map(|(k, v)| k.strip_prefix("custom:").map(|k| (k, v)))
        .collect();
    custom.sort();
    for (key, value) in custom {
        let _ = writeln!(out, "{key}: {value}");
    }
    out
}
