use ncp_core::models::care_plan::CarePlan;
use ncp_core::models::explanation::Explanation;

use crate::error::ExportError;

pub const CSV_HEADER: [&str; 2] = ["Section", "Content"];

/// CSV with one row per displayed section. Explanation parts, when
/// supplied, follow as `<Section> - <Part>` rows.
pub fn generate_csv(plan: &CarePlan, explanation: Option<&Explanation>) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for (section, content) in plan.visible_sections() {
        writer.write_record([section.title(), content.trim()])?;
    }

    if let Some(explanation) = explanation {
        for (section, _) in plan.visible_sections() {
            let Some(notes) = explanation.get(section) else {
                continue;
            };
            for (label, text) in notes.parts() {
                if text.trim().is_empty() {
                    continue;
                }
                writer.write_record([format!("{} - {label}", section.title()).as_str(), text.trim()])?;
            }
        }
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))
}
