use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::care_plan::{FormatType, Section};

/// Teaching notes for one NCP section. The three fields are fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SectionExplanation {
    pub clinical_reasoning: String,
    pub evidence_based_support: String,
    pub student_guidance: String,
}

impl SectionExplanation {
    /// `(label, text)` for each of the three sub-fields, in display order.
    pub fn parts(&self) -> [(&'static str, &str); 3] {
        [
            ("Clinical Reasoning", self.clinical_reasoning.as_str()),
            ("Evidence-Based Support", self.evidence_based_support.as_str()),
            ("Student Guidance", self.student_guidance.as_str()),
        ]
    }

    pub fn is_blank(&self) -> bool {
        self.parts().iter().all(|(_, text)| text.trim().is_empty())
    }
}

/// Explanation of a care plan, one entry per explained section.
/// Associated 1:1 with an NCP through `ncp_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Explanation {
    pub ncp_id: Uuid,
    pub sections: BTreeMap<Section, SectionExplanation>,
    #[serde(default)]
    pub model_id: Option<String>,
    pub generated_at: jiff::Timestamp,
}

impl Explanation {
    pub fn get(&self, section: Section) -> Option<&SectionExplanation> {
        self.sections.get(&section)
    }

    /// Sections of `format` with no (or only blank) explanation.
    pub fn missing(&self, format: FormatType) -> Vec<Section> {
        format
            .available_sections()
            .iter()
            .copied()
            .filter(|s| self.get(*s).is_none_or(SectionExplanation::is_blank))
            .collect()
    }
}
