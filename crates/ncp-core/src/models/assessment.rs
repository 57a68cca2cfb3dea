use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::care_plan::FormatType;

/// Free-text assessment entered as two blocks of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ManualAssessment {
    pub subjective: String,
    pub objective: String,
}

/// Vital signs captured by the assistant form. Values are kept as the
/// nurse typed them (units included).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Vitals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain_score: Option<String>,
}

impl Vitals {
    /// Labelled `(name, value)` pairs for every vital that was recorded.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("temperature", &self.temperature),
            ("heart_rate", &self.heart_rate),
            ("respiratory_rate", &self.respiratory_rate),
            ("blood_pressure", &self.blood_pressure),
            ("oxygen_saturation", &self.oxygen_saturation),
            ("pain_score", &self.pain_score),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (name, v))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Structured assessment entered through the guided form.
///
/// `primary_symptoms` and `exam_findings` are required; the other two text
/// fields are optional and skipped by validation when blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssistantAssessment {
    pub primary_symptoms: String,
    #[serde(default)]
    pub other_symptoms: Option<String>,
    pub exam_findings: String,
    #[serde(default)]
    pub vitals: Vitals,
    #[serde(default)]
    pub other_findings: Option<String>,
}

/// Assessment input in either entry mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "mode", rename_all = "snake_case")]
#[ts(export)]
pub enum AssessmentInput {
    Manual(ManualAssessment),
    Assistant(AssistantAssessment),
}

impl AssessmentInput {
    pub fn mode_name(&self) -> &'static str {
        match self {
            AssessmentInput::Manual(_) => "manual",
            AssessmentInput::Assistant(_) => "assistant",
        }
    }

    /// Convert to the wire payload accepted by `POST /generate-ncp`.
    pub fn to_payload(&self, format: FormatType) -> AssessmentPayload {
        let mut subjective = BTreeMap::new();
        let mut objective = BTreeMap::new();

        match self {
            AssessmentInput::Manual(m) => {
                subjective.insert("statements".to_string(), SectionValue::Lines(lines_of(&m.subjective)));
                objective.insert("observations".to_string(), SectionValue::Lines(lines_of(&m.objective)));
            }
            AssessmentInput::Assistant(a) => {
                subjective.insert(
                    "primary_symptoms".to_string(),
                    SectionValue::Lines(lines_of(&a.primary_symptoms)),
                );
                if let Some(other) = a.other_symptoms.as_deref().filter(|s| !s.trim().is_empty()) {
                    subjective.insert("other_symptoms".to_string(), SectionValue::Lines(lines_of(other)));
                }
                objective.insert(
                    "exam_findings".to_string(),
                    SectionValue::Lines(lines_of(&a.exam_findings)),
                );
                if !a.vitals.is_empty() {
                    let vitals = a
                        .vitals
                        .entries()
                        .into_iter()
                        .map(|(name, value)| (name.to_string(), vec![value.to_string()]))
                        .collect();
                    objective.insert("vitals".to_string(), SectionValue::Nested(vitals));
                }
                if let Some(other) = a.other_findings.as_deref().filter(|s| !s.trim().is_empty()) {
                    objective.insert("other_findings".to_string(), SectionValue::Lines(lines_of(other)));
                }
            }
        }

        let mut data = BTreeMap::new();
        data.insert("subjective".to_string(), subjective);
        data.insert("objective".to_string(), objective);

        let mut format_map = BTreeMap::new();
        format_map.insert("type".to_string(), format.as_u8().to_string());

        let mut metadata = BTreeMap::new();
        metadata.insert("mode".to_string(), self.mode_name().to_string());

        AssessmentPayload {
            format: format_map,
            data,
            metadata,
        }
    }
}

/// Non-empty trimmed lines of a text block.
pub fn lines_of(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// A data entry in a payload section: either a flat list of lines or a
/// nested map of lists (used for vitals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum SectionValue {
    Lines(Vec<String>),
    Nested(BTreeMap<String, Vec<String>>),
}

/// Body of `POST /generate-ncp`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssessmentPayload {
    #[serde(default)]
    pub format: BTreeMap<String, String>,
    pub data: BTreeMap<String, BTreeMap<String, SectionValue>>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl AssessmentPayload {
    /// The requested format, defaulting to seven columns when absent or
    /// unparseable.
    pub fn format_type(&self) -> FormatType {
        self.format
            .get("type")
            .and_then(|t| t.trim().parse::<u8>().ok())
            .and_then(|n| FormatType::try_from(n).ok())
            .unwrap_or(FormatType::Seven)
    }

    /// All lines of one data section (`"subjective"` or `"objective"`),
    /// flattened in key order. Nested maps contribute their values.
    pub fn section_lines(&self, section: &str) -> Vec<String> {
        let Some(entries) = self.data.get(section) else {
            return Vec::new();
        };

        let mut lines = Vec::new();
        for value in entries.values() {
            match value {
                SectionValue::Lines(items) => lines.extend(items.iter().cloned()),
                SectionValue::Nested(map) => {
                    for (key, items) in map {
                        lines.extend(items.iter().map(|v| format!("{}: {v}", humanize(key))));
                    }
                }
            }
        }
        lines
    }

    pub fn mode(&self) -> &str {
        self.metadata.get("mode").map(String::as_str).unwrap_or("manual")
    }

    pub fn is_empty(&self) -> bool {
        self.section_lines("subjective").is_empty() && self.section_lines("objective").is_empty()
    }
}

fn humanize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, word) in key.split('_').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_uppercase());
            } else {
                out.push(first);
            }
            out.push_str(chars.as_str());
        }
    }
    out
}
