use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;

/// The seven fixed NCP sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Section {
    Assessment,
    Diagnosis,
    Outcomes,
    Interventions,
    Rationale,
    Implementation,
    Evaluation,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Assessment,
        Section::Diagnosis,
        Section::Outcomes,
        Section::Interventions,
        Section::Rationale,
        Section::Implementation,
        Section::Evaluation,
    ];

    /// The JSON key used for this section.
    pub fn key(self) -> &'static str {
        match self {
            Section::Assessment => "assessment",
            Section::Diagnosis => "diagnosis",
            Section::Outcomes => "outcomes",
            Section::Interventions => "interventions",
            Section::Rationale => "rationale",
            Section::Implementation => "implementation",
            Section::Evaluation => "evaluation",
        }
    }

    /// Column heading shown to the user.
    pub fn title(self) -> &'static str {
        match self {
            Section::Assessment => "Assessment",
            Section::Diagnosis => "Nursing Diagnosis",
            Section::Outcomes => "Outcomes",
            Section::Interventions => "Interventions",
            Section::Rationale => "Rationale",
            Section::Implementation => "Implementation",
            Section::Evaluation => "Evaluation",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Section {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownSection(s.to_string()))
    }
}

/// How many leading sections of the plan are displayed (4 to 7 columns).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FormatType {
    Four,
    Five,
    Six,
    #[default]
    Seven,
}

impl FormatType {
    pub fn as_u8(self) -> u8 {
        match self {
            FormatType::Four => 4,
            FormatType::Five => 5,
            FormatType::Six => 6,
            FormatType::Seven => 7,
        }
    }

    /// Exactly the first `n` sections, where `n` is the column count.
    pub fn available_sections(self) -> &'static [Section] {
        &Section::ALL[..self.as_u8() as usize]
    }

    pub fn includes(self, section: Section) -> bool {
        self.available_sections().contains(&section)
    }
}

impl TryFrom<u8> for FormatType {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(FormatType::Four),
            5 => Ok(FormatType::Five),
            6 => Ok(FormatType::Six),
            7 => Ok(FormatType::Seven),
            other => Err(CoreError::InvalidFormatType(other)),
        }
    }
}

impl From<FormatType> for u8 {
    fn from(value: FormatType) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Plain-text content of every section, keyed by section name on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CarePlanSections {
    #[serde(default)]
    pub assessment: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub outcomes: String,
    #[serde(default)]
    pub interventions: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub implementation: String,
    #[serde(default)]
    pub evaluation: String,
}

impl CarePlanSections {
    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::Assessment => &self.assessment,
            Section::Diagnosis => &self.diagnosis,
            Section::Outcomes => &self.outcomes,
            Section::Interventions => &self.interventions,
            Section::Rationale => &self.rationale,
            Section::Implementation => &self.implementation,
            Section::Evaluation => &self.evaluation,
        }
    }

    pub fn set(&mut self, section: Section, content: impl Into<String>) {
        let slot = match section {
            Section::Assessment => &mut self.assessment,
            Section::Diagnosis => &mut self.diagnosis,
            Section::Outcomes => &mut self.outcomes,
            Section::Interventions => &mut self.interventions,
            Section::Rationale => &mut self.rationale,
            Section::Implementation => &mut self.implementation,
            Section::Evaluation => &mut self.evaluation,
        };
        *slot = content.into();
    }

    /// Sections required by `format` whose content is blank.
    pub fn missing(&self, format: FormatType) -> Vec<Section> {
        format
            .available_sections()
            .iter()
            .copied()
            .filter(|s| self.get(*s).trim().is_empty())
            .collect()
    }
}

/// A persisted Nursing Care Plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CarePlan {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<String>,
    pub title: String,
    #[ts(type = "4 | 5 | 6 | 7")]
    pub format_type: FormatType,
    #[serde(flatten)]
    pub sections: CarePlanSections,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl CarePlan {
    pub fn new(title: impl Into<String>, format_type: FormatType, sections: CarePlanSections) -> Self {
        let now = jiff::Timestamp::now();
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            title: title.into(),
            format_type,
            sections,
            created_at: now,
            updated_at: now,
        }
    }

    /// `(section, content)` for each section the plan's format displays.
    pub fn visible_sections(&self) -> Vec<(Section, &str)> {
        self.format_type
            .available_sections()
            .iter()
            .map(|s| (*s, self.sections.get(*s)))
            .collect()
    }

    /// First non-empty line of the diagnosis section, without a list bullet.
    pub fn diagnosis_name(&self) -> Option<&str> {
        self.sections
            .diagnosis
            .lines()
            .map(|l| l.trim().trim_start_matches(['-', '*', '•']).trim())
            .find(|l| !l.is_empty())
    }
}

/// Fields a user may change on a saved plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CarePlanUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    #[ts(type = "4 | 5 | 6 | 7 | null")]
    pub format_type: Option<FormatType>,
    #[serde(default)]
    pub sections: Option<CarePlanSections>,
}

impl CarePlanUpdate {
    pub fn apply(self, plan: &mut CarePlan) {
        if let Some(title) = self.title {
            plan.title = title;
        }
        if let Some(format_type) = self.format_type {
            plan.format_type = format_type;
        }
        if let Some(sections) = self.sections {
            plan.sections = sections;
        }
        plan.updated_at = jiff::Timestamp::now();
    }
}

/// Default title for a freshly generated plan.
pub fn default_title(diagnosis: Option<&str>) -> String {
    match diagnosis.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => format!("NCP: {d}"),
        None => "Untitled NCP".to_string(),
    }
}

/// Body of `POST /validate-ncp`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidateNcpRequest {
    #[serde(default)]
    #[ts(type = "4 | 5 | 6 | 7")]
    pub format_type: FormatType,
    #[serde(flatten)]
    pub sections: CarePlanSections,
}

impl From<&CarePlan> for ValidateNcpRequest {
    fn from(plan: &CarePlan) -> Self {
        Self {
            format_type: plan.format_type,
            sections: plan.sections.clone(),
        }
    }
}
