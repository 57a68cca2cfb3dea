//! Reading assessments from disk.

use std::path::Path;

use eyre::{bail, WrapErr};
use ncp_core::models::assessment::{AssessmentInput, ManualAssessment};
use ncp_core::models::care_plan::FormatType;

use crate::config::NcpConfig;

/// Where an assessment comes from: one JSON document in either entry mode,
/// or two plain-text files of subjective and objective lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessmentSource<'a> {
    pub json: Option<&'a Path>,
    pub subjective: Option<&'a Path>,
    pub objective: Option<&'a Path>,
}

pub fn read_assessment(source: AssessmentSource<'_>) -> eyre::Result<AssessmentInput> {
    match source {
        AssessmentSource { json: Some(path), .. } => {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .wrap_err_with(|| format!("{} is not a valid assessment document", path.display()))
        }
        AssessmentSource {
            subjective: Some(subjective),
            objective: Some(objective),
            ..
        } => Ok(AssessmentInput::Manual(ManualAssessment {
            subjective: read_text(subjective)?,
            objective: read_text(objective)?,
        })),
        _ => bail!("provide --input <file.json>, or both --subjective and --objective"),
    }
}

fn read_text(path: &Path) -> eyre::Result<String> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}

/// `--format` when given, else the configured default.
pub fn resolve_format(arg: Option<u8>, config: &NcpConfig) -> eyre::Result<FormatType> {
    match arg {
        Some(n) => FormatType::try_from(n).map_err(|e| eyre::eyre!("{e}")),
        None => Ok(config.format()),
    }
}
