//! ncp-export
//!
//! PDF, CSV, Word, PNG and Markdown renderings of a care plan.

pub mod docx;
pub mod error;
pub mod image;
pub mod pdf;
pub mod render;
pub mod styles;
pub mod table;

use std::fmt;
use std::str::FromStr;

use ncp_core::models::care_plan::CarePlan;
use ncp_core::models::explanation::Explanation;
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::styles::DocumentStyles;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Csv,
    Docx,
    Png,
    Markdown,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Pdf,
        ExportFormat::Csv,
        ExportFormat::Docx,
        ExportFormat::Png,
        ExportFormat::Markdown,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
            ExportFormat::Docx => "docx",
            ExportFormat::Png => "png",
            ExportFormat::Markdown => "md",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ExportFormat::Png => "image/png",
            ExportFormat::Markdown => "text/markdown",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "csv" => Ok(ExportFormat::Csv),
            "docx" | "word" => Ok(ExportFormat::Docx),
            "png" | "image" => Ok(ExportFormat::Png),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Render `plan` (and optionally its explanation) in `format`.
pub fn export(
    plan: &CarePlan,
    explanation: Option<&Explanation>,
    format: ExportFormat,
    styles: &DocumentStyles,
) -> Result<Vec<u8>, ExportError> {
    tracing::debug!(ncp_id = %plan.id, %format, "exporting care plan");
    match format {
        ExportFormat::Pdf => pdf::generate_pdf(plan, explanation, styles),
        ExportFormat::Csv => table::generate_csv(plan, explanation),
        ExportFormat::Docx => docx::generate_docx(plan, explanation, styles),
        ExportFormat::Png => image::generate_png(plan, explanation, styles),
        ExportFormat::Markdown => render::render_markdown(plan, explanation).map(String::into_bytes),
    }
}

/// File name for an export: the plan title reduced to `[a-z0-9_]`.
pub fn file_name(plan: &CarePlan, format: ExportFormat) -> String {
    let mut stem = String::new();
    for c in plan.title.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_matches('_');
    let stem = if stem.is_empty() { "ncp" } else { stem };
    format!("{stem}.{}", format.extension())
}
