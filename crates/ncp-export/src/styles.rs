use serde::{Deserialize, Serialize};

/// Fonts, sizes and page geometry shared by the export formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStyles {
    /// Font for body text in DOCX and PNG output.
    pub body_font: String,

    /// Font for headings in DOCX and PNG output.
    pub heading_font: String,

    /// Body text size in points.
    pub body_size: usize,

    /// Plan title size in points.
    pub title_size: usize,

    /// Section heading size in points.
    pub section_size: usize,

    /// Explanation sub-heading size in points.
    pub subsection_size: usize,

    /// Page margin in millimetres (PDF).
    pub margin_mm: f32,

    /// Maximum characters per wrapped line (PDF and PNG).
    pub wrap_chars: usize,

    /// Width of the PNG card in pixels.
    pub png_width: u32,

    /// Accent colour for headings, `#rrggbb`.
    pub accent_color: String,
}

impl Default for DocumentStyles {
    fn default() -> Self {
        Self {
            body_font: "Calibri".to_string(),
            heading_font: "Arial".to_string(),
            body_size: 11,
            title_size: 18,
            section_size: 14,
            subsection_size: 12,
            margin_mm: 20.0,
            wrap_chars: 90,
            png_width: 1200,
            accent_color: "#1f4e79".to_string(),
        }
    }
}

/// Word-wrap `text` to at most `max_chars` per line. Long words are kept whole.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = current.chars().count() + word.chars().count() + 1;
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
