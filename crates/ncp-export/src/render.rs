use ncp_core::models::care_plan::CarePlan;
use ncp_core::models::explanation::Explanation;
use serde::Serialize;
use tera::{Context, Tera};

use crate::error::ExportError;

pub const NCP_TEMPLATE_NAME: &str = "ncp.md";

/// Built-in Markdown layout of a care plan.
pub const NCP_TEMPLATE: &str = r#"# {{ title }}

**Format:** {{ format_type }}-column care plan
**Created:** {{ created }}
{% for section in sections %}
## {{ section.title }}
{% for line in section.lines %}
{{ line }}
{%- endfor %}
{% if section.explanation %}
{%- for part in section.explanation %}
### {{ part.label }}
{{ part.text }}
{% endfor %}
{%- endif %}
{%- endfor %}
"#;

#[derive(Debug, Clone, Serialize)]
pub struct ExplanationPart {
    pub label: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionContext {
    pub key: &'static str,
    pub title: &'static str,
    pub lines: Vec<String>,
    pub explanation: Option<Vec<ExplanationPart>>,
}

/// Everything an export needs from a plan: only sections its format
/// displays, with any explanation attached.
#[derive(Debug, Clone, Serialize)]
pub struct ExportContext {
    pub title: String,
    pub format_type: u8,
    pub created: String,
    pub sections: Vec<SectionContext>,
}

impl ExportContext {
    pub fn new(plan: &CarePlan, explanation: Option<&Explanation>) -> Self {
        let sections = plan
            .visible_sections()
            .into_iter()
            .map(|(section, content)| SectionContext {
                key: section.key(),
                title: section.title(),
                lines: content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect(),
                explanation: explanation
                    .and_then(|e| e.get(section))
                    .filter(|e| !e.is_blank())
                    .map(|e| {
                        e.parts()
                            .into_iter()
                            .filter(|(_, text)| !text.trim().is_empty())
                            .map(|(label, text)| ExplanationPart {
                                label,
                                text: text.trim().to_string(),
                            })
                            .collect()
                    }),
            })
            .collect();

        Self {
            title: plan.title.clone(),
            format_type: plan.format_type.as_u8(),
            created: plan.created_at.strftime("%Y-%m-%d").to_string(),
            sections,
        }
    }
}

/// Render a Tera template against an [`ExportContext`].
pub fn render_template(
    template_name: &str,
    template_content: &str,
    export: &ExportContext,
) -> Result<String, ExportError> {
    let mut tera = Tera::default();
    tera.add_raw_template(template_name, template_content)
        .map_err(|e| ExportError::TemplateParse(e.to_string()))?;

    let value = serde_json::to_value(export)?;
    let context = Context::from_value(value).map_err(|e| ExportError::TemplateRender(e.to_string()))?;

    Ok(tera.render(template_name, &context)?)
}

/// Render a plan with the built-in Markdown layout.
pub fn render_markdown(plan: &CarePlan, explanation: Option<&Explanation>) -> Result<String, ExportError> {
    render_template(NCP_TEMPLATE_NAME, NCP_TEMPLATE, &ExportContext::new(plan, explanation))
}

/// One line of rendered Markdown, classified for layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Heading(u8, &'a str),
    Bullet(&'a str),
    Paragraph(&'a str),
    PageBreak,
    Blank,
}

/// Classify the Markdown subset produced by the templates:
/// `#`/`##`/`###` headings, `- ` bullets, `---` page breaks.
pub fn parse_blocks(rendered: &str) -> Vec<Block<'_>> {
    rendered
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                Block::Blank
            } else if let Some(text) = trimmed.strip_prefix("### ") {
                Block::Heading(3, text)
            } else if let Some(text) = trimmed.strip_prefix("## ") {
                Block::Heading(2, text)
            } else if let Some(text) = trimmed.strip_prefix("# ") {
                Block::Heading(1, text)
            } else if let Some(text) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
                Block::Bullet(text)
            } else if trimmed == "---" || trimmed == "***" {
                Block::PageBreak
            } else {
                Block::Paragraph(trimmed)
            }
        })
        .collect()
}

/// Drop `**` bold markers.
pub fn plain_text(text: &str) -> String {
    text.replace("**", "")
}
