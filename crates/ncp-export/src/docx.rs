use std::io::Cursor;

use docx_rs::{AlignmentType, BreakType, Docx, Paragraph, Run, RunFonts, Style, StyleType};
use ncp_core::models::care_plan::CarePlan;
use ncp_core::models::explanation::Explanation;

use crate::error::ExportError;
use crate::render::{parse_blocks, render_markdown, Block};
use crate::styles::DocumentStyles;

/// Word document for a plan: title, one heading per section, bullets for
/// `- ` lines, explanation sub-headings when supplied.
pub fn generate_docx(
    plan: &CarePlan,
    explanation: Option<&Explanation>,
    styles: &DocumentStyles,
) -> Result<Vec<u8>, ExportError> {
    let rendered = render_markdown(plan, explanation)?;
    markdown_to_docx(&rendered, styles)
}

/// Lay out rendered Markdown as DOCX.
pub fn markdown_to_docx(rendered: &str, styles: &DocumentStyles) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new()
        .add_style(heading_style("Heading1", "heading 1", styles.title_size, styles))
        .add_style(heading_style("Heading2", "heading 2", styles.section_size, styles))
        .add_style(heading_style("Heading3", "heading 3", styles.subsection_size, styles));

    let mut previous_blank = false;
    for block in parse_blocks(rendered) {
        let paragraph = match block {
            Block::Blank if previous_blank => continue,
            Block::Blank => Paragraph::new(),
            Block::Heading(level, text) => Paragraph::new()
                .style(&format!("Heading{level}"))
                .add_run(Run::new().add_text(text).bold()),
            Block::Bullet(text) => {
                let bullet = Run::new()
                    .add_text("\u{2022} ")
                    .fonts(RunFonts::new().ascii(&styles.body_font));
                inline_runs(text, styles)
                    .into_iter()
                    .fold(Paragraph::new().align(AlignmentType::Left).add_run(bullet), Paragraph::add_run)
            }
            Block::PageBreak => Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
            Block::Paragraph(text) => inline_runs(text, styles)
                .into_iter()
                .fold(Paragraph::new().align(AlignmentType::Left), Paragraph::add_run),
        };
        previous_blank = matches!(block, Block::Blank);
        docx = docx.add_paragraph(paragraph);
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ExportError::Docx(e.to_string()))?;

    Ok(buf.into_inner())
}

fn heading_style(style_id: &str, name: &str, size_pt: usize, styles: &DocumentStyles) -> Style {
    Style::new(style_id, StyleType::Paragraph)
        .name(name)
        .fonts(RunFonts::new().ascii(&styles.heading_font))
        .size(size_pt * 2) // half-points
}

/// Split `**bold**` segments into runs. An unclosed marker is literal text.
fn inline_runs(text: &str, styles: &DocumentStyles) -> Vec<Run> {
    let body = |s: &str| {
        Run::new()
            .add_text(s)
            .size(styles.body_size * 2)
            .fonts(RunFonts::new().ascii(&styles.body_font))
    };

    let mut runs = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("**") {
        let Some(len) = rest[start + 2..].find("**") else {
            break;
        };
        if start > 0 {
            runs.push(body(&rest[..start]));
        }
        runs.push(body(&rest[start + 2..start + 2 + len]).bold());
        rest = &rest[start + 2 + len + 2..];
    }
    if !rest.is_empty() {
        runs.push(body(rest));
    }
    runs
}
