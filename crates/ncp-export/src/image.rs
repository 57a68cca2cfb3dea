use ncp_core::models::care_plan::CarePlan;
use ncp_core::models::explanation::Explanation;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::ExportError;
use crate::render::{plain_text, ExportContext};
use crate::styles::{wrap_text, DocumentStyles};

const PADDING: u32 = 40;
const LINE_HEIGHT: f32 = 1.5;

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// SVG card layout of a plan: a title bar and one block per section.
pub fn plan_svg(export: &ExportContext, styles: &DocumentStyles) -> String {
    let width = styles.png_width;
    let body = styles.body_size as f32 * 1.6;
    let heading = styles.section_size as f32 * 1.6;
    let title = styles.title_size as f32 * 1.6;
    // Roughly 0.55em per character for sans-serif text.
    let chars_per_line = ((width - 2 * PADDING) as f32 / (body * 0.55)) as usize;

    let mut elements = Vec::new();
    let mut y = PADDING as f32 + title;

    elements.push(format!(
        r#"<text x="{PADDING}" y="{y}" font-family="{font}" font-size="{title}" font-weight="bold" fill="{accent}">{text}</text>"#,
        font = escape_xml(&styles.heading_font),
        accent = escape_xml(&styles.accent_color),
        text = escape_xml(&export.title),
    ));
    y += body * LINE_HEIGHT;
    elements.push(format!(
        r##"<text x="{PADDING}" y="{y}" font-family="{font}" font-size="{body}" fill="#555555">{format}-column care plan, created {created}</text>"##,
        font = escape_xml(&styles.body_font),
        format = export.format_type,
        created = escape_xml(&export.created),
    ));

    for section in &export.sections {
        y += heading * LINE_HEIGHT;
        let rule_y = y - heading;
        elements.push(format!(
            r#"<line x1="{PADDING}" y1="{rule_y}" x2="{x2}" y2="{rule_y}" stroke="{accent}" stroke-width="1"/>"#,
            x2 = width - PADDING,
            accent = escape_xml(&styles.accent_color),
        ));
        elements.push(format!(
            r#"<text x="{PADDING}" y="{y}" font-family="{font}" font-size="{heading}" font-weight="bold" fill="{accent}">{text}</text>"#,
            font = escape_xml(&styles.heading_font),
            accent = escape_xml(&styles.accent_color),
            text = escape_xml(section.title),
        ));

        let lines = section.lines.iter().chain(
            section
                .explanation
                .iter()
                .flatten()
                .map(|part| &part.text),
        );
        for line in lines {
            for wrapped in wrap_text(&plain_text(line), chars_per_line) {
                y += body * LINE_HEIGHT;
                elements.push(format!(
                    r##"<text x="{PADDING}" y="{y}" font-family="{font}" font-size="{body}" fill="#222222">{text}</text>"##,
                    font = escape_xml(&styles.body_font),
                    text = escape_xml(&wrapped),
                ));
            }
        }
    }

    let height = (y + PADDING as f32).ceil() as u32;
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><rect width="100%" height="100%" fill="#ffffff"/>{}</svg>"##,
        elements.join("")
    )
}

/// Render an SVG document to PNG bytes.
pub fn svg_to_png(svg: &str) -> Result<Vec<u8>, ExportError> {
    let mut options = Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = Tree::from_str(svg, &options).map_err(|e| ExportError::Png(e.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| ExportError::Png("failed to create pixmap".to_string()))?;

    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| ExportError::Png(e.to_string()))
}

/// PNG image of a plan.
pub fn generate_png(
    plan: &CarePlan,
    explanation: Option<&Explanation>,
    styles: &DocumentStyles,
) -> Result<Vec<u8>, ExportError> {
    svg_to_png(&plan_svg(&ExportContext::new(plan, explanation), styles))
}
