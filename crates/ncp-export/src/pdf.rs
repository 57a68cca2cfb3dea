use std::io::BufWriter;

use ncp_core::models::care_plan::CarePlan;
use ncp_core::models::explanation::Explanation;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::error::ExportError;
use crate::render::{parse_blocks, plain_text, render_markdown, Block};
use crate::styles::{wrap_text, DocumentStyles};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);

/// Points to millimetres, for line advance.
const PT_TO_MM: f32 = 0.3528;

/// Cursor over A4 pages that starts a new page when the current one is full.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    margin: f32,
    pages: usize,
}

impl PageWriter<'_> {
    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, format!("Page {}", self.pages));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT.0 - self.margin;
    }

    fn line(&mut self, text: &str, size: f32, indent: f32, bold: bool) {
        let advance = size * PT_TO_MM * 1.4;
        if self.y - advance < self.margin {
            self.new_page();
        }
        self.y -= advance;
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(self.margin + indent), Mm(self.y), font);
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }
}

/// PDF rendering of a plan, Helvetica on A4 with wrapped text.
pub fn generate_pdf(
    plan: &CarePlan,
    explanation: Option<&Explanation>,
    styles: &DocumentStyles,
) -> Result<Vec<u8>, ExportError> {
    let rendered = render_markdown(plan, explanation)?;
    markdown_to_pdf(&plan.title, &rendered, styles)
}

pub fn markdown_to_pdf(title: &str, rendered: &str, styles: &DocumentStyles) -> Result<Vec<u8>, ExportError> {
    let (doc, page1, layer1) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, "Page 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;

    let mut writer = PageWriter {
        doc: &doc,
        layer: doc.get_page(page1).get_layer(layer1),
        regular,
        bold,
        y: PAGE_HEIGHT.0 - styles.margin_mm,
        margin: styles.margin_mm,
        pages: 1,
    };
    lay_out(&mut writer, rendered, styles);
    drop(writer);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ExportError::Pdf(format!("buffer error: {e}")))
}

fn lay_out(writer: &mut PageWriter<'_>, rendered: &str, styles: &DocumentStyles) {
    let body = styles.body_size as f32;
    for block in parse_blocks(rendered) {
        match block {
            Block::Heading(level, text) => {
                let size = match level {
                    1 => styles.title_size,
                    2 => styles.section_size,
                    _ => styles.subsection_size,
                } as f32;
                writer.gap(2.0);
                // Headings are wider per character.
                for line in wrap_text(&plain_text(text), styles.wrap_chars * 11 / 14) {
                    writer.line(&line, size, 0.0, true);
                }
            }
            Block::Bullet(text) => {
                for (i, line) in wrap_text(&plain_text(text), styles.wrap_chars.saturating_sub(4)).iter().enumerate() {
                    let line = if i == 0 { format!("- {line}") } else { line.clone() };
                    writer.line(&line, body, if i == 0 { 4.0 } else { 7.0 }, false);
                }
            }
            Block::Paragraph(text) => {
                for line in wrap_text(&plain_text(text), styles.wrap_chars) {
                    writer.line(&line, body, 0.0, false);
                }
            }
            Block::PageBreak => writer.new_page(),
            Block::Blank => writer.gap(1.5),
        }
    }
}
