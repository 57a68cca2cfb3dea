use std::collections::BTreeMap;

use ncp_core::models::care_plan::{CarePlan, CarePlanSections, FormatType, Section};
use ncp_core::models::explanation::{Explanation, SectionExplanation};
use ncp_export::render::{parse_blocks, render_markdown, Block};
use ncp_export::styles::{wrap_text, DocumentStyles};
use ncp_export::{export, file_name, ExportFormat};

fn plan(format: FormatType) -> CarePlan {
    let mut sections = CarePlanSections::default();
    sections.set(Section::Assessment, "- Pain 8/10 in right lower quadrant\n- Guarding on palpation");
    sections.set(Section::Diagnosis, "Acute Pain related to inflammation");
    sections.set(Section::Outcomes, "- Pain below 3/10 within 4 hours");
    sections.set(Section::Interventions, "- Assess pain every 2 hours\n- Give analgesia as ordered");
    sections.set(Section::Rationale, "- Regular assessment shows trends");
    sections.set(Section::Implementation, "- Hourly rounding");
    sections.set(Section::Evaluation, "- Goal met at 14:00, \"comfortable\"");
    let mut plan = CarePlan::new("NCP: Acute Pain", format, sections);
    plan.created_at = "2025-03-15T12:00:00Z".parse().unwrap();
    plan
}

fn explanation(plan: &CarePlan) -> Explanation {
    let mut sections = BTreeMap::new();
    sections.insert(
        Section::Diagnosis,
        SectionExplanation {
            clinical_reasoning: "Guarding and a pain score support the diagnosis.".to_string(),
            evidence_based_support: "NANDA-I defining characteristics.".to_string(),
            student_guidance: String::new(),
        },
    );
    Explanation {
        ncp_id: plan.id,
        sections,
        model_id: None,
        generated_at: plan.created_at,
    }
}

#[test]
fn markdown_shows_only_visible_sections() {
    let md = render_markdown(&plan(FormatType::Four), None).unwrap();
    assert!(md.starts_with("# NCP: Acute Pain"));
    assert!(md.contains("**Created:** 2025-03-15"));
    assert!(md.contains("## Interventions"));
    assert!(md.contains("- Give analgesia as ordered"));
    assert!(!md.contains("## Rationale"));
    assert!(!md.contains("## Evaluation"));
}

#[test]
fn markdown_appends_explanation_parts() {
    let p = plan(FormatType::Four);
    let md = render_markdown(&p, Some(&explanation(&p))).unwrap();
    assert!(md.contains("### Clinical Reasoning"));
    assert!(md.contains("Guarding and a pain score support the diagnosis."));
    // Blank parts are omitted.
    assert!(!md.contains("### Student Guidance"));
}

#[test]
fn blocks_are_classified() {
    let blocks = parse_blocks("# T\n\n## S\n- item\ntext\n---");
    assert_eq!(
        blocks,
        vec![
            Block::Heading(1, "T"),
            Block::Blank,
            Block::Heading(2, "S"),
            Block::Bullet("item"),
            Block::Paragraph("text"),
            Block::PageBreak,
        ]
    );
}

#[test]
fn wrap_respects_width() {
    let lines = wrap_text("one two three four five six", 10);
    assert!(lines.iter().all(|l| l.chars().count() <= 10));
    assert_eq!(lines.join(" "), "one two three four five six");
    assert_eq!(wrap_text("", 10), vec![String::new()]);
}

#[test]
fn csv_has_header_and_one_row_per_section() {
    let bytes = export(&plan(FormatType::Five), None, ExportFormat::Csv, &DocumentStyles::default()).unwrap();
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    assert_eq!(reader.headers().unwrap(), vec!["Section", "Content"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 5);
    assert_eq!(&rows[0][0], "Assessment");
    assert_eq!(&rows[0][1], "- Pain 8/10 in right lower quadrant\n- Guarding on palpation");
    assert_eq!(&rows[4][0], "Rationale");
}

#[test]
fn csv_quotes_and_explanation_rows() {
    let p = plan(FormatType::Seven);
    let bytes = export(&p, Some(&explanation(&p)), ExportFormat::Csv, &DocumentStyles::default()).unwrap();
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();

    assert_eq!(rows.len(), 9);
    assert_eq!(&rows[6][1], "- Goal met at 14:00, \"comfortable\"");
    assert_eq!(&rows[7][0], "Nursing Diagnosis - Clinical Reasoning");
}

#[test]
fn pdf_has_magic_bytes() {
    let bytes = export(&plan(FormatType::Seven), None, ExportFormat::Pdf, &DocumentStyles::default()).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn long_pdf_spans_pages() {
    let mut p = plan(FormatType::Four);
    let many = (0..200).map(|i| format!("- Intervention step number {i}")).collect::<Vec<_>>().join("\n");
    p.sections.set(Section::Interventions, many);
    let bytes = export(&p, None, ExportFormat::Pdf, &DocumentStyles::default()).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn docx_is_a_zip() {
    let p = plan(FormatType::Six);
    let bytes = export(&p, Some(&explanation(&p)), ExportFormat::Docx, &DocumentStyles::default()).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn png_has_signature() {
    let bytes = export(&plan(FormatType::Four), None, ExportFormat::Png, &DocumentStyles::default()).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]));
}

#[test]
fn format_names_and_file_names() {
    assert_eq!("Word".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
    assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
    assert!("xls".parse::<ExportFormat>().is_err());
    assert_eq!(file_name(&plan(FormatType::Four), ExportFormat::Pdf), "ncp_acute_pain.pdf");
}
