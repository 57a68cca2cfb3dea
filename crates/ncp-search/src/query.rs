use tantivy::collector::TopDocs;
use tantivy::query::{QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{TantivyDocument, Term};
use tracing::{debug, info};

use ncp_core::models::diagnosis::{DiagnosisCandidate, NnnEntry};
use ncp_core::schema::{field, get_field};

use crate::error::SearchError;
use crate::index::LookupIndex;

pub const DEFAULT_CANDIDATES: usize = 10;

/// Best-matching lookup entries for `keywords`, highest score first.
///
/// Query syntax errors are tolerated: whatever parses is searched.
pub fn find_candidates(
    lookup: &LookupIndex,
    keywords: &str,
    limit: usize,
) -> Result<Vec<DiagnosisCandidate>, SearchError> {
    if keywords.trim().is_empty() || lookup.is_empty() {
        return Ok(Vec::new());
    }

    let searcher = lookup.reader.searcher();
    let schema = lookup.index.schema();

    let diagnosis = get_field(&schema, field::DIAGNOSIS);
    let definition = get_field(&schema, field::DEFINITION);
    let characteristics = get_field(&schema, field::CHARACTERISTICS);
    let factors = get_field(&schema, field::FACTORS);
    let entry_field = get_field(&schema, field::ENTRY);

    let mut parser = QueryParser::for_index(
        &lookup.index,
        vec![diagnosis, definition, characteristics, factors],
    );
    parser.set_field_boost(diagnosis, 2.0);
    parser.set_field_boost(characteristics, 1.5);

    let (query, errors) = parser.parse_query_lenient(keywords);
    if !errors.is_empty() {
        debug!(count = errors.len(), "ignored query parse errors");
    }

    let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

    let mut candidates = Vec::with_capacity(top_docs.len());
    for (score, address) in top_docs {
        let doc = searcher.doc::<TantivyDocument>(address)?;
        let Some(json) = doc.get_first(entry_field).and_then(|v| v.as_str()) else {
            continue;
        };
        let entry: NnnEntry = serde_json::from_str(json)?;
        candidates.push(DiagnosisCandidate { entry, score });
    }

    info!(count = candidates.len(), "candidate diagnoses found");
    for (i, c) in candidates.iter().enumerate() {
        debug!(rank = i + 1, diagnosis = %c.entry.diagnosis, score = c.score);
    }
    Ok(candidates)
}

/// Find a single entry by ID.
pub fn find_by_id(lookup: &LookupIndex, id: &str) -> Result<Option<NnnEntry>, SearchError> {
    let searcher = lookup.reader.searcher();
    let schema = lookup.index.schema();

    let id_field = get_field(&schema, field::ID);
    let entry_field = get_field(&schema, field::ENTRY);
    let query = TermQuery::new(Term::from_field_text(id_field, id), IndexRecordOption::Basic);

    let top_docs = searcher.search(&query, &TopDocs::with_limit(1))?;
    let Some((_score, address)) = top_docs.first() else {
        return Ok(None);
    };

    let doc = searcher.doc::<TantivyDocument>(*address)?;
    match doc.get_first(entry_field).and_then(|v| v.as_str()) {
        Some(json) => Ok(Some(serde_json::from_str(json)?)),
        None => Ok(None),
    }
}

/// Entry whose diagnosis name equals `name`, ignoring case and surrounding
/// whitespace.
pub fn find_by_name<'a>(lookup: &'a LookupIndex, name: &str) -> Option<&'a NnnEntry> {
    let name = name.trim();
    lookup
        .entries()
        .iter()
        .find(|e| e.diagnosis.trim().eq_ignore_ascii_case(name))
}
