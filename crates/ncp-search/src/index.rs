use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tracing::info;

use ncp_core::models::diagnosis::NnnEntry;
use ncp_core::schema::{build_schema, field, get_field};
use ncp_storage::ncps;
use ncp_storage::store::Store;

use crate::error::SearchError;

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// The lookup table, indexed for full-text search.
pub struct LookupIndex {
    pub index: Index,
    pub reader: IndexReader,
    entries: Vec<NnnEntry>,
}

impl LookupIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[NnnEntry] {
        &self.entries
    }
}

/// Build an in-RAM index over `entries`.
pub fn build_index(entries: Vec<NnnEntry>) -> Result<LookupIndex, SearchError> {
    let schema = build_schema();
    let index = Index::create_in_ram(schema.clone());

    let id = get_field(&schema, field::ID);
    let diagnosis = get_field(&schema, field::DIAGNOSIS);
    let definition = get_field(&schema, field::DEFINITION);
    let characteristics = get_field(&schema, field::CHARACTERISTICS);
    let factors = get_field(&schema, field::FACTORS);
    let entry_field = get_field(&schema, field::ENTRY);

    let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;
    for entry in &entries {
        let mut doc = TantivyDocument::default();
        doc.add_text(id, &entry.id);
        doc.add_text(diagnosis, &entry.diagnosis);
        if let Some(def) = &entry.definition {
            doc.add_text(definition, def);
        }
        for c in &entry.defining_characteristics {
            doc.add_text(characteristics, c);
        }
        for f in entry.related_factors.iter().chain(&entry.risk_factors) {
            doc.add_text(factors, f);
        }
        doc.add_text(entry_field, serde_json::to_string(entry)?);
        writer.add_document(doc)?;
    }
    writer.commit()?;

    let reader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::Manual)
        .try_into()?;

    info!(entries = entries.len(), "lookup index built");
    Ok(LookupIndex {
        index,
        reader,
        entries,
    })
}

/// Load the lookup table from storage and index it. A missing table gives
/// an empty index.
pub async fn load_index(store: &Store) -> Result<LookupIndex, SearchError> {
    let entries = ncps::load_lookup_table(store).await?;
    if entries.is_empty() {
        tracing::warn!("lookup table is empty or missing");
    }
    build_index(entries)
}
