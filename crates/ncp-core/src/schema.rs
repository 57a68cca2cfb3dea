use tantivy::schema::{self, Schema, STORED, STRING, TEXT};

/// Field names used in the NNN lookup index.
pub mod field {
    pub const ID: &str = "id";
    pub const DIAGNOSIS: &str = "diagnosis";
    pub const DEFINITION: &str = "definition";
    pub const CHARACTERISTICS: &str = "characteristics";
    pub const FACTORS: &str = "factors";
    /// The full entry as JSON, returned with each hit.
    pub const ENTRY: &str = "entry";
}

/// Build the schema used by the diagnosis lookup index.
pub fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    // Identifier, exact match
    builder.add_text_field(field::ID, STRING | STORED);

    // Full-text searchable
    builder.add_text_field(field::DIAGNOSIS, TEXT | STORED);
    builder.add_text_field(field::DEFINITION, TEXT);
    builder.add_text_field(field::CHARACTERISTICS, TEXT);
    builder.add_text_field(field::FACTORS, TEXT);

    // Stored-only payload
    builder.add_text_field(field::ENTRY, STORED);

    builder.build()
}

/// Resolve a field by name from the schema, returning the Tantivy `Field` handle.
///
/// # Panics
///
/// Panics if the field name does not exist in the schema. Only called with
/// the constants in [`field`].
pub fn get_field(schema: &Schema, name: &str) -> schema::Field {
    schema
        .get_field(name)
        .unwrap_or_else(|_| panic!("field '{name}' not found in schema"))
}
