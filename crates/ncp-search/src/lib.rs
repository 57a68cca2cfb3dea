//! ncp-search
//!
//! In-memory Tantivy index over the NNN lookup table: built from the JSON
//! table in storage, queried with assessment keywords for candidate
//! diagnoses.

pub mod error;
pub mod index;
pub mod keywords;
pub mod query;
