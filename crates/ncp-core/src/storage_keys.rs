//! Object key conventions.
//!
//! Pure string functions. These define the canonical layout of objects in
//! the NCP bucket.

use uuid::Uuid;

pub const NCPS_PREFIX: &str = "ncps/";
pub const EXPLANATIONS_PREFIX: &str = "explanations/";

/// Saved provider selection, restored on start-up.
pub const AI_PROVIDER_SETTING: &str = "settings/ai_provider.json";

/// Normalised NANDA-I / NIC / NOC lookup table (a JSON array).
pub const LOOKUP_TABLE: &str = "lookup/normalized_nnn_content.json";

pub fn ncp(id: Uuid) -> String {
    format!("{NCPS_PREFIX}{id}.json")
}

pub fn explanation(ncp_id: Uuid) -> String {
    format!("{EXPLANATIONS_PREFIX}{ncp_id}.json")
}

/// Parse the NCP id back out of a key produced by [`ncp`].
pub fn ncp_id_from_key(key: &str) -> Option<Uuid> {
    key.strip_prefix(NCPS_PREFIX)?
        .strip_suffix(".json")?
        .parse()
        .ok()
}
