//! BLAKE3 content hashes for stored records.

use crate::core::types::RawRecord;
use crate::error::{GalleyError, GalleyResult};

/// Hash a string. Returns `"blake3:{hex}"`.
pub fn hash_string(s: &str) -> String {
    format!("blake3:{}", blake3::hash(s.as_bytes()).to_hex())
}

/// Hash a record by its pretty-printed JSON, the same bytes the store
/// writes.
pub fn hash_record(raw: &RawRecord) -> GalleyResult<String> {
    let json = serde_json::to_string_pretty(raw).map_err(|e| GalleyError::Serialize {
        what: "record for hashing",
        message: e.to_string(),
    })?;
    Ok(hash_string(&json))
}
