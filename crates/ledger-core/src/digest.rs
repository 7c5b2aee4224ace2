//! Canonical encoding and SHA-256 hashing.
//!
//! Everything that gets hashed goes through [`canonical_string`]: the value is
//! first lowered into a `serde_json::Value`, whose object maps are key-sorted,
//! so the bytes depend only on the data and never on field declaration order.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Field-sorted JSON text of `value`.
pub fn canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&value)?)
}

pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(canonical_string(value)?.into_bytes())
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Digest of any serializable record: `sha256_hex(canonical_json(value))`.
pub fn digest<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(sha256_hex(&canonical_json(value)?))
}
