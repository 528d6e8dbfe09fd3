//! Canonical serialization for deterministic fingerprints.
//!
//! Redirect tables are fingerprinted so callers can tell whether a merge
//! actually changed anything, and so the service can report which table
//! state it is answering from.
//!
//! ## Determinism Guarantees
//!
//! - Pairs are fingerprinted in sorted (from, to) order, whatever order they
//!   were supplied in
//! - Stable field order: struct fields serialize in declaration order
//! - No HashMap allowed in fingerprinted data: use BTreeMap

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

use crate::types::RedirectPair;

/// Serialize a value to canonical JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

/// Fingerprint a set of redirect pairs, independent of input order.
pub fn table_fingerprint<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = &'a RedirectPair>,
{
    let mut rows: Vec<(&str, &str)> = pairs
        .into_iter()
        .map(|p| (p.from.as_str(), p.to.as_str()))
        .collect();
    rows.sort_unstable();
    canonical_hash_hex(&rows)
}
