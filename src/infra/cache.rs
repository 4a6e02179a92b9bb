//! Result cache: fingerprint-keyed memoization with TTL expiry.
//!
//! Avoids redundant execution of identical tasks inside a freshness window.
//! The cache is the sole owner of its entries: a stale entry is treated as a
//! miss and evicted on access, and a periodic sweep bounds memory between
//! accesses.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::core::TaskKind;

/// A memoized handler output.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Handler output.
    pub result: Value,
    /// Storage timestamp (ms since epoch).
    pub stored_at_ms: u64,
}

/// Thread-safe in-memory result cache.
///
/// Read and written from concurrent completion paths; all access goes through
/// one mutex with brief critical sections.
pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    /// Create a cache with the given freshness window.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached result for a fingerprint if still fresh.
    ///
    /// A stale entry is evicted and reported as a miss; it is never returned.
    pub fn lookup(&self, fingerprint: &str, now_ms: u64) -> Option<Value> {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(fingerprint) {
            if self.is_fresh(entry, now_ms) {
                return Some(entry.result.clone());
            }
        }
        // Stale or absent; removing an absent key is a no-op.
        entries.remove(fingerprint);
        None
    }

    /// Store a result, overwriting any prior entry and restarting its TTL.
    pub fn store(&self, fingerprint: String, result: Value, now_ms: u64) {
        let mut entries = self.entries.lock();
        entries.insert(
            fingerprint,
            CacheEntry {
                result,
                stored_at_ms: now_ms,
            },
        );
    }

    /// Drop every entry older than the TTL; returns the number removed.
    ///
    /// Lookup already filters staleness, so the sweep exists to bound memory,
    /// not for correctness.
    pub fn sweep_expired(&self, now_ms: u64) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now_ms));
        before - entries.len()
    }

    /// Number of live entries, stale ones included until swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn is_fresh(&self, entry: &CacheEntry, now_ms: u64) -> bool {
        now_ms.saturating_sub(entry.stored_at_ms) <= self.ttl.as_millis() as u64
    }
}

/// Deterministic fingerprint of a task's defining fields.
///
/// SHA-256 (lower-hex) over kind, description, and a canonical rendering of
/// the payload. Object keys are sorted recursively, so two payloads that
/// differ only in key order produce the same fingerprint.
#[must_use]
pub fn fingerprint(kind: TaskKind, description: &str, payload: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(payload, &mut canonical);
    let joined = format!("{}\n{description}\n{canonical}", kind.as_str());
    let digest = Sha256::digest(joined.as_bytes());
    format!("{digest:x}")
}

/// Render a JSON value with object keys sorted at every level.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
