pub mod memory;

pub use memory::MemoryCache;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::app::Result;
use crate::domain::{Item, Params};

/// The four-operation store the run lifecycle consumes. The backend is the
/// embedder's business; the core only depends on this contract.
///
/// Access is externally synchronized: the core never shares one cache
/// between invocations.
pub trait ResultCache: Send {
    /// Select the cache key for this invocation. Must be called before any
    /// other operation.
    fn prepare(&mut self, bridge: &str, params: &Params);

    /// Time of the last write under the prepared key, or `None` if the key
    /// has never been written. `None` is distinct from "written at epoch".
    fn last_written(&self) -> Option<DateTime<Utc>>;

    /// Load the items stored under the prepared key.
    fn load(&self) -> Result<Vec<Item>>;

    /// Store `items` under the prepared key, overwriting any prior entry
    /// and refreshing its write time.
    fn save(&mut self, items: &[Item]) -> Result<()>;
}

/// Cache key for one bridge invocation: SHA-256 over the bridge name and
/// the canonical JSON form of its parameters. `Params` is a `BTreeMap`, so
/// key order is stable across invocations.
pub fn fingerprint(bridge: &str, params: &Params) -> String {
    let canonical = serde_json::to_string(params).expect("params are always serializable");
    let mut hasher = Sha256::new();
    hasher.update(bridge.as_bytes());
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let mut params = Params::new();
        params.insert("u".into(), "alice".into());

        assert_eq!(fingerprint("Example", &params), fingerprint("Example", &params));
    }

    #[test]
    fn test_fingerprint_depends_on_bridge_and_params() {
        let mut params = Params::new();
        params.insert("u".into(), "alice".into());
        let mut other = Params::new();
        other.insert("u".into(), "bob".into());

        assert_ne!(fingerprint("Example", &params), fingerprint("Other", &params));
        assert_ne!(fingerprint("Example", &params), fingerprint("Example", &other));
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = fingerprint("Example", &Params::new());
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_ignores_insertion_order() {
        let mut a = Params::new();
        a.insert("x".into(), "1".into());
        a.insert("y".into(), "2".into());
        let mut b = Params::new();
        b.insert("y".into(), "2".into());
        b.insert("x".into(), "1".into());

        assert_eq!(fingerprint("Example", &a), fingerprint("Example", &b));
    }
}
