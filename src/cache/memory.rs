use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::app::{EstuaryError, Result};
use crate::cache::{fingerprint, ResultCache};
use crate::domain::{Item, Params};

/// In-memory [`ResultCache`] backend.
///
/// Reference implementation for embedders that do not need persistence.
#[derive(Default)]
pub struct MemoryCache {
    entries: HashMap<String, (DateTime<Utc>, Vec<Item>)>,
    key: Option<String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&self) -> Result<&str> {
        self.key
            .as_deref()
            .ok_or_else(|| EstuaryError::Cache("cache accessed before prepare".to_string()))
    }
}

impl ResultCache for MemoryCache {
    fn prepare(&mut self, bridge: &str, params: &Params) {
        self.key = Some(fingerprint(bridge, params));
    }

    fn last_written(&self) -> Option<DateTime<Utc>> {
        let key = self.key.as_deref()?;
        self.entries.get(key).map(|(written, _)| *written)
    }

    fn load(&self) -> Result<Vec<Item>> {
        let key = self.key()?;
        self.entries
            .get(key)
            .map(|(_, items)| items.clone())
            .ok_or_else(|| EstuaryError::Cache(format!("no entry under key {key}")))
    }

    fn save(&mut self, items: &[Item]) -> Result<()> {
        let key = self.key()?.to_string();
        self.entries.insert(key, (Utc::now(), items.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(user: &str) -> Params {
        let mut params = Params::new();
        params.insert("u".into(), user.into());
        params
    }

    #[test]
    fn test_never_cached_yields_no_time() {
        let mut cache = MemoryCache::new();
        cache.prepare("Example", &params("alice"));
        assert_eq!(cache.last_written(), None);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let mut cache = MemoryCache::new();
        cache.prepare("Example", &params("alice"));

        let mut item = Item::new();
        item.title = Some("hello".into());
        cache.save(std::slice::from_ref(&item)).unwrap();

        assert!(cache.last_written().is_some());
        assert_eq!(cache.load().unwrap(), vec![item]);
    }

    #[test]
    fn test_entries_are_keyed_by_params() {
        let mut cache = MemoryCache::new();
        cache.prepare("Example", &params("alice"));
        cache.save(&[Item::new()]).unwrap();

        cache.prepare("Example", &params("bob"));
        assert_eq!(cache.last_written(), None);
        assert!(cache.load().is_err());
    }

    #[test]
    fn test_save_overwrites_and_refreshes() {
        let mut cache = MemoryCache::new();
        cache.prepare("Example", &params("alice"));
        cache.save(&[Item::new()]).unwrap();
        let first = cache.last_written().unwrap();

        let mut item = Item::new();
        item.title = Some("second".into());
        cache.save(std::slice::from_ref(&item)).unwrap();

        assert!(cache.last_written().unwrap() >= first);
        assert_eq!(cache.load().unwrap(), vec![item]);
    }

    #[test]
    fn test_access_before_prepare_is_an_error() {
        let cache = MemoryCache::new();
        assert_eq!(cache.last_written(), None);
        assert!(cache.load().is_err());
    }
}
