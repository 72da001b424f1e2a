use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{EstuaryError, Result};
use crate::expander::FeedExpander;
use crate::fetcher::{HttpPageFetcher, PageFetcher};
use crate::pagecache::PageCache;
use crate::registry::BridgeRegistry;

/// Wires together the core components: registry, page cache and feed
/// expander, all sharing one HTTP fetcher.
pub struct AppContext {
    pub registry: BridgeRegistry,
    pub page_cache: Arc<PageCache>,
    pub expander: FeedExpander,
}

impl AppContext {
    /// Build a context over a bridge descriptor directory, with the page
    /// cache under the platform cache directory.
    pub fn new(bridge_root: impl Into<PathBuf>) -> Result<Self> {
        let cache_root = Self::default_cache_root()?;
        Self::with_cache_root(bridge_root, cache_root)
    }

    pub fn with_cache_root(
        bridge_root: impl Into<PathBuf>,
        cache_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        let registry = BridgeRegistry::new(bridge_root)?;
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new());
        let page_cache = Arc::new(PageCache::new(cache_root, fetcher.clone()));
        let expander = FeedExpander::new(fetcher);

        Ok(Self {
            registry,
            page_cache,
            expander,
        })
    }

    fn default_cache_root() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| EstuaryError::Config("Could not find cache directory".into()))?;
        let root = cache_dir.join("estuary").join("pages");
        std::fs::create_dir_all(&root)?;
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_with_cache_root_wires_the_components() {
        let bridges = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();

        let ctx = AppContext::with_cache_root(bridges.path(), cache.path()).unwrap();
        assert_eq!(ctx.registry.root(), bridges.path());
        assert_eq!(ctx.page_cache.root(), cache.path());
    }

    #[test]
    fn test_missing_bridge_root_fails() {
        let cache = TempDir::new().unwrap();
        let err = AppContext::with_cache_root("/nonexistent/bridges", cache.path())
            .err()
            .unwrap();
        assert!(matches!(err, EstuaryError::Config(_)));
    }
}
