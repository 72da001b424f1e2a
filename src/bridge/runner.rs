use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::app::Result;
use crate::bridge::Bridge;
use crate::cache::ResultCache;
use crate::domain::{Item, Params};

/// Drives one bridge invocation through the lifecycle: check freshness,
/// reuse or recompute, persist.
///
/// The runner owns the bridge's current item collection for the duration
/// of the invocation.
pub struct BridgeRunner {
    bridge_name: String,
    bridge: Box<dyn Bridge>,
    cache: Option<Box<dyn ResultCache>>,
    items: Vec<Item>,
}

impl BridgeRunner {
    pub fn new(bridge_name: impl Into<String>, bridge: Box<dyn Bridge>) -> Self {
        Self {
            bridge_name: bridge_name.into(),
            bridge,
            cache: None,
            items: Vec::new(),
        }
    }

    /// Bind a result cache. Without one every `run` collects.
    #[must_use]
    pub fn with_cache(mut self, cache: Box<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Registered name the bridge was created under.
    pub fn bridge_name(&self) -> &str {
        &self.bridge_name
    }

    pub fn bridge(&self) -> &dyn Bridge {
        self.bridge.as_ref()
    }

    /// Read-only view of the current item collection.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn cache_duration(&self) -> u64 {
        self.bridge.cache_duration()
    }

    /// Run one invocation with the given parameters.
    pub async fn run(&mut self, params: &Params) -> Result<()> {
        self.run_at(params, Utc::now()).await
    }

    /// [`run`](Self::run) with an explicit notion of "now".
    ///
    /// A cached entry is reused iff `now - cache_duration < written`,
    /// strictly less: an entry exactly `cache_duration` old is stale.
    pub async fn run_at(&mut self, params: &Params, now: DateTime<Utc>) -> Result<()> {
        let duration = Duration::seconds(self.bridge.cache_duration() as i64);

        if let Some(cache) = self.cache.as_mut() {
            cache.prepare(&self.bridge_name, params);
            if let Some(written) = cache.last_written() {
                if now - duration < written {
                    debug!(bridge = %self.bridge_name, "serving items from result cache");
                    self.items = cache.load()?;
                    return Ok(());
                }
            }
        }

        self.items = self.bridge.collect_data(params).await?;

        if let Some(cache) = self.cache.as_mut() {
            debug!(
                bridge = %self.bridge_name,
                count = self.items.len(),
                "refreshing result cache"
            );
            cache.save(&self.items)?;
        }

        Ok(())
    }
}
