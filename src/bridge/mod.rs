pub mod runner;

pub use runner::BridgeRunner;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{BridgeMetadata, Item, Params};

/// Capability set every bridge implements: collect items from one external
/// source and describe itself.
///
/// A bridge instance lives for one invocation; it owns nothing beyond its
/// descriptor metadata and whatever clients it captured at construction.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Descriptor metadata loaded by the registry at instantiation.
    fn metadata(&self) -> &BridgeMetadata;

    /// Display name of the source.
    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Source URI.
    fn uri(&self) -> &str {
        &self.metadata().uri
    }

    /// Seconds a cached result stays fresh. Defaults to the descriptor
    /// value (one hour when the descriptor is silent).
    fn cache_duration(&self) -> u64 {
        self.metadata().cache_duration
    }

    /// Collect items from the source for one invocation.
    ///
    /// Fails with [`EstuaryError::DataSource`](crate::app::EstuaryError)
    /// when the upstream input is unusable. The failure propagates uncaught;
    /// the caller decides on retry or degradation.
    async fn collect_data(&mut self, params: &Params) -> Result<Vec<Item>>;
}
