pub mod http;

pub use http::HttpPageFetcher;

use async_trait::async_trait;

use futures::stream::BoxStream;

use crate::app::Result;

/// Body of a remote document, yielded in bounded chunks.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>>>;

/// Streaming source of remote documents.
///
/// Implementations yield the body chunk by chunk so consumers can copy to
/// disk without ever buffering the whole payload. Dropping the stream
/// cancels the transfer.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn open(&self, url: &str) -> Result<ChunkStream>;
}
