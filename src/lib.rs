//! # Estuary
//!
//! A pluggable bridge framework that normalizes content from heterogeneous
//! external sources into a uniform item model.
//!
//! ## Architecture
//!
//! ```text
//! Registry → Bridge → (PageCache | FeedExpander) → Items → ResultCache
//! ```
//!
//! A caller asks the [`BridgeRegistry`](registry::BridgeRegistry) to
//! instantiate a bridge by name, then drives it through the
//! [`BridgeRunner`](bridge::BridgeRunner) lifecycle: check freshness,
//! reuse or recompute, persist. On a recompute the bridge's `collect_data`
//! may use the [`PageCache`](pagecache::PageCache) (page-scraping bridges)
//! or the [`FeedExpander`](expander::FeedExpander) (feed bridges).
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`domain`]: Core domain models (Item, BridgeMetadata, Params)
//! - [`bridge`]: The `Bridge` trait and TTL-gated run lifecycle
//! - [`registry`]: Bridge discovery, validation and instantiation
//! - [`cache`]: The `ResultCache` contract and fingerprinting
//! - [`fetcher`]: Streaming remote fetch seam
//! - [`pagecache`]: File-backed page cache keyed by normalized URL
//! - [`expander`]: RSS 2.0 feed-expansion pipeline

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the registry,
/// page cache and feed expander.
pub mod app;

/// The `Bridge` trait and the run lifecycle.
///
/// - [`Bridge`](bridge::Bridge): capability set every adapter implements
/// - [`BridgeRunner`](bridge::BridgeRunner): check freshness → reuse or
///   recompute → persist
pub mod bridge;

/// Result caching.
///
/// - [`ResultCache`](cache::ResultCache): the four-operation store contract
/// - [`fingerprint`](cache::fingerprint): cache-key derivation
/// - [`MemoryCache`](cache::MemoryCache): in-memory reference backend
pub mod cache;

/// Core domain models.
///
/// - [`Item`](domain::Item): one normalized unit of content
/// - [`BridgeMetadata`](domain::BridgeMetadata): descriptor metadata
/// - [`Params`](domain::Params): raw request-style parameters
pub mod domain;

/// RSS 2.0 feed-expansion pipeline.
///
/// Always fetches fresh (no caching), parses `channel`/`item` structure and
/// maps raw items through a bridge-supplied function.
pub mod expander;

/// Streaming remote fetch.
///
/// - [`PageFetcher`](fetcher::PageFetcher): async trait yielding bounded
///   body chunks
/// - [`HttpPageFetcher`](fetcher::HttpPageFetcher): reqwest-based
///   implementation
pub mod fetcher;

/// File-backed page cache.
///
/// Raw fetched documents keyed by normalized URL, with recency propagated
/// up the directory tree on access.
pub mod pagecache;

/// Bridge discovery and instantiation.
///
/// Validates names, enumerates descriptor files and instantiates bridges
/// through a name-to-factory table.
pub mod registry;
