use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use html_escape::decode_html_entities;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::app::{EstuaryError, Result};
use crate::domain::Item;
use crate::fetcher::PageFetcher;

/// Feed-level metadata from the RSS `channel` element, whitespace-trimmed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelMeta {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// One raw `<item>` from the feed, before mapping into an [`Item`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    /// Raw `pubDate` string; see [`parse_pub_date`].
    pub pub_date: Option<String>,
    pub guid: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
}

/// Parse an RFC-822 style RSS `pubDate` ("Ddd, dd Mon yyyy HH:mm:ss TZ")
/// into a UTC timestamp.
///
/// A malformed date is an error; mapping functions that propagate it make
/// the date a hard failure for that item.
pub fn parse_pub_date(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EstuaryError::FeedParse(format!("invalid pubDate {raw:?}: {e}")))
}

/// Fetch-and-parse pipeline for RSS 2.0 feeds.
///
/// Fetches are always direct and uncached — deliberately bypassing both the
/// result cache and the page cache — so every call sees a fresh view of the
/// syndicated stream. Only the RSS 2.0 `channel`/`item` structure is
/// understood; there is no format auto-detection.
pub struct FeedExpander {
    fetcher: Arc<dyn PageFetcher>,
}

impl FeedExpander {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Expand the feed at `source_url`, mapping each raw item in document
    /// order through `map` — the extension point every concrete feed bridge
    /// supplies.
    pub async fn collect_expandable<F>(
        &self,
        source_url: &str,
        mut map: F,
    ) -> Result<(ChannelMeta, Vec<Item>)>
    where
        F: FnMut(&RssItem) -> Result<Item>,
    {
        if source_url.is_empty() {
            return Err(EstuaryError::data_source(
                404,
                "there is no source url for this feed expander",
            ));
        }

        let body = self.fetch_fresh(source_url).await?;
        let (meta, raw_items) = parse_rss(&body).map_err(|e| {
            EstuaryError::data_source(404, format!("could not parse {source_url}: {e}"))
        })?;
        debug!(url = source_url, items = raw_items.len(), "expanded feed");

        let mut items = Vec::with_capacity(raw_items.len());
        for raw in &raw_items {
            items.push(map(raw)?);
        }

        Ok((meta, items))
    }

    async fn fetch_fresh(&self, url: &str) -> Result<Vec<u8>> {
        let mut stream = self.fetcher.open(url).await.map_err(|e| {
            EstuaryError::data_source(404, format!("could not request {url}: {e}"))
        })?;

        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                EstuaryError::data_source(404, format!("could not request {url}: {e}"))
            })?;
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// Parse the RSS 2.0 `channel`/`item` structure out of `body`.
fn parse_rss(body: &[u8]) -> Result<(ChannelMeta, Vec<RssItem>)> {
    let xml = std::str::from_utf8(body)
        .map_err(|e| EstuaryError::FeedParse(format!("feed is not valid UTF-8: {e}")))?;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = true;

    let mut meta = ChannelMeta::default();
    let mut items = Vec::new();
    let mut seen_channel = false;
    let mut current_item: Option<RssItem> = None;

    // Open-element stack; the parent of the element being closed decides
    // where its text goes, so nested structures like channel/image cannot
    // clobber the channel metadata.
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if name == "channel" {
                    seen_channel = true;
                } else if name == "item" {
                    current_item = Some(RssItem::default());
                }
                stack.push(name);
                text.clear();
            }
            Ok(Event::Text(e)) => {
                let unescaped = e
                    .unescape()
                    .map_err(|e| EstuaryError::FeedParse(format!("XML parse error: {e}")))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(e)) => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(_)) => {
                let Some(name) = stack.pop() else {
                    return Err(EstuaryError::FeedParse("unbalanced end tag".to_string()));
                };
                let parent = stack.last().map(String::as_str);
                let value = decode_html_entities(text.trim()).to_string();

                if name == "item" {
                    if let Some(item) = current_item.take() {
                        items.push(item);
                    }
                } else if parent == Some("item") {
                    if let Some(item) = current_item.as_mut() {
                        match name.as_str() {
                            "title" => item.title = Some(value),
                            "link" => item.link = Some(value),
                            "description" => item.description = Some(value),
                            "pubDate" => item.pub_date = Some(value),
                            "guid" => item.guid = Some(value),
                            "author" | "creator" => item.author = Some(value),
                            "category" => item.category = Some(value),
                            _ => {}
                        }
                    }
                } else if parent == Some("channel") {
                    match name.as_str() {
                        "title" => meta.title = value,
                        "link" => meta.link = value,
                        "description" => meta.description = value,
                        _ => {}
                    }
                }

                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(EstuaryError::FeedParse(format!("XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_channel {
        return Err(EstuaryError::FeedParse(
            "document has no RSS 2.0 channel element".to_string(),
        ));
    }

    Ok((meta, items))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;
    use futures::stream;

    use super::*;
    use crate::fetcher::ChunkStream;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>  Test Feed </title>
    <link>https://example.com/</link>
    <description>A &amp; B</description>
    <item>
      <title>First</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 02 Jan 2006 15:04:05 GMT</pubDate>
      <description><![CDATA[This is <b>item 1</b>]]></description>
    </item>
    <item>
      <title>Second</title>
      <link>https://example.com/item2</link>
      <guid>item-2</guid>
      <pubDate>Tue, 03 Jan 2006 15:04:05 GMT</pubDate>
      <description>This is item 2</description>
    </item>
  </channel>
</rss>"#;

    struct StubFetcher {
        body: Vec<u8>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn new(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: body.as_bytes().to_vec(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn open(&self, _url: &str) -> Result<ChunkStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(stream::iter(vec![Ok(self.body.clone())]).boxed())
        }
    }

    fn map_raw(raw: &RssItem) -> Result<Item> {
        let mut item = Item::new();
        item.title = raw.title.clone();
        item.link = raw.link.clone();
        item.content = raw.description.clone();
        item.timestamp = raw.pub_date.as_deref().map(parse_pub_date).transpose()?;
        Ok(item)
    }

    #[tokio::test]
    async fn test_empty_source_url_fails_without_a_fetch() {
        let fetcher = StubFetcher::new(RSS_SAMPLE);
        let expander = FeedExpander::new(fetcher.clone());

        let err = expander.collect_expandable("", map_raw).await.unwrap_err();
        assert!(matches!(err, EstuaryError::DataSource { code: 404, .. }));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_xml_is_a_404() {
        let fetcher = StubFetcher::new("<rss><channel><title>oops</channel>");
        let expander = FeedExpander::new(fetcher);

        let err = expander
            .collect_expandable("https://example.com/feed.xml", map_raw)
            .await
            .unwrap_err();
        assert!(matches!(err, EstuaryError::DataSource { code: 404, .. }));
    }

    #[tokio::test]
    async fn test_non_rss_document_is_a_404() {
        let fetcher = StubFetcher::new("<html><body>not a feed</body></html>");
        let expander = FeedExpander::new(fetcher);

        let err = expander
            .collect_expandable("https://example.com/feed.xml", map_raw)
            .await
            .unwrap_err();
        assert!(matches!(err, EstuaryError::DataSource { code: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_a_404() {
        struct DownFetcher;

        #[async_trait]
        impl PageFetcher for DownFetcher {
            async fn open(&self, _url: &str) -> Result<ChunkStream> {
                Err(EstuaryError::data_source(500, "connection refused"))
            }
        }

        let expander = FeedExpander::new(Arc::new(DownFetcher));
        let err = expander
            .collect_expandable("https://example.com/feed.xml", map_raw)
            .await
            .unwrap_err();
        assert!(matches!(err, EstuaryError::DataSource { code: 404, .. }));
    }

    #[tokio::test]
    async fn test_two_item_feed_in_document_order() {
        let fetcher = StubFetcher::new(RSS_SAMPLE);
        let expander = FeedExpander::new(fetcher);

        let (meta, items) = expander
            .collect_expandable("https://example.com/feed.xml", map_raw)
            .await
            .unwrap();

        assert_eq!(meta.title, "Test Feed");
        assert_eq!(meta.link, "https://example.com/");
        assert_eq!(meta.description, "A & B");

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("First"));
        assert_eq!(items[1].title.as_deref(), Some("Second"));
        assert_eq!(items[0].content.as_deref(), Some("This is <b>item 1</b>"));
        assert_eq!(
            items[0].timestamp,
            Some(Utc.timestamp_opt(1_136_214_245, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_malformed_pub_date_is_a_hard_failure_for_the_item() {
        let feed = r#"<rss version="2.0"><channel><title>F</title>
<item><title>Bad date</title><pubDate>yesterday-ish</pubDate></item>
</channel></rss>"#;
        let expander = FeedExpander::new(StubFetcher::new(feed));

        let err = expander
            .collect_expandable("https://example.com/feed.xml", map_raw)
            .await
            .unwrap_err();
        assert!(matches!(err, EstuaryError::FeedParse(_)));
    }

    #[test]
    fn test_parse_pub_date() {
        let ts = parse_pub_date("Mon, 02 Jan 2006 15:04:05 GMT").unwrap();
        assert_eq!(ts, Utc.timestamp_opt(1_136_214_245, 0).unwrap());

        assert!(parse_pub_date("not a date").is_err());
    }

    #[test]
    fn test_channel_image_does_not_clobber_metadata() {
        let feed = r#"<rss version="2.0"><channel>
<title>Real Title</title>
<image><title>Logo</title><url>https://example.com/logo.png</url></image>
</channel></rss>"#;

        let (meta, items) = parse_rss(feed.as_bytes()).unwrap();
        assert_eq!(meta.title, "Real Title");
        assert!(items.is_empty());
    }
}
