use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use futures::StreamExt;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::app::Result;
use crate::fetcher::PageFetcher;

/// Document name substituted when a normalized URL ends in a separator.
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// File-backed store of raw fetched documents keyed by normalized URL.
///
/// All state is the directory tree under `root`; there is no in-process
/// index. Recency is encoded in filesystem mtimes: every hit touches the
/// entry and each ancestor directory up to (excluding) the root, so
/// retention tooling can prune cold subtrees from timestamps alone.
///
/// The tree is shared mutable state across invocations. First fetches of
/// the same key are made safe by streaming into a temp file and renaming
/// it into place: at most one writer installs a key and a reader never
/// observes a partial write.
pub struct PageCache {
    root: PathBuf,
    fetcher: Arc<dyn PageFetcher>,
}

impl PageCache {
    pub fn new(root: impl Into<PathBuf>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            root: root.into(),
            fetcher,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URL to its relative cache path.
    ///
    /// The `http://` or `https://` scheme prefix is stripped first, so both
    /// scheme variants of one URL share an entry. Each of `?`, `&` and `=`
    /// then becomes a path separator. A trailing separator gets
    /// [`DEFAULT_DOCUMENT`] appended.
    pub fn normalize_url(url: &str) -> PathBuf {
        let stripped = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
            .unwrap_or(url);

        let mut simplified: String = stripped
            .chars()
            .map(|c| match c {
                '?' | '&' | '=' => '/',
                c => c,
            })
            .collect();

        if simplified.ends_with('/') {
            simplified.push_str(DEFAULT_DOCUMENT);
        }

        PathBuf::from(simplified)
    }

    /// Serve `url` from the cache, fetching and storing it on first access.
    ///
    /// A hit refreshes the recency signal; a miss downloads the document
    /// and installs it atomically. Fetch and I/O failures surface as typed
    /// errors, never as an empty payload.
    pub async fn fetch_or_serve(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.entry_path(url);

        if path.exists() {
            debug!(url, path = %path.display(), "page cache hit");
            self.touch_upward(&path)?;
        } else {
            debug!(url, path = %path.display(), "page cache miss, downloading");
            self.download(url, &path).await?;
        }

        Ok(fs::read(&path)?)
    }

    /// Last-change time of the cache entry for `url`, fetching it first if
    /// absent.
    pub async fn cached_time(&self, url: &str) -> Result<SystemTime> {
        let path = self.entry_path(url);
        if !path.exists() {
            self.fetch_or_serve(url).await?;
        }
        Ok(fs::metadata(&path)?.modified()?)
    }

    /// Delete the cache entry for `url` if present.
    pub fn remove(&self, url: &str) -> Result<()> {
        let path = self.entry_path(url);
        if path.exists() {
            debug!(url, path = %path.display(), "removing page cache entry");
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.root.join(Self::normalize_url(url))
    }

    /// Stream the remote body through a temp file in the target directory,
    /// then rename it into place. A failed download leaves no entry behind.
    async fn download(&self, url: &str, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let mut stream = self.fetcher.open(url).await?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        while let Some(chunk) = stream.next().await {
            tmp.write_all(&chunk?)?;
        }
        tmp.persist(path).map_err(|e| e.error)?;

        Ok(())
    }

    /// Refresh the mtime of `path` and every ancestor directory up to but
    /// not including the cache root.
    fn touch_upward(&self, path: &Path) -> Result<()> {
        let now = SystemTime::now();
        let mut current = Some(path);
        while let Some(p) = current {
            if p == self.root {
                break;
            }
            fs::File::open(p)?.set_modified(now)?;
            current = p.parent();
        }
        Ok(())
    }
}
