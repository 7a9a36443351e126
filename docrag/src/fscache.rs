//! Filesystem-backed document cache.
//!
//! Layout mirrors one entry per `(name, content hash)` key:
//! `{dir}/metadata/{name}_{hash12}.json` holds the serialized
//! [`CachedDocument`] and `{dir}/markdown/{name}_{hash12}.md` a readable
//! copy of the enriched markdown.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use docrag_core::{
    CacheSummary, CachedDocument, DocragError, DocumentCache, DocumentId, Result,
};

/// A document cache persisting entries as JSON files on disk.
pub struct FsDocumentCache {
    metadata_dir: PathBuf,
    markdown_dir: PathBuf,
}

impl FsDocumentCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let metadata_dir = dir.join("metadata");
        let markdown_dir = dir.join("markdown");
        fs::create_dir_all(&metadata_dir)
            .and_then(|()| fs::create_dir_all(&markdown_dir))
            .map_err(|e| DocragError::Cache(format!("failed to create cache dirs: {e}")))?;
        Ok(Self { metadata_dir, markdown_dir })
    }

    fn cache_key(id: &DocumentId) -> String {
        format!("{}_{}", id.name, id.short_hash())
    }

    fn metadata_path(&self, id: &DocumentId) -> PathBuf {
        self.metadata_dir.join(format!("{}.json", Self::cache_key(id)))
    }

    fn markdown_path(&self, id: &DocumentId) -> PathBuf {
        self.markdown_dir.join(format!("{}.md", Self::cache_key(id)))
    }
}

#[async_trait]
impl DocumentCache for FsDocumentCache {
    async fn get(&self, id: &DocumentId) -> Result<Option<CachedDocument>> {
        let path = self.metadata_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| DocragError::Cache(format!("failed to read cache entry: {e}")))?;
        let cached = serde_json::from_str(&content)
            .map_err(|e| DocragError::Cache(format!("corrupt cache entry: {e}")))?;
        debug!(key = %Self::cache_key(id), "cache hit");
        Ok(Some(cached))
    }

    async fn put(&self, document: &CachedDocument) -> Result<()> {
        let id = &document.document_id;
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| DocragError::Cache(format!("failed to serialize cache entry: {e}")))?;
        fs::write(self.metadata_path(id), json)
            .map_err(|e| DocragError::Cache(format!("failed to write cache entry: {e}")))?;
        fs::write(self.markdown_path(id), &document.markdown)
            .map_err(|e| DocragError::Cache(format!("failed to write cached markdown: {e}")))?;
        debug!(key = %Self::cache_key(id), "cached document");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        for dir in [&self.metadata_dir, &self.markdown_dir] {
            let entries = fs::read_dir(dir)
                .map_err(|e| DocragError::Cache(format!("failed to list cache dir: {e}")))?;
            for entry in entries.flatten() {
                if let Err(e) = fs::remove_file(entry.path()) {
                    warn!(path = %entry.path().display(), error = %e, "failed to remove cache file");
                }
            }
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<CacheSummary>> {
        let entries = fs::read_dir(&self.metadata_dir)
            .map_err(|e| DocragError::Cache(format!("failed to list cache dir: {e}")))?;

        let mut summaries = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            // Unreadable entries are skipped, not fatal: listing is advisory.
            let Ok(content) = fs::read_to_string(&path) else {
                warn!(path = %path.display(), "unreadable cache entry skipped");
                continue;
            };
            let Ok(cached) = serde_json::from_str::<CachedDocument>(&content) else {
                warn!(path = %path.display(), "corrupt cache entry skipped");
                continue;
            };
            summaries.push(CacheSummary {
                name: cached.document_id.name,
                page_count: cached.pages.len(),
                image_count: cached.images.len(),
            });
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }
}
