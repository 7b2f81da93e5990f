//! Context gathering: turns changed-file diffs into one prompt-ready blob

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::ReviewConfig;
use crate::review::request::{ChangedFile, FileDiff};
use crate::{Error, Result};

/// Host diff service (`GET /changes/{id}/revisions/current/files/{path}/diff?context=ALL`)
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Fetch the full-context diff of one file in the change's current revision
    async fn fetch_diff(&self, change: u64, path: &str) -> Result<FileDiff>;
}

/// Bounds applied while gathering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    /// Files considered, counted from the start of the request's list
    pub max_files: usize,
    /// Optional ceiling on the blob size in bytes
    pub max_context_bytes: Option<usize>,
    /// Diff fetches in flight at once
    pub fetch_concurrency: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self::from(&ReviewConfig::default())
    }
}

impl From<&ReviewConfig> for ContextLimits {
    fn from(config: &ReviewConfig) -> Self {
        Self {
            max_files: config.max_files,
            max_context_bytes: config.max_context_bytes,
            fetch_concurrency: config.fetch_concurrency.max(1),
        }
    }
}

/// Render one file's section of the blob
pub fn file_block(path: &str, content: &str) -> String {
    format!("\n--- File: {} ---\n{}\n", path, content)
}

/// Fetches diffs for a bounded set of files and concatenates their current side
pub struct ContextGatherer {
    source: Arc<dyn DiffSource>,
    limits: ContextLimits,
}

impl ContextGatherer {
    /// Create a gatherer over the given diff source
    pub fn new(source: Arc<dyn DiffSource>, limits: ContextLimits) -> Self {
        Self { source, limits }
    }

    /// The limits in effect
    pub fn limits(&self) -> ContextLimits {
        self.limits
    }

    /// Files that will be fetched for `files`, in request order
    ///
    /// The file cap is applied first, then the commit-message pseudo-file is
    /// dropped wherever it sits.
    pub fn select<'a>(&self, files: &'a [ChangedFile]) -> Vec<&'a ChangedFile> {
        if files.len() > self.limits.max_files {
            debug!(
                total = files.len(),
                max_files = self.limits.max_files,
                "Truncating file list"
            );
        }

        files
            .iter()
            .take(self.limits.max_files)
            .filter(|f| !f.is_metadata())
            .collect()
    }

    /// Build the context blob for `change`
    ///
    /// Blocks appear in request order regardless of the order fetches finish.
    /// The first failed fetch aborts gathering with [`Error::ContextFetch`].
    pub async fn gather(&self, change: u64, files: &[ChangedFile]) -> Result<String> {
        let selected: Vec<ChangedFile> = self.select(files).into_iter().cloned().collect();
        info!(change, files = selected.len(), "Gathering review context");

        let mut fetches = stream::iter(selected)
            .map(|file| {
                let source = Arc::clone(&self.source);
                async move {
                    debug!(change, path = %file.path, "Fetching diff");
                    let diff = source.fetch_diff(change, &file.path).await.map_err(|e| match e {
                        Error::ContextFetch { .. } => e,
                        other => Error::ContextFetch {
                            path: file.path.clone(),
                            reason: other.to_string(),
                        },
                    })?;
                    Ok::<_, Error>((file, diff))
                }
            })
            .buffered(self.limits.fetch_concurrency.max(1));

        let mut blob = String::new();
        while let Some(fetched) = fetches.next().await {
            let (file, diff) = fetched?;
            let block = file_block(&file.path, &diff.current_text());

            if let Some(max) = self.limits.max_context_bytes {
                if blob.len() + block.len() > max {
                    warn!(
                        path = %file.path,
                        max_context_bytes = max,
                        "Context size limit reached, omitting remaining files"
                    );
                    break;
                }
            }

            blob.push_str(&block);
        }

        debug!(change, bytes = blob.len(), "Context gathered");
        Ok(blob)
    }
}
