//! Per-file diffs for the provider's context gathering

use aireview_core::{DiffSource, FileDiff};
use async_trait::async_trait;
use tracing::debug;

use crate::client::encode_segment;
use crate::{GerritClient, Result};

impl GerritClient {
    /// Get the full-context diff of `file` in the change's current revision
    ///
    /// Endpoint: `/changes/{change}/revisions/current/files/{file}/diff?context=ALL`
    pub async fn get_diff(&self, change: u64, file: &str) -> Result<FileDiff> {
        let path = format!(
            "/changes/{}/revisions/current/files/{}/diff?context=ALL",
            change,
            encode_segment(file)
        );
        let diff: FileDiff = self.get_json(&path).await?;
        debug!(change, file, hunks = diff.content.len(), "Fetched diff");
        Ok(diff)
    }
}

#[async_trait]
impl DiffSource for GerritClient {
    async fn fetch_diff(&self, change: u64, path: &str) -> aireview_core::Result<FileDiff> {
        Ok(self.get_diff(change, path).await?)
    }
}
