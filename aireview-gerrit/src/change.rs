//! Change metadata and changed-file listings

use std::collections::BTreeMap;

use aireview_core::{ChangeInfo, ChangedFile, FileStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GerritClient, Result};

/// Entry of `GET /changes/{id}/revisions/current/files`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFileInfo {
    /// Change status (absent in the response for modified files)
    #[serde(default)]
    pub status: FileStatus,
    /// Lines added
    #[serde(default)]
    pub lines_inserted: u64,
    /// Lines removed
    #[serde(default)]
    pub lines_deleted: u64,
    /// Previous path for renames and copies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
}

impl GerritClient {
    /// Get change metadata (number, subject, project)
    pub async fn get_change(&self, change: u64) -> Result<ChangeInfo> {
        self.get_json(&format!("/changes/{}", change)).await
    }

    /// List files touched by the change's current revision
    ///
    /// Files come back sorted by path, which puts `/COMMIT_MSG` first.
    pub async fn list_files(&self, change: u64) -> Result<Vec<ChangedFile>> {
        let files: BTreeMap<String, ChangedFileInfo> = self
            .get_json(&format!("/changes/{}/revisions/current/files", change))
            .await?;

        debug!(change, count = files.len(), "Listed changed files");

        Ok(files
            .into_iter()
            .map(|(path, info)| ChangedFile::new(path).with_status(info.status))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/changes/4242/revisions/current/files"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#")]}'
{
  "/COMMIT_MSG": {"status": "A", "lines_inserted": 7, "size_delta": 551, "size": 551},
  "src/parser.rs": {"lines_inserted": 5, "lines_deleted": 3},
  "src/new.rs": {"status": "A", "lines_inserted": 40},
  "docs/old.md": {"status": "R", "old_path": "docs/older.md"}
}"#,
            ))
            .mount(&server)
            .await;

        let client = GerritClient::new(&server.uri()).unwrap();
        let files = client.list_files(4242).await.unwrap();

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["/COMMIT_MSG", "docs/old.md", "src/new.rs", "src/parser.rs"]);
        assert!(files[0].is_metadata());
        assert_eq!(files[1].status, FileStatus::Renamed);
        assert_eq!(files[2].status, FileStatus::Added);
        assert_eq!(files[3].status, FileStatus::Modified);
    }

    #[tokio::test]
    async fn test_get_change() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/changes/4242"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#")]}'
{"id": "proj~main~I8473b95934b5732ac55d26311a706c9c2bde9940", "project": "proj", "branch": "main", "subject": "Fix the parser", "_number": 4242}"#,
            ))
            .mount(&server)
            .await;

        let client = GerritClient::new(&server.uri()).unwrap();
        let change = client.get_change(4242).await.unwrap();
        assert_eq!(change.number, 4242);
        assert_eq!(change.subject.as_deref(), Some("Fix the parser"));
        assert_eq!(change.project.as_deref(), Some("proj"));
    }
}
