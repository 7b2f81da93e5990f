//! Review requests handed to the provider by the host
//!
//! Field names follow the host's JSON shape so a request can be deserialized
//! directly from what the review UI sends.

use serde::{Deserialize, Serialize};

/// Pseudo-file Gerrit uses to expose the commit message as a diffable file
pub const COMMIT_MSG_PATH: &str = "/COMMIT_MSG";

/// How a file changed in the revision under review
///
/// Gerrit reports these as single letters and omits the field for
/// modified files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FileStatus {
    #[default]
    #[serde(rename = "M")]
    Modified,
    #[serde(rename = "A")]
    Added,
    #[serde(rename = "D")]
    Deleted,
    #[serde(rename = "R")]
    Renamed,
    #[serde(rename = "C")]
    Copied,
    #[serde(rename = "W")]
    Rewritten,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileStatus::Modified => "modified",
            FileStatus::Added => "added",
            FileStatus::Deleted => "deleted",
            FileStatus::Renamed => "renamed",
            FileStatus::Copied => "copied",
            FileStatus::Rewritten => "rewritten",
        };
        write!(f, "{}", s)
    }
}

/// One changed file in the revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the repository root
    pub path: String,
    /// Change status
    #[serde(default)]
    pub status: FileStatus,
}

impl ChangedFile {
    /// Create a modified-file entry
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: FileStatus::Modified,
        }
    }

    /// Set the status
    pub fn with_status(mut self, status: FileStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether this entry is metadata rather than repository content
    pub fn is_metadata(&self) -> bool {
        self.path == COMMIT_MSG_PATH
    }
}

/// The change under review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeInfo {
    /// Numeric change id
    #[serde(rename = "_number")]
    pub number: u64,
    /// Change subject, when the host provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Project name, when the host provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl ChangeInfo {
    /// Create change metadata from its number
    pub fn new(number: u64) -> Self {
        Self {
            number,
            subject: None,
            project: None,
        }
    }
}

/// A prior conversation turn; carried for host compatibility, never read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// `user` or `model`
    pub role: String,
    /// Turn text
    pub text: String,
}

/// A user-triggered review action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Free-text instruction, possibly containing the `{{patch}}` placeholder
    pub prompt: String,
    /// The change under review
    pub change: ChangeInfo,
    /// Changed files in host order
    #[serde(default)]
    pub files: Vec<ChangedFile>,
    /// Model override; the provider default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Prior turns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ConversationTurn>,
}

impl ReviewRequest {
    /// Create a request for a change with no files yet
    pub fn new(prompt: impl Into<String>, change: ChangeInfo) -> Self {
        Self {
            prompt: prompt.into(),
            change,
            files: Vec::new(),
            model_name: None,
            history: Vec::new(),
        }
    }

    /// Set the changed files
    pub fn with_files(mut self, files: Vec<ChangedFile>) -> Self {
        self.files = files;
        self
    }

    /// Set the model override
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }

    /// Model for this request, falling back to `default`
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model_name
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(default)
    }
}

/// Per-file diff as returned by `GET .../files/{path}/diff`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Hunks in file order
    #[serde(default)]
    pub content: Vec<DiffHunk>,
}

/// One diff hunk
///
/// A hunk either has `ab` (lines common to both sides) or some of
/// `a` (old side) and `b` (new side).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    /// Lines present on both sides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ab: Option<Vec<String>>,
    /// Lines only on the old side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<Vec<String>>,
    /// Lines only on the new side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<Vec<String>>,
}

impl DiffHunk {
    /// Lines of the current revision, preferring new content over unchanged
    ///
    /// Returns `None` for pure deletions.
    pub fn current_lines(&self) -> Option<&[String]> {
        self.b.as_deref().or(self.ab.as_deref())
    }
}

impl FileDiff {
    /// Current-revision text of the file, one line per entry
    pub fn current_text(&self) -> String {
        self.content
            .iter()
            .filter_map(DiffHunk::current_lines)
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
