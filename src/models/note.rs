// Note model for filesystem-based storage
// The file name stem is the stable key, metadata lives in the front-matter

use serde::{Deserialize, Serialize};

use crate::commands::common::now;

pub const DEFAULT_FILE_NAME_WITHOUT_EXTENSION: &str = "Untitled";
pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_TAG: &str = "Untagged";
pub const DEFAULT_MARKDOWN: &str = "# Untitled";

/// Persisted-note metadata, one per `.md` file on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescription {
    pub fileNameWithoutExtension: String,
    pub title: String,
    /// First tag is the primary tag used to seed the tag selection
    pub tags: Vec<String>,
    /// Epoch milliseconds, `None` when missing or unparseable on disk
    pub created: Option<i64>,
    pub modified: Option<i64>,
    pub fileExists: bool,
}

impl FileDescription {
    pub fn fileNameWithExtension(&self) -> String {
        getFileNameWithExtension(&self.fileNameWithoutExtension)
    }
}

/// Metadata as recovered from a possibly truncated front-matter block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialFileDescription {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created: Option<i64>,
    pub modified: Option<i64>,
}

impl PartialFileDescription {
    /// Missing fields fall back to empty values, the file is known to exist
    pub fn intoFileDescription(self, fileNameWithoutExtension: &str) -> FileDescription {
        FileDescription {
            fileNameWithoutExtension: fileNameWithoutExtension.to_string(),
            title: self.title.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            created: self.created,
            modified: self.modified,
            fileExists: true,
        }
    }
}

/// The single note being viewed or edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentNote {
    /// Body content without the front-matter
    pub markdown: String,
    pub fileDescription: FileDescription,
}

impl CurrentNote {
    /// Unsaved template used for new notes and as the initial session note
    pub fn defaultNote() -> Self {
        let timestamp = now();
        Self {
            markdown: DEFAULT_MARKDOWN.to_string(),
            fileDescription: FileDescription {
                fileNameWithoutExtension: DEFAULT_FILE_NAME_WITHOUT_EXTENSION.to_string(),
                title: DEFAULT_TITLE.to_string(),
                tags: vec![DEFAULT_TAG.to_string()],
                created: Some(timestamp),
                modified: Some(timestamp),
                fileExists: false,
            },
        }
    }

    pub fn fileName(&self) -> &str {
        &self.fileDescription.fileNameWithoutExtension
    }
}

pub fn getFileNameWithExtension(fileNameWithoutExtension: &str) -> String {
    format!("{}.md", fileNameWithoutExtension)
}

pub fn getFileNameWithoutExtension(fileName: &str) -> String {
    fileName.strip_suffix(".md").unwrap_or(fileName).to_string()
}
