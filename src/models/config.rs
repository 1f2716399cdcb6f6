// Configuration models for Noetter
// Stored as YAML front-matter in the global config.md

use serde::{Deserialize, Serialize};

use super::common::DEFAULT_FONT_SIZE;

/// Persisted application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Root folder holding `notes/` and `attachments/`, `~/.noetter` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rootFolder: Option<String>,
    #[serde(default)]
    pub editMode: bool,
    #[serde(default = "defaultFontSize")]
    pub editorFontSize: u32,
}

fn defaultFontSize() -> u32 {
    DEFAULT_FONT_SIZE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rootFolder: None,
            editMode: false,
            editorFontSize: DEFAULT_FONT_SIZE,
        }
    }
}
