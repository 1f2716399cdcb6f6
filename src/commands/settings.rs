// Settings commands - user preferences stored as YAML front-matter in config.md

use std::path::Path;

use tokio::fs;

use crate::errors::AppResult;
use crate::models::Settings;
use crate::storage::{parseFrontmatter, toMarkdown};

const SETTINGS_BODY: &str = "# Noetter settings";

/// Missing or unreadable config falls back to defaults
pub async fn loadSettingsFrom(path: &Path) -> Settings {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("[loadSettingsFrom] No config at {:?} ({}), using defaults", path, e);
            return Settings::default();
        }
    };

    match parseFrontmatter::<Settings>(&content) {
        Some((settings, _)) => {
            tracing::debug!(
                "[loadSettingsFrom] rootFolder: {:?}, editMode: {}, editorFontSize: {}",
                settings.rootFolder,
                settings.editMode,
                settings.editorFontSize
            );
            settings
        }
        None => {
            tracing::warn!("[loadSettingsFrom] Invalid config at {:?}, using defaults", path);
            Settings::default()
        }
    }
}

pub async fn saveSettingsTo(path: &Path, settings: &Settings) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, toMarkdown(settings, SETTINGS_BODY)?).await?;
    tracing::info!("[saveSettingsTo] Saved to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_config_gives_defaults() {
        let tmp = tempdir().unwrap();
        let settings = loadSettingsFrom(&tmp.path().join("config.md")).await;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.editorFontSize, 14);
    }

    #[tokio::test]
    async fn saved_settings_load_back() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.md");
        let settings = Settings {
            rootFolder: Some("/srv/notes".to_string()),
            editMode: true,
            editorFontSize: 22,
        };

        saveSettingsTo(&path, &settings).await.unwrap();
        assert_eq!(loadSettingsFrom(&path).await, settings);
    }

    #[tokio::test]
    async fn partial_config_fills_defaults() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.md");
        std::fs::write(&path, "---\neditMode: true\n---\n").unwrap();

        let settings = loadSettingsFrom(&path).await;
        assert!(settings.editMode);
        assert_eq!(settings.editorFontSize, 14);
        assert_eq!(settings.rootFolder, None);
    }

    #[tokio::test]
    async fn invalid_config_gives_defaults() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.md");
        std::fs::write(&path, "---\neditorFontSize: [not, a, number]\n---\n").unwrap();
        assert_eq!(loadSettingsFrom(&path).await, Settings::default());
    }
}
