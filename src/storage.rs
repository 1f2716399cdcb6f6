// Filesystem-based storage layer for Noetter
// Notes are Markdown files with a fixed front-matter block inside <root>/notes/

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use crate::errors::{AppError, AppResult};
use crate::models::Settings;
use crate::models::note::{getFileNameWithExtension, getFileNameWithoutExtension};

// ============================================
// PATH HELPERS
// ============================================

const ROOT_FOLDER_NAME: &str = ".noetter";
const ROOT_ENV_VAR: &str = "NOETTER_HOME";
const CONFIG_ENV_VAR: &str = "NOETTER_CONFIG_DIR";

fn homeDir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        AppError::Config(format!("home directory not found; set {} explicitly", ROOT_ENV_VAR))
    })
}

/// Global config directory (~/.noetter/ unless overridden)
pub fn globalConfigDir() -> AppResult<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(dir));
    }
    Ok(homeDir()?.join(ROOT_FOLDER_NAME))
}

/// Global config file path
pub fn globalConfigPath() -> AppResult<PathBuf> {
    Ok(globalConfigDir()?.join("config.md"))
}

/// Folder layout of a note collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub rootFolderPath: PathBuf,
    pub notesFolderPath: PathBuf,
    pub attachmentsFolderPath: PathBuf,
}

impl Paths {
    pub fn fromRoot(root: impl Into<PathBuf>) -> Self {
        let rootFolderPath = root.into();
        Self {
            notesFolderPath: rootFolderPath.join("notes"),
            attachmentsFolderPath: rootFolderPath.join("attachments"),
            rootFolderPath,
        }
    }

    /// Environment override first, then settings, then ~/.noetter
    pub fn resolve(settings: &Settings) -> AppResult<Self> {
        if let Ok(dir) = std::env::var(ROOT_ENV_VAR) {
            return Ok(Self::fromRoot(dir));
        }
        if let Some(root) = settings.rootFolder.as_ref().filter(|r| !r.is_empty()) {
            return Ok(Self::fromRoot(root));
        }
        Ok(Self::fromRoot(homeDir()?.join(ROOT_FOLDER_NAME)))
    }
}

/// Create root, notes and attachments folders when missing
pub async fn initDirectories(paths: &Paths) -> AppResult<()> {
    for dir in [&paths.rootFolderPath, &paths.notesFolderPath, &paths.attachmentsFolderPath] {
        fs::create_dir_all(dir).await.map_err(|e| {
            tracing::error!("[initDirectories] Failed to create {:?}: {}", dir, e);
            AppError::Io(format!("failed to create {}: {}", dir.display(), e))
        })?;
    }
    tracing::debug!("[initDirectories] Ready at {:?}", paths.rootFolderPath);
    Ok(())
}

// ============================================
// FRONTMATTER PARSING (config files)
// ============================================

/// Parse YAML frontmatter from markdown content
pub fn parseFrontmatter<T: serde::de::DeserializeOwned>(content: &str) -> Option<(T, String)> {
    let content = content.trim();
    if !content.starts_with("---") {
        return None;
    }

    let rest = &content[3..];
    let end = rest.find("\n---")?;
    let yaml = rest[..end].trim();
    let body = rest[end + 4..].trim().to_string();

    let frontmatter: T = serde_yaml::from_str(yaml).ok()?;
    Some((frontmatter, body))
}

/// Serialize frontmatter + body to markdown
pub fn toMarkdown<T: serde::Serialize>(frontmatter: &T, body: &str) -> AppResult<String> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("---\n{}---\n\n{}", yaml, body))
}

// ============================================
// FILE STORE
// ============================================

/// Reads and writes note files inside a single notes folder
#[derive(Debug, Clone)]
pub struct FileStore {
    notesFolderPath: PathBuf,
}

impl FileStore {
    pub fn new(notesFolderPath: impl Into<PathBuf>) -> Self {
        Self {
            notesFolderPath: notesFolderPath.into(),
        }
    }

    pub fn notesFolderPath(&self) -> &Path {
        &self.notesFolderPath
    }

    pub fn notePath(&self, fileNameWithoutExtension: &str) -> PathBuf {
        self.notesFolderPath.join(getFileNameWithExtension(fileNameWithoutExtension))
    }

    /// Whole raw file, front-matter included
    pub async fn readFile(&self, fileNameWithoutExtension: &str) -> AppResult<String> {
        let path = self.notePath(fileNameWithoutExtension);
        fs::read_to_string(&path).await.map_err(|e| {
            tracing::warn!("[readFile] Failed to read {:?}: {}", path, e);
            AppError::from(e)
        })
    }

    /// Stems of every visible `.md` file; creates the notes folder on first use
    pub async fn listFiles(&self) -> AppResult<Vec<String>> {
        let listError = |e: std::io::Error| AppError::DirectoryList(format!("{}: {}", self.notesFolderPath.display(), e));

        fs::create_dir_all(&self.notesFolderPath).await.map_err(listError)?;
        let mut entries = fs::read_dir(&self.notesFolderPath).await.map_err(listError)?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(listError)? {
            let fileName = entry.file_name().to_string_lossy().to_string();
            if fileName.starts_with('.') || !fileName.ends_with(".md") {
                continue;
            }
            let isFile = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if isFile {
                names.push(getFileNameWithoutExtension(&fileName));
            }
        }

        names.sort();
        Ok(names)
    }

    /// Creates or overwrites
    pub async fn writeFile(&self, fileNameWithoutExtension: &str, rawText: &str) -> AppResult<()> {
        let path = self.notePath(fileNameWithoutExtension);
        fs::write(&path, rawText).await.map_err(|e| {
            tracing::error!("[writeFile] Failed to write {:?}: {}", path, e);
            AppError::Write(format!("{}: {}", path.display(), e))
        })
    }

    /// Returns false without touching the disk when the old file is missing
    pub async fn renameFile(&self, oldName: &str, newName: &str) -> AppResult<bool> {
        let oldPath = self.notePath(oldName);
        if !self.fileExists(oldName).await {
            tracing::debug!("[renameFile] {:?} does not exist, skipping", oldPath);
            return Ok(false);
        }
        let newPath = self.notePath(newName);
        fs::rename(&oldPath, &newPath).await.map_err(|e| {
            tracing::error!("[renameFile] {:?} -> {:?} failed: {}", oldPath, newPath, e);
            AppError::Write(format!("{} -> {}: {}", oldPath.display(), newPath.display(), e))
        })?;
        Ok(true)
    }

    pub async fn deleteFile(&self, fileNameWithoutExtension: &str) -> AppResult<()> {
        let path = self.notePath(fileNameWithoutExtension);
        fs::remove_file(&path).await.map_err(AppError::from)
    }

    pub async fn fileExists(&self, fileNameWithoutExtension: &str) -> bool {
        fs::try_exists(self.notePath(fileNameWithoutExtension)).await.unwrap_or(false)
    }

    /// Opens the file for a bounded, line-by-line read
    pub async fn readFirstNLines(&self, fileNameWithoutExtension: &str, n: usize) -> AppResult<FirstLines> {
        let file = File::open(self.notePath(fileNameWithoutExtension)).await?;
        Ok(FirstLines {
            lines: Some(BufReader::new(file).lines()),
            remaining: n,
        })
    }

    /// First of `wanted`, `wanted (1)`, `wanted (2)`, ... not present on disk
    pub async fn getFreeFileName(&self, wanted: &str) -> AppResult<String> {
        let taken: HashSet<String> = self.listFiles().await?.into_iter().collect();
        Ok(firstFreeName(wanted, &taken))
    }
}

pub(crate) fn firstFreeName(wanted: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(wanted) {
        return wanted.to_string();
    }
    let mut attempt = 1u32;
    loop {
        let candidate = format!("{} ({})", wanted, attempt);
        if !taken.contains(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

/// Lazy line source over the head of a file
///
/// Yields at most `n` lines. The underlying file handle is dropped as soon as
/// the limit or the end of file is reached; reading again requires reopening.
pub struct FirstLines {
    lines: Option<Lines<BufReader<File>>>,
    remaining: usize,
}

impl FirstLines {
    pub async fn nextLine(&mut self) -> AppResult<Option<String>> {
        if self.remaining == 0 {
            self.lines = None;
        }
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };

        match lines.next_line().await? {
            Some(line) => {
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.lines = None;
                }
                Ok(Some(line))
            }
            None => {
                self.lines = None;
                Ok(None)
            }
        }
    }

    pub fn isClosed(&self) -> bool {
        self.lines.is_none()
    }

    pub async fn collectLines(mut self) -> AppResult<Vec<String>> {
        let mut collected = Vec::new();
        while let Some(line) = self.nextLine().await? {
            collected.push(line);
        }
        Ok(collected)
    }
}
