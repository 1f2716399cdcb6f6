// Note repository - loads, lists, saves and deletes notes on disk
// Owns the cached file list that the rest of the application reads from

use futures::future::join_all;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::errors::{AppError, AppResult};
use crate::metadata::{self, METADATA_LINES_TO_READ};
use crate::models::{CurrentNote, FileDescription};
use crate::storage::FileStore;
use super::common::now;

const REFRESH_FILE_LIST_ERROR: &str = "Could not get file list.";

pub struct NoteRepository {
    store: FileStore,
    /// `None` until the first successful listing
    fileList: RwLock<Option<Vec<FileDescription>>>,
    refreshFileListError: RwLock<Option<String>>,
    /// Serializes name probing and writes so two saves never pick the same name
    writeLock: Mutex<()>,
}

impl NoteRepository {
    pub fn new(store: FileStore) -> Self {
        Self {
            store,
            fileList: RwLock::new(None),
            refreshFileListError: RwLock::new(None),
            writeLock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Last known good listing, empty before the first load
    pub fn allAvailableNotes(&self) -> Vec<FileDescription> {
        self.fileList.read().clone().unwrap_or_default()
    }

    pub fn hasLoadedFileList(&self) -> bool {
        self.fileList.read().is_some()
    }

    pub fn refreshFileListError(&self) -> Option<String> {
        self.refreshFileListError.read().clone()
    }

    /// Re-reads the directory; on failure the previous listing is kept
    pub async fn listNotes(&self) -> AppResult<Vec<FileDescription>> {
        *self.refreshFileListError.write() = None;

        match self.readFileDescriptions().await {
            Ok(fileDescriptions) => {
                tracing::debug!("[listNotes] Found {} notes", fileDescriptions.len());
                *self.fileList.write() = Some(fileDescriptions.clone());
                Ok(fileDescriptions)
            }
            Err(e) => {
                tracing::warn!("[listNotes] Keeping previous file list: {}", e);
                *self.refreshFileListError.write() = Some(REFRESH_FILE_LIST_ERROR.to_string());
                Err(match e {
                    AppError::DirectoryList(message) => AppError::DirectoryList(message),
                    other => AppError::DirectoryList(other.to_string()),
                })
            }
        }
    }

    /// Only a failing directory read fails the listing; a file that cannot be opened is skipped
    async fn readFileDescriptions(&self) -> AppResult<Vec<FileDescription>> {
        let fileNames = self.store.listFiles().await?;
        let results = join_all(fileNames.iter().map(|name| self.readFileMetadata(name))).await;

        Ok(fileNames
            .iter()
            .zip(results)
            .filter_map(|(name, result)| match result {
                Ok(fileDescription) => Some(fileDescription),
                Err(e) => {
                    tracing::warn!("[listNotes] Skipping {}: {}", name, e);
                    None
                }
            })
            .collect())
    }

    /// Metadata from the head of the file only; undecodable content counts as missing metadata
    pub async fn readFileMetadata(&self, fileNameWithoutExtension: &str) -> AppResult<FileDescription> {
        let lines = self
            .store
            .readFirstNLines(fileNameWithoutExtension, METADATA_LINES_TO_READ)
            .await?
            .collectLines()
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("[readFileMetadata] Unreadable metadata in {}: {}", fileNameWithoutExtension, e);
                Vec::new()
            });
        Ok(metadata::deserializeMetadata(lines).intoFileDescription(fileNameWithoutExtension))
    }

    /// Loads the body of a listed note; the file list is left untouched
    pub async fn openNote(&self, fileDescription: &FileDescription) -> AppResult<CurrentNote> {
        let rawFileContents = self.store.readFile(&fileDescription.fileNameWithoutExtension).await?;
        Ok(CurrentNote {
            markdown: metadata::extractMarkdownBody(&rawFileContents),
            fileDescription: fileDescription.clone(),
        })
    }

    /// Unsaved template, nothing is written until the first save
    pub fn createNew(&self) -> CurrentNote {
        CurrentNote::defaultNote()
    }

    pub async fn saveNote(&self, note: &CurrentNote) -> AppResult<CurrentNote> {
        if note.fileDescription.fileExists {
            self.saveExisting(note).await
        } else {
            self.saveNew(note).await
        }
    }

    pub async fn saveNew(&self, note: &CurrentNote) -> AppResult<CurrentNote> {
        let mut updatedNote = updateCurrentNoteMetadata(note);
        {
            let _guard = self.writeLock.lock().await;
            let freeFileName = self
                .store
                .getFreeFileName(&updatedNote.fileDescription.fileNameWithoutExtension)
                .await?;
            updatedNote.fileDescription.fileNameWithoutExtension = freeFileName;
            updatedNote.fileDescription.fileExists = true;

            self.store
                .writeFile(
                    &updatedNote.fileDescription.fileNameWithoutExtension,
                    &metadata::serialize(&updatedNote.fileDescription, &updatedNote.markdown),
                )
                .await?;
        }
        tracing::info!("[saveNew] Saved {}", updatedNote.fileDescription.fileNameWithExtension());

        if let Err(e) = self.listNotes().await {
            tracing::warn!("[saveNew] Saved, but the file list could not be refreshed: {}", e);
        }
        Ok(updatedNote)
    }

    pub async fn saveExisting(&self, note: &CurrentNote) -> AppResult<CurrentNote> {
        let previousFileName = note.fileDescription.fileNameWithoutExtension.clone();
        let mut updatedNote = updateCurrentNoteMetadata(note);
        let derivedFileName = updatedNote.fileDescription.fileNameWithoutExtension.clone();

        {
            let _guard = self.writeLock.lock().await;
            let mut renamedFrom = None;
            let fileName = if isSameBaseName(&previousFileName, &derivedFileName) {
                previousFileName.clone()
            } else {
                let freeFileName = self.store.getFreeFileName(&derivedFileName).await?;
                if self.store.renameFile(&previousFileName, &freeFileName).await? {
                    tracing::info!("[saveExisting] Renamed {} -> {}", previousFileName, freeFileName);
                    renamedFrom = Some(previousFileName.clone());
                }
                freeFileName
            };
            updatedNote.fileDescription.fileNameWithoutExtension = fileName.clone();
            updatedNote.fileDescription.fileExists = true;

            let written = self
                .store
                .writeFile(&fileName, &metadata::serialize(&updatedNote.fileDescription, &updatedNote.markdown))
                .await;
            if let Err(e) = written {
                if let Some(original) = renamedFrom {
                    if let Err(undo) = self.store.renameFile(&fileName, &original).await {
                        tracing::error!("[saveExisting] Could not restore {}: {}", original, undo);
                    }
                }
                return Err(e);
            }
        }

        // Patch in place instead of a full refresh to keep the list stable
        if let Some(fileList) = self.fileList.write().as_mut() {
            for file in fileList.iter_mut() {
                if file.fileNameWithoutExtension == previousFileName {
                    *file = updatedNote.fileDescription.clone();
                }
            }
        }

        tracing::info!("[saveExisting] Saved {}", updatedNote.fileDescription.fileNameWithExtension());
        Ok(updatedNote)
    }

    /// Removes the file and its listing entry; the caller replaces the open note
    pub async fn deleteNote(&self, fileNameWithoutExtension: &str) -> AppResult<()> {
        {
            let _guard = self.writeLock.lock().await;
            self.store.deleteFile(fileNameWithoutExtension).await?;
        }
        if let Some(fileList) = self.fileList.write().as_mut() {
            fileList.retain(|f| f.fileNameWithoutExtension != fileNameWithoutExtension);
        }
        tracing::info!("[deleteNote] Deleted {}", fileNameWithoutExtension);
        Ok(())
    }
}

/// Re-derives title and file name from the markdown and stamps the save time
pub fn updateCurrentNoteMetadata(note: &CurrentNote) -> CurrentNote {
    let timestamp = now();
    let mut updated = note.clone();
    updated.fileDescription.title = metadata::extractTitle(&note.markdown);
    updated.fileDescription.fileNameWithoutExtension = metadata::extractFileName(&note.markdown);
    updated.fileDescription.created = note.fileDescription.created.or(Some(timestamp));
    updated.fileDescription.modified = Some(timestamp);
    updated
}

/// `Todo (2)` still belongs to a note whose heading derives `Todo`
fn isSameBaseName(storedFileName: &str, derivedFileName: &str) -> bool {
    if storedFileName == derivedFileName {
        return true;
    }
    storedFileName
        .strip_prefix(derivedFileName)
        .and_then(|rest| rest.strip_prefix(" ("))
        .and_then(|rest| rest.strip_suffix(')'))
        .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}
