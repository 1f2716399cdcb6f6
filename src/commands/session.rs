// Current-note session - the single note open in the editor
// Edits are in memory only; saves go through the repository one at a time

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::AppResult;
use crate::models::note::DEFAULT_TAG;
use crate::models::{CurrentNote, FileDescription, TagNode};
use super::attachments::{replaceAttachmentPlaceholders, restoreAttachmentPlaceholders};
use super::note::NoteRepository;
use super::tags::{buildTagTree, filterNotes, primaryTagPath, tagsFromOtherNotes};

struct SessionState {
    currentNote: CurrentNote,
    selectedTags: Option<Vec<String>>,
    /// Bumped whenever the current note is replaced
    generation: u64,
}

pub struct NoteSession {
    repository: Arc<NoteRepository>,
    attachmentsFolderPath: Option<PathBuf>,
    state: Mutex<SessionState>,
    saveLock: tokio::sync::Mutex<()>,
}

impl NoteSession {
    pub fn new(repository: Arc<NoteRepository>) -> Self {
        Self {
            repository,
            attachmentsFolderPath: None,
            state: Mutex::new(SessionState {
                currentNote: CurrentNote::defaultNote(),
                selectedTags: None,
                generation: 0,
            }),
            saveLock: tokio::sync::Mutex::new(()),
        }
    }

    /// Absolute attachment links are turned back into placeholders on save
    pub fn withAttachmentsFolder(mut self, attachmentsFolderPath: impl Into<PathBuf>) -> Self {
        self.attachmentsFolderPath = Some(attachmentsFolderPath.into());
        self
    }

    pub fn repository(&self) -> &Arc<NoteRepository> {
        &self.repository
    }

    pub fn currentNote(&self) -> CurrentNote {
        self.state.lock().currentNote.clone()
    }

    pub fn selectedTags(&self) -> Option<Vec<String>> {
        self.state.lock().selectedTags.clone()
    }

    /// Markdown with attachment placeholders resolved, for the preview
    pub fn renderedMarkdown(&self) -> String {
        let markdown = self.state.lock().currentNote.markdown.clone();
        match &self.attachmentsFolderPath {
            Some(folder) => replaceAttachmentPlaceholders(&markdown, folder),
            None => markdown,
        }
    }

    /// Lists the notes folder and opens the first note that can be read
    pub async fn initialize(&self) -> AppResult<()> {
        let notes = self.repository.listNotes().await?;
        tracing::info!("[initialize] {} notes available", notes.len());
        for note in &notes {
            if self.openNote(note).await.is_ok() {
                break;
            }
        }
        Ok(())
    }

    /// Returns false when a later navigation superseded this one
    pub async fn openNote(&self, fileDescription: &FileDescription) -> AppResult<bool> {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.generation
        };

        let opened = self.repository.openNote(fileDescription).await.map_err(|e| {
            tracing::warn!("[openNote] {} could not be opened: {}", fileDescription.fileNameWithoutExtension, e);
            e
        })?;

        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!("[openNote] Discarding {}, navigation moved on", fileDescription.fileNameWithoutExtension);
            return Ok(false);
        }
        let selection = primaryTagPath(&opened.fileDescription.tags);
        state.selectedTags = (!selection.is_empty()).then_some(selection);
        state.currentNote = opened;
        tracing::debug!("[openNote] Opened {}", fileDescription.fileNameWithoutExtension);
        Ok(true)
    }

    pub fn createNewNote(&self) -> CurrentNote {
        let note = self.repository.createNew();
        let mut state = self.state.lock();
        state.generation += 1;
        state.currentNote = note.clone();
        state.selectedTags = Some(primaryTagPath(&note.fileDescription.tags)).filter(|path| !path.is_empty());
        tracing::debug!("[createNewNote] Started a new note");
        note
    }

    pub fn updateMarkdown(&self, markdown: &str) {
        self.state.lock().currentNote.markdown = markdown.to_string();
    }

    /// Blank entries are dropped; a note always keeps at least one tag
    pub fn updateTags(&self, tags: Vec<String>) {
        let tags: Vec<String> = tags.into_iter().filter(|tag| !tag.trim().is_empty()).collect();
        let tags = if tags.is_empty() { vec![DEFAULT_TAG.to_string()] } else { tags };
        self.state.lock().currentNote.fileDescription.tags = tags;
    }

    pub fn selectTags(&self, path: Vec<String>) {
        self.state.lock().selectedTags = Some(path);
    }

    pub fn clearSelectedTags(&self) {
        self.state.lock().selectedTags = None;
    }

    /// Persists the current note; on failure the in-memory edits stay as they are
    pub async fn save(&self) -> AppResult<CurrentNote> {
        let _guard = self.saveLock.lock().await;
        let (snapshot, generation) = {
            let state = self.state.lock();
            (state.currentNote.clone(), state.generation)
        };

        let mut toSave = snapshot.clone();
        if let Some(folder) = &self.attachmentsFolderPath {
            toSave.markdown = restoreAttachmentPlaceholders(&toSave.markdown, folder);
        }

        let saved = self.repository.saveNote(&toSave).await.map_err(|e| {
            tracing::error!("[save] {} was not saved: {}", snapshot.fileName(), e);
            e
        })?;
        self.applySaveResult(generation, &snapshot, &saved);
        Ok(saved)
    }

    /// Only the file description is taken from the save; text typed meanwhile is kept
    fn applySaveResult(&self, generation: u64, snapshot: &CurrentNote, saved: &CurrentNote) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!("[save] Result for {} is stale, not applied", saved.fileName());
            return false;
        }
        let pendingTags = (state.currentNote.fileDescription.tags != snapshot.fileDescription.tags)
            .then(|| state.currentNote.fileDescription.tags.clone());
        state.currentNote.fileDescription = saved.fileDescription.clone();
        if let Some(tags) = pendingTags {
            state.currentNote.fileDescription.tags = tags;
        }
        true
    }

    /// Deletes the open note and replaces it with a fresh unsaved one
    pub async fn deleteCurrentNote(&self) -> AppResult<()> {
        let _guard = self.saveLock.lock().await;
        let (note, generation) = {
            let state = self.state.lock();
            (state.currentNote.clone(), state.generation)
        };

        if note.fileDescription.fileExists {
            self.repository.deleteNote(note.fileName()).await?;
        }

        let mut state = self.state.lock();
        if state.generation == generation {
            state.generation += 1;
            state.currentNote = self.repository.createNew();
        }
        Ok(())
    }

    /// Repository listing narrowed by the selected tag path
    pub fn visibleNotes(&self) -> Vec<FileDescription> {
        let selectedTags = self.selectedTags();
        filterNotes(&self.repository.allAvailableNotes(), selectedTags.as_deref())
    }

    pub fn tagTree(&self) -> Vec<TagNode> {
        buildTagTree(&self.repository.allAvailableNotes())
    }

    pub fn tagSuggestions(&self) -> Vec<String> {
        let current = self.state.lock().currentNote.fileDescription.fileNameWithoutExtension.clone();
        tagsFromOtherNotes(&self.repository.allAvailableNotes(), &current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStore;
    use tempfile::tempdir;

    fn newSession(dir: &std::path::Path) -> NoteSession {
        NoteSession::new(Arc::new(NoteRepository::new(FileStore::new(dir))))
    }

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn empty_folder_keeps_default_note() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        session.initialize().await.unwrap();

        let current = session.currentNote();
        assert!(!current.fileDescription.fileExists);
        assert_eq!(current.markdown, "# Untitled");
        assert!(std::fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn initialize_opens_first_note_and_seeds_selection() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        session.updateMarkdown("# Alpha\ntext");
        session.updateTags(tags(&["work/projects", "home"]));
        session.save().await.unwrap();

        let reopened = newSession(tmp.path());
        reopened.initialize().await.unwrap();
        assert_eq!(reopened.currentNote().markdown, "# Alpha\ntext");
        assert_eq!(reopened.selectedTags(), Some(tags(&["work", "projects"])));
    }

    #[tokio::test]
    async fn empty_tags_become_untagged() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        session.updateTags(Vec::new());
        assert_eq!(session.currentNote().fileDescription.tags, tags(&["Untagged"]));
    }

    #[tokio::test]
    async fn blank_tags_never_leave_a_note_untagged_on_disk() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        session.updateMarkdown("# Blank tags");
        session.updateTags(tags(&["", "  "]));
        assert_eq!(session.currentNote().fileDescription.tags, tags(&["Untagged"]));

        session.save().await.unwrap();
        let listed = session.repository().listNotes().await.unwrap();
        assert_eq!(listed[0].tags, tags(&["Untagged"]));
    }

    #[tokio::test]
    async fn blank_entries_are_dropped_from_mixed_tags() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        session.updateTags(tags(&["", "work", " "]));
        assert_eq!(session.currentNote().fileDescription.tags, tags(&["work"]));
    }

    #[tokio::test]
    async fn new_note_selects_its_primary_tag() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        session.selectTags(tags(&["work"]));
        session.createNewNote();
        assert_eq!(session.selectedTags(), Some(tags(&["Untagged"])));
    }

    #[tokio::test]
    async fn suggestions_come_from_other_notes() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        for (markdown, noteTags) in [("# Other", ["home"]), ("# Mine", ["private"])] {
            session.createNewNote();
            session.updateMarkdown(markdown);
            session.updateTags(tags(&noteTags));
            session.save().await.unwrap();
        }
        assert_eq!(session.tagSuggestions(), tags(&["home"]));
    }

    #[tokio::test]
    async fn concurrent_saves_write_one_file() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());

        let (first, second) = tokio::join!(session.save(), session.save());
        assert_eq!(first.unwrap().fileName(), "Untitled");
        assert_eq!(second.unwrap().fileName(), "Untitled");
        assert_eq!(session.repository().store().listFiles().await.unwrap(), vec!["Untitled"]);
    }

    #[tokio::test]
    async fn stale_save_result_is_discarded() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        let snapshot = session.currentNote();
        let generation = session.state.lock().generation;

        let mut saved = snapshot.clone();
        saved.fileDescription.fileExists = true;
        saved.fileDescription.fileNameWithoutExtension = "Old".to_string();

        session.createNewNote();
        assert!(!session.applySaveResult(generation, &snapshot, &saved));
        assert!(!session.currentNote().fileDescription.fileExists);
    }

    #[tokio::test]
    async fn edits_made_during_save_are_kept() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        let snapshot = session.currentNote();
        let generation = session.state.lock().generation;

        let mut saved = snapshot.clone();
        saved.fileDescription.fileExists = true;
        session.updateMarkdown("# Untitled\nstill typing");
        session.updateTags(tags(&["fresh"]));

        assert!(session.applySaveResult(generation, &snapshot, &saved));
        let current = session.currentNote();
        assert!(current.fileDescription.fileExists);
        assert_eq!(current.markdown, "# Untitled\nstill typing");
        assert_eq!(current.fileDescription.tags, tags(&["fresh"]));
    }

    #[tokio::test]
    async fn last_navigation_wins() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        let repository = session.repository().clone();
        let mut first = CurrentNote::defaultNote();
        first.markdown = "# First".to_string();
        let first = repository.saveNew(&first).await.unwrap();
        let mut second = CurrentNote::defaultNote();
        second.markdown = "# Second".to_string();
        let second = repository.saveNew(&second).await.unwrap();

        let (_, latest) = tokio::join!(
            session.openNote(&first.fileDescription),
            session.openNote(&second.fileDescription)
        );
        assert!(latest.unwrap());
        assert_eq!(session.currentNote().markdown, "# Second");
    }

    #[tokio::test]
    async fn failed_open_leaves_current_note() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        session.updateMarkdown("# Keep me");
        let mut missing = CurrentNote::defaultNote().fileDescription;
        missing.fileNameWithoutExtension = "missing".to_string();

        assert!(session.openNote(&missing).await.unwrap_err().isNotFound());
        assert_eq!(session.currentNote().markdown, "# Keep me");
    }

    #[tokio::test]
    async fn failed_save_keeps_edits() {
        let tmp = tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let session = newSession(&blocker.join("notes"));
        session.updateMarkdown("# Precious");

        assert!(session.save().await.is_err());
        let current = session.currentNote();
        assert_eq!(current.markdown, "# Precious");
        assert!(!current.fileDescription.fileExists);
    }

    #[tokio::test]
    async fn delete_replaces_current_note() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        session.updateMarkdown("# Doomed");
        session.save().await.unwrap();
        assert!(tmp.path().join("Doomed.md").exists());

        session.deleteCurrentNote().await.unwrap();
        assert!(!tmp.path().join("Doomed.md").exists());
        assert!(!session.currentNote().fileDescription.fileExists);
        assert!(session.repository().allAvailableNotes().is_empty());
    }

    #[tokio::test]
    async fn visible_notes_follow_selection() {
        let tmp = tempdir().unwrap();
        let session = newSession(tmp.path());
        for (markdown, noteTags) in [("# One", ["work/a"]), ("# Two", ["home"])] {
            session.createNewNote();
            session.updateMarkdown(markdown);
            session.updateTags(tags(&noteTags));
            session.save().await.unwrap();
        }

        session.selectTags(tags(&["work"]));
        let visible = session.visibleNotes();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].fileNameWithoutExtension, "One");

        session.clearSelectedTags();
        assert_eq!(session.visibleNotes().len(), 2);
        assert_eq!(session.tagTree().len(), 2);
    }

    #[tokio::test]
    async fn save_restores_attachment_placeholders() {
        let tmp = tempdir().unwrap();
        let attachments = tmp.path().join("attachments");
        let session = newSession(&tmp.path().join("notes")).withAttachmentsFolder(&attachments);
        session.updateMarkdown(&format!("# Pics\n![]({}/1-a.png)", attachments.display()));

        session.save().await.unwrap();
        let raw = std::fs::read_to_string(tmp.path().join("notes").join("Pics.md")).unwrap();
        assert!(raw.ends_with("![](@attachments/1-a.png)"));
    }
}
