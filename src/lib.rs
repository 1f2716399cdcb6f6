// Allow non-snake_case names for JSON serialization compatibility with the front-end
#![allow(non_snake_case)]

pub mod commands;
pub mod errors;
pub mod events;
pub mod metadata;
pub mod models;
pub mod storage;

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{Mutex, mpsc};

use commands::attachments::{ClipboardImage, saveImageAttachment};
use commands::editor::{CursorPosition, InsertType, insertOrReplaceAtPosition};
use commands::note::NoteRepository;
use commands::session::NoteSession;
use commands::settings::{loadSettingsFrom, saveSettingsTo};
use errors::{AppError, AppResult};
use events::{EventBus, KeyCombination, ListenerHandle, Trigger};
use models::{CurrentNote, FileDescription, Settings, TagNode, ViewState};
use storage::{FileStore, Paths};

const CHECKBOX_PREFIX: &str = " - [ ] ";

/// Async work requested by synchronous bus listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    SaveCurrentNote,
    CreateNewNote,
    PersistSettings,
}

/// Everything the front-end renders, in one serializable value
#[derive(Debug, Clone, Serialize)]
pub struct AppSnapshot {
    pub currentNote: CurrentNote,
    pub viewState: ViewState,
    pub selectedTags: Option<Vec<String>>,
    pub visibleNotes: Vec<FileDescription>,
    pub tagTree: Vec<TagNode>,
    /// Tags used by other notes, offered by the tag editor
    pub tagSuggestions: Vec<String>,
    pub refreshFileListError: Option<String>,
}

pub struct App {
    paths: Paths,
    /// Where view preferences are written back; `None` keeps them in memory
    settingsPath: Option<PathBuf>,
    settings: RwLock<Settings>,
    viewState: Arc<RwLock<ViewState>>,
    cursor: Arc<RwLock<CursorPosition>>,
    bus: Arc<EventBus>,
    session: Arc<NoteSession>,
    commandReceiver: Mutex<mpsc::UnboundedReceiver<AppCommand>>,
    listeners: Vec<ListenerHandle>,
}

impl App {
    /// Prepares the folders, wires the bus and opens the first note
    pub async fn initialize(paths: Paths, settings: Settings, settingsPath: Option<PathBuf>) -> AppResult<Self> {
        tracing::info!("[App::initialize] Root folder {:?}", paths.rootFolderPath);
        storage::initDirectories(&paths).await?;

        let repository = Arc::new(NoteRepository::new(FileStore::new(&paths.notesFolderPath)));
        let session = Arc::new(NoteSession::new(repository).withAttachmentsFolder(&paths.attachmentsFolderPath));
        let viewState = Arc::new(RwLock::new(ViewState {
            zenMode: false,
            editMode: settings.editMode,
            editorFontSize: settings.editorFontSize,
        }));
        let cursor = Arc::new(RwLock::new(CursorPosition::caret(0)));
        let bus = Arc::new(EventBus::new());
        let (commandSender, commandReceiver) = mpsc::unbounded_channel();

        let listeners = registerTriggerListeners(&bus, &session, &viewState, &cursor, commandSender);

        if let Err(e) = session.initialize().await {
            tracing::warn!("[App::initialize] Starting without a note list: {}", e);
        }

        Ok(Self {
            paths,
            settingsPath,
            settings: RwLock::new(settings),
            viewState,
            cursor,
            bus,
            session,
            commandReceiver: Mutex::new(commandReceiver),
            listeners,
        })
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn session(&self) -> &Arc<NoteSession> {
        &self.session
    }

    pub fn viewState(&self) -> ViewState {
        *self.viewState.read()
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn setCursor(&self, cursor: CursorPosition) {
        *self.cursor.write() = cursor;
    }

    pub fn cursor(&self) -> CursorPosition {
        *self.cursor.read()
    }

    /// Queues the chord's trigger and runs its listeners; async work waits for `processCommands`
    pub fn handleKeyDown(&self, combination: &KeyCombination) -> bool {
        let handled = self.bus.handleKeyDown(combination);
        if handled {
            self.bus.drain();
        }
        handled
    }

    /// Runs queued async commands; every command runs even when an earlier one fails
    pub async fn processCommands(&self) -> AppResult<usize> {
        let mut receiver = self.commandReceiver.lock().await;
        let mut processed = 0;
        let mut firstError = None;

        while let Ok(command) = receiver.try_recv() {
            tracing::debug!("[processCommands] {:?}", command);
            let result = match command {
                AppCommand::SaveCurrentNote => self.session.save().await.map(|_| ()),
                AppCommand::CreateNewNote => {
                    self.session.createNewNote();
                    Ok(())
                }
                AppCommand::PersistSettings => self.persistSettings().await,
            };
            if let Err(e) = result {
                tracing::error!("[processCommands] {:?} failed: {}", command, e);
                firstError.get_or_insert(e);
            }
            processed += 1;
        }

        match firstError {
            Some(e) => Err(e),
            None => Ok(processed),
        }
    }

    /// Stores the pasted image and puts its link where the cursor is
    pub async fn pasteImage(&self, image: &ClipboardImage) -> AppResult<()> {
        let link = saveImageAttachment(&self.paths, image).await?;
        let cursor = self.cursor();
        let markdown = self.session.currentNote().markdown;
        self.session
            .updateMarkdown(&insertOrReplaceAtPosition(&markdown, &cursor, &link, InsertType::ReplaceSelection));
        let position = cursor.start.min(cursor.end) + link.chars().count();
        self.setCursor(CursorPosition::caret(position));
        Ok(())
    }

    async fn persistSettings(&self) -> AppResult<()> {
        let view = self.viewState();
        let settings = {
            let mut settings = self.settings.write();
            settings.editMode = view.editMode;
            settings.editorFontSize = view.editorFontSize;
            settings.clone()
        };
        match &self.settingsPath {
            Some(path) => saveSettingsTo(path, &settings).await,
            None => Ok(()),
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            currentNote: self.session.currentNote(),
            viewState: self.viewState(),
            selectedTags: self.session.selectedTags(),
            visibleNotes: self.session.visibleNotes(),
            tagTree: commands::tags::sortedTagTree(&self.session.tagTree()),
            tagSuggestions: self.session.tagSuggestions(),
            refreshFileListError: self.session.repository().refreshFileListError(),
        }
    }

    pub fn snapshotJson(&self) -> AppResult<String> {
        serde_json::to_string_pretty(&self.snapshot()).map_err(|e| AppError::Io(e.to_string()))
    }

    /// Drops every bus listener; the app is unusable afterwards
    pub fn shutdown(&self) {
        for handle in &self.listeners {
            self.bus.unregisterEventListener(*handle);
        }
        self.bus.clear();
        tracing::info!("[App::shutdown] Listeners released");
    }
}

fn registerTriggerListeners(
    bus: &EventBus,
    session: &Arc<NoteSession>,
    viewState: &Arc<RwLock<ViewState>>,
    cursor: &Arc<RwLock<CursorPosition>>,
    commandSender: mpsc::UnboundedSender<AppCommand>,
) -> Vec<ListenerHandle> {
    let send = move |command: AppCommand| {
        let sender = commandSender.clone();
        move || {
            if sender.send(command).is_err() {
                tracing::warn!("[App] Command channel closed, dropping {:?}", command);
            }
        }
    };
    let view = |update: fn(&mut ViewState)| {
        let viewState = viewState.clone();
        move || update(&mut viewState.write())
    };

    let mut handles = vec![
        bus.registerEventListener(Trigger::SaveCurrentNote, send(AppCommand::SaveCurrentNote)),
        bus.registerEventListener(Trigger::CreateNewNote, send(AppCommand::CreateNewNote)),
        bus.registerEventListener(Trigger::ToggleZenMode, view(|v| v.zenMode = !v.zenMode)),
        bus.registerEventListener(Trigger::ToggleEditMode, view(|v| v.editMode = !v.editMode)),
        bus.registerEventListener(Trigger::IncreaseFontSize, view(ViewState::increaseFontSize)),
        bus.registerEventListener(Trigger::DecreaseFontSize, view(ViewState::decreaseFontSize)),
    ];
    for trigger in [Trigger::ToggleEditMode, Trigger::IncreaseFontSize, Trigger::DecreaseFontSize] {
        handles.push(bus.registerEventListener(trigger, send(AppCommand::PersistSettings)));
    }

    let session = session.clone();
    let cursor = cursor.clone();
    handles.push(bus.registerEventListener(Trigger::MakeRowIntoCheckbox, move || {
        let position = *cursor.read();
        let markdown = session.currentNote().markdown;
        let updated = insertOrReplaceAtPosition(&markdown, &position, CHECKBOX_PREFIX, InsertType::RowStart);
        if updated == markdown {
            return;
        }
        session.updateMarkdown(&updated);
        let shift = CHECKBOX_PREFIX.chars().count();
        *cursor.write() = CursorPosition {
            start: position.start + shift,
            end: position.end + shift,
            isForwardSelection: position.isForwardSelection,
        };
    }));

    handles
}

/// Sets up the global tracing subscriber, `RUST_LOG` overrides the `info` default
pub fn initTracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

pub async fn run() -> AppResult<()> {
    initTracing();

    let settingsPath = storage::globalConfigPath()?;
    let settings = loadSettingsFrom(&settingsPath).await;
    let paths = Paths::resolve(&settings)?;
    let app = App::initialize(paths, settings, Some(settingsPath)).await?;

    let snapshot = app.snapshot();
    tracing::info!(
        "[run] {} notes in {:?}, current note: {}",
        app.session().repository().allAvailableNotes().len(),
        app.paths().notesFolderPath,
        snapshot.currentNote.fileDescription.title
    );
    for shortcut in app.bus().shortcuts() {
        tracing::info!("[run] Shortcut: {}", shortcut.name);
    }

    app.shutdown();
    Ok(())
}
