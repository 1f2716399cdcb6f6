// Event bus - triggers queued from keyboard chords, drained in FIFO order
// One bus is built at startup and shared by reference; nothing here is global

pub mod shortcuts;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

pub use shortcuts::{KeyCombination, Shortcut, defaultShortcuts, findShortcut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    ToggleZenMode,
    CreateNewNote,
    SaveCurrentNote,
    ToggleEditMode,
    MakeRowIntoCheckbox,
    IncreaseFontSize,
    DecreaseFontSize,
}

impl Trigger {
    pub const ALL: [Trigger; 7] = [
        Trigger::ToggleZenMode,
        Trigger::CreateNewNote,
        Trigger::SaveCurrentNote,
        Trigger::ToggleEditMode,
        Trigger::MakeRowIntoCheckbox,
        Trigger::IncreaseFontSize,
        Trigger::DecreaseFontSize,
    ];
}

pub type EventCallback = Arc<dyn Fn() + Send + Sync>;

/// Returned by registration; unregistering removes exactly that registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    trigger: Trigger,
    id: u64,
}

/// Compaction only kicks in past this many slots
const MIN_SLOTS_BEFORE_COMPACTION: usize = 16;

#[derive(Default)]
struct ListenerSlots {
    slots: Vec<Option<(u64, EventCallback)>>,
    positions: HashMap<u64, usize>,
    live: usize,
}

impl ListenerSlots {
    fn push(&mut self, id: u64, callback: EventCallback) {
        self.positions.insert(id, self.slots.len());
        self.slots.push(Some((id, callback)));
        self.live += 1;
    }

    fn remove(&mut self, id: u64) -> bool {
        let Some(position) = self.positions.remove(&id) else {
            return false;
        };
        self.slots[position] = None;
        self.live -= 1;
        if self.slots.len() > MIN_SLOTS_BEFORE_COMPACTION && self.live * 2 < self.slots.len() {
            self.compact();
        }
        true
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        self.positions = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(position, slot)| slot.as_ref().map(|(id, _)| (*id, position)))
            .collect();
    }

    fn callbacks(&self) -> Vec<EventCallback> {
        self.slots.iter().flatten().map(|(_, callback)| callback.clone()).collect()
    }
}

#[derive(Default)]
struct Registry {
    listeners: HashMap<Trigger, ListenerSlots>,
    nextId: u64,
}

pub struct EventBus {
    registry: RwLock<Registry>,
    queue: Mutex<VecDeque<Trigger>>,
    shortcuts: Vec<Shortcut>,
    draining: AtomicBool,
}

struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::withShortcuts(defaultShortcuts())
    }

    pub fn withShortcuts(shortcuts: Vec<Shortcut>) -> Self {
        for shortcut in &shortcuts {
            tracing::debug!("[EventBus] Shortcut registered: {}", shortcut.name);
        }
        Self {
            registry: RwLock::new(Registry::default()),
            queue: Mutex::new(VecDeque::new()),
            shortcuts,
            draining: AtomicBool::new(false),
        }
    }

    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    /// Registering the same callback twice means it runs twice
    pub fn registerEventListener<F>(&self, trigger: Trigger, callback: F) -> ListenerHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = self.registry.write();
        let id = registry.nextId;
        registry.nextId += 1;
        registry.listeners.entry(trigger).or_default().push(id, Arc::new(callback));
        ListenerHandle { trigger, id }
    }

    /// Returns false when the handle was already unregistered
    pub fn unregisterEventListener(&self, handle: ListenerHandle) -> bool {
        self.registry
            .write()
            .listeners
            .get_mut(&handle.trigger)
            .is_some_and(|slots| slots.remove(handle.id))
    }

    pub fn listenerCount(&self, trigger: Trigger) -> usize {
        self.registry.read().listeners.get(&trigger).map_or(0, |slots| slots.live)
    }

    pub fn queueEvent(&self, trigger: Trigger) {
        tracing::trace!("[queueEvent] {:?}", trigger);
        self.queue.lock().push_back(trigger);
    }

    pub fn pendingEvents(&self) -> usize {
        self.queue.lock().len()
    }

    /// Queues the trigger bound to the chord; false when no shortcut matches
    pub fn handleKeyDown(&self, combination: &KeyCombination) -> bool {
        match findShortcut(&self.shortcuts, combination) {
            Some(shortcut) => {
                tracing::debug!("[handleKeyDown] {}", shortcut.name);
                self.queueEvent(shortcut.trigger);
                true
            }
            None => false,
        }
    }

    fn popEvent(&self) -> Option<Trigger> {
        self.queue.lock().pop_front()
    }

    fn listenersFor(&self, trigger: Trigger) -> Vec<EventCallback> {
        self.registry.read().listeners.get(&trigger).map(ListenerSlots::callbacks).unwrap_or_default()
    }

    /// Runs every listener of each queued trigger, one trigger at a time
    ///
    /// Listeners are snapshotted per trigger, so a callback may register,
    /// unregister or queue without deadlocking. A nested call from inside a
    /// callback returns 0 and leaves the work to the outer drain. Events
    /// queued by another thread while the flag is being released are picked
    /// up by a second pass.
    pub fn drain(&self) -> usize {
        let mut handled = 0;
        loop {
            if self.draining.swap(true, Ordering::AcqRel) {
                return handled;
            }
            {
                let _guard = DrainGuard(&self.draining);
                while let Some(trigger) = self.popEvent() {
                    let callbacks = self.listenersFor(trigger);
                    tracing::trace!("[drain] {:?} -> {} listeners", trigger, callbacks.len());
                    for callback in callbacks {
                        callback();
                    }
                    handled += 1;
                }
            }
            if self.pendingEvents() == 0 {
                return handled;
            }
        }
    }

    /// Drops every listener and pending event
    pub fn clear(&self) {
        self.registry.write().listeners.clear();
        self.queue.lock().clear();
        tracing::debug!("[EventBus] Cleared");
    }
}
