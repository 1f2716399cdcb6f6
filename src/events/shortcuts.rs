// Keyboard shortcut table mapping key chords to bus triggers

use serde::{Deserialize, Serialize};

use super::Trigger;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCombination {
    pub ctrlKey: bool,
    pub altKey: bool,
    /// Key value as reported by the keyboard event, compared exactly
    pub key: String,
}

impl KeyCombination {
    pub fn new(ctrlKey: bool, altKey: bool, key: &str) -> Self {
        Self {
            ctrlKey,
            altKey,
            key: key.to_string(),
        }
    }

    pub fn ctrl(key: &str) -> Self {
        Self::new(true, false, key)
    }

    pub fn alt(key: &str) -> Self {
        Self::new(false, true, key)
    }

    pub fn ctrlAlt(key: &str) -> Self {
        Self::new(true, true, key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub name: String,
    pub keyCombination: KeyCombination,
    pub trigger: Trigger,
}

impl Shortcut {
    fn new(name: &str, keyCombination: KeyCombination, trigger: Trigger) -> Self {
        Self {
            name: name.to_string(),
            keyCombination,
            trigger,
        }
    }
}

pub fn defaultShortcuts() -> Vec<Shortcut> {
    vec![
        Shortcut::new("Window: Toggle zen mode", KeyCombination::ctrlAlt("z"), Trigger::ToggleZenMode),
        Shortcut::new("Note management: Create new note", KeyCombination::ctrl("n"), Trigger::CreateNewNote),
        Shortcut::new("Note management: Save current note", KeyCombination::ctrl("s"), Trigger::SaveCurrentNote),
        Shortcut::new("Editor: Toggle edit mode", KeyCombination::ctrl("e"), Trigger::ToggleEditMode),
        Shortcut::new("Editor: Make row into checkbox", KeyCombination::alt("d"), Trigger::MakeRowIntoCheckbox),
        Shortcut::new("Editor: Increase font size", KeyCombination::ctrl("+"), Trigger::IncreaseFontSize),
        Shortcut::new("Editor: Decrease font size", KeyCombination::ctrl("-"), Trigger::DecreaseFontSize),
    ]
}

/// Modifier flags must match exactly; Ctrl+Alt+s is not Ctrl+s
pub fn findShortcut<'a>(shortcuts: &'a [Shortcut], combination: &KeyCombination) -> Option<&'a Shortcut> {
    shortcuts.iter().find(|s| s.keyCombination == *combination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_trigger_once() {
        let shortcuts = defaultShortcuts();
        for trigger in Trigger::ALL {
            assert_eq!(shortcuts.iter().filter(|s| s.trigger == trigger).count(), 1, "{:?}", trigger);
        }
    }

    #[test]
    fn lookup_requires_exact_modifiers() {
        let shortcuts = defaultShortcuts();
        assert_eq!(
            findShortcut(&shortcuts, &KeyCombination::ctrl("s")).map(|s| s.trigger),
            Some(Trigger::SaveCurrentNote)
        );
        assert!(findShortcut(&shortcuts, &KeyCombination::ctrlAlt("s")).is_none());
        assert!(findShortcut(&shortcuts, &KeyCombination::ctrl("z")).is_none());
        assert!(findShortcut(&shortcuts, &KeyCombination::ctrl("S")).is_none());
    }
}
