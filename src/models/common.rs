// Common types shared by the host and its features

use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_SIZE: u32 = 14;
pub const FONT_SIZE_STEP: u32 = 4;

/// Presentation state toggled from keyboard shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub zenMode: bool,
    pub editMode: bool,
    pub editorFontSize: u32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zenMode: false,
            editMode: false,
            editorFontSize: DEFAULT_FONT_SIZE,
        }
    }
}

impl ViewState {
    pub fn increaseFontSize(&mut self) {
        self.editorFontSize += FONT_SIZE_STEP;
    }

    /// Never shrinks below a single step
    pub fn decreaseFontSize(&mut self) {
        self.editorFontSize = if self.editorFontSize > FONT_SIZE_STEP {
            self.editorFontSize - FONT_SIZE_STEP
        } else {
            FONT_SIZE_STEP
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_steps_and_clamps() {
        let mut view = ViewState::default();
        view.increaseFontSize();
        assert_eq!(view.editorFontSize, 18);

        for _ in 0..10 {
            view.decreaseFontSize();
        }
        assert_eq!(view.editorFontSize, FONT_SIZE_STEP);
    }
}
