// Editor commands - text insertion helpers driven by the cursor position
// Positions count characters, not bytes

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub start: usize,
    pub end: usize,
    /// `None` when the editor reports no direction
    pub isForwardSelection: Option<bool>,
}

impl CursorPosition {
    pub fn caret(position: usize) -> Self {
        Self {
            start: position,
            end: position,
            isForwardSelection: None,
        }
    }

    pub fn isSelection(&self) -> bool {
        self.start != self.end
    }

    fn ordered(&self) -> (usize, usize) {
        (self.start.min(self.end), self.start.max(self.end))
    }
}

/// One line of the document; `endsAtPosition` is where its line break sits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorRow {
    pub index: usize,
    pub startsAtPosition: usize,
    pub endsAtPosition: usize,
    pub stringValue: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertType {
    RowStart,
    RowEnd,
    AroundSelection,
    SelectionStart,
    SelectionEnd,
    ReplaceSelection,
}

pub fn getRowInformation(markdown: &str) -> Vec<EditorRow> {
    let mut startsAtPosition = 0;
    markdown
        .split('\n')
        .enumerate()
        .map(|(index, row)| {
            let endsAtPosition = startsAtPosition + row.chars().count();
            let editorRow = EditorRow {
                index,
                startsAtPosition,
                endsAtPosition,
                stringValue: format!("{}\n", row),
            };
            startsAtPosition = endsAtPosition + 1;
            editorRow
        })
        .collect()
}

/// Row containing the whole cursor range, `None` when it spans rows
pub fn getCurrentRow<'a>(cursor: &CursorPosition, rows: &'a [EditorRow]) -> Option<&'a EditorRow> {
    let (start, end) = cursor.ordered();
    rows.iter().find(|row| row.startsAtPosition <= start && row.endsAtPosition >= end)
}

fn byteOffset(text: &str, position: usize) -> usize {
    text.char_indices().nth(position).map(|(offset, _)| offset).unwrap_or(text.len())
}

fn insertAt(markdown: &str, position: usize, insert: &str) -> String {
    let offset = byteOffset(markdown, position);
    format!("{}{}{}", &markdown[..offset], insert, &markdown[offset..])
}

pub fn insertOrReplaceAtPosition(markdown: &str, cursor: &CursorPosition, insert: &str, insertType: InsertType) -> String {
    let (start, end) = cursor.ordered();
    match insertType {
        InsertType::RowStart | InsertType::RowEnd => {
            let rows = getRowInformation(markdown);
            let Some(row) = getCurrentRow(cursor, &rows) else {
                tracing::debug!("[insertOrReplaceAtPosition] Cursor spans several rows, nothing inserted");
                return markdown.to_string();
            };
            let position = if insertType == InsertType::RowStart {
                row.startsAtPosition
            } else {
                row.endsAtPosition
            };
            insertAt(markdown, position, insert)
        }
        InsertType::AroundSelection if cursor.isSelection() => {
            let startOffset = byteOffset(markdown, start);
            let endOffset = byteOffset(markdown, end);
            format!(
                "{}{}{}{}{}",
                &markdown[..startOffset],
                insert,
                &markdown[startOffset..endOffset],
                insert,
                &markdown[endOffset..]
            )
        }
        InsertType::AroundSelection | InsertType::SelectionStart => insertAt(markdown, start, insert),
        InsertType::SelectionEnd => insertAt(markdown, end, insert),
        InsertType::ReplaceSelection => {
            let startOffset = byteOffset(markdown, start);
            let endOffset = byteOffset(markdown, end);
            format!("{}{}{}", &markdown[..startOffset], insert, &markdown[endOffset..])
        }
    }
}
