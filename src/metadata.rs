// Front-matter codec for note files
//
// The on-disk layout is fixed and must stay byte compatible:
//
//   ---
//   title: <title>
//   tags: [<tag1>, <tag2>]
//   created: <epoch-ms>
//   modified: <epoch-ms>
//   ---
//
//   <markdown>

use chrono::{DateTime, NaiveDate};

use crate::models::note::{DEFAULT_FILE_NAME_WITHOUT_EXTENSION, DEFAULT_TITLE};
use crate::models::{FileDescription, PartialFileDescription};

const META_START_END_INDICATOR: &str = "---\n";
const TITLE_PREFIX: &str = "title: ";
const TAGS_PREFIX: &str = "tags: [";
const CREATED_PREFIX: &str = "created: ";
const MODIFIED_PREFIX: &str = "modified: ";
const MAIN_TITLE_PREFIX: &str = "# ";

/// Lines read per file when building the directory listing
pub const METADATA_LINES_TO_READ: usize = 5;

pub fn serialize(fileDescription: &FileDescription, markdown: &str) -> String {
    format!(
        "---\ntitle: {}\ntags: [{}]\ncreated: {}\nmodified: {}\n---\n\n{}",
        fileDescription.title,
        fileDescription.tags.join(", "),
        formatTimestamp(fileDescription.created),
        formatTimestamp(fileDescription.modified),
        markdown
    )
}

fn formatTimestamp(timestamp: Option<i64>) -> String {
    timestamp.map(|t| t.to_string()).unwrap_or_default()
}

/// Lenient scan: unknown lines are skipped, later lines overwrite earlier ones
pub fn deserializeMetadata<I, S>(lines: I) -> PartialFileDescription
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut partial = PartialFileDescription::default();
    for line in lines {
        let line = line.as_ref();
        if let Some(value) = line.strip_prefix(TAGS_PREFIX) {
            partial.tags = Some(parseTags(value));
        } else if let Some(value) = line.strip_prefix(TITLE_PREFIX) {
            partial.title = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix(CREATED_PREFIX) {
            partial.created = parseTimestamp(value);
        } else if let Some(value) = line.strip_prefix(MODIFIED_PREFIX) {
            partial.modified = parseTimestamp(value);
        }
    }
    partial
}

/// Entries keep their surrounding whitespace; `[a, b]` yields `a` and ` b`
fn parseTags(value: &str) -> Vec<String> {
    value
        .replace(']', "")
        .split(',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Epoch milliseconds, or an RFC 3339 / YYYY-MM-DD date
pub fn parseTimestamp(value: &str) -> Option<i64> {
    let value = value.trim().replace(['\'', '"'], "");
    if let Ok(millis) = value.parse::<i64>() {
        return Some(millis);
    }
    if let Ok(dateTime) = DateTime::parse_from_rfc3339(&value) {
        return Some(dateTime.timestamp_millis());
    }
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dateTime| dateTime.and_utc().timestamp_millis())
}

/// Body after the closing front-matter delimiter
///
/// Without two `---\n` markers the whole text is treated as body.
pub fn extractMarkdownBody(rawText: &str) -> String {
    let Some(start) = findDelimiterLine(rawText, 0) else {
        return rawText.to_string();
    };
    let Some(end) = findDelimiterLine(rawText, start + META_START_END_INDICATOR.len()) else {
        return rawText.to_string();
    };

    let body = &rawText[end + META_START_END_INDICATOR.len()..];
    body.strip_prefix('\n').unwrap_or(body).to_string()
}

/// Next `---\n` at or after `from` that starts a line
fn findDelimiterLine(text: &str, from: usize) -> Option<usize> {
    let mut searchFrom = from;
    while let Some(offset) = text[searchFrom..].find(META_START_END_INDICATOR) {
        let position = searchFrom + offset;
        if position == 0 || text.as_bytes()[position - 1] == b'\n' {
            return Some(position);
        }
        searchFrom = position + META_START_END_INDICATOR.len();
    }
    None
}

fn mainTitleLine(markdown: &str) -> Option<&str> {
    markdown.lines().find_map(|line| {
        line.strip_prefix(MAIN_TITLE_PREFIX)
            .map(|title| title.trim_end_matches('\r'))
            .filter(|title| !title.is_empty())
    })
}

/// Text of the first `# ` heading, "Untitled" when there is none
pub fn extractTitle(markdown: &str) -> String {
    mainTitleLine(markdown).unwrap_or(DEFAULT_TITLE).to_string()
}

/// File name stem derived from the first `# ` heading
pub fn extractFileName(markdown: &str) -> String {
    let Some(title) = mainTitleLine(markdown) else {
        return DEFAULT_FILE_NAME_WITHOUT_EXTENSION.to_string();
    };
    let fileName: String = title
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if fileName.is_empty() || fileName == "." || fileName == ".." {
        DEFAULT_FILE_NAME_WITHOUT_EXTENSION.to_string()
    } else {
        fileName
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description() -> FileDescription {
        FileDescription {
            fileNameWithoutExtension: "Shopping".to_string(),
            title: "Shopping".to_string(),
            tags: vec!["home".to_string(), "errands/weekly".to_string()],
            created: Some(1_600_000_000_000),
            modified: Some(1_600_000_500_000),
            fileExists: true,
        }
    }

    #[test]
    fn serialize_emits_fixed_layout() {
        let raw = serialize(&description(), "# Shopping\n- milk");
        assert_eq!(
            raw,
            "---\ntitle: Shopping\ntags: [home, errands/weekly]\ncreated: 1600000000000\nmodified: 1600000500000\n---\n\n# Shopping\n- milk"
        );
    }

    #[test]
    fn body_survives_round_trip() {
        for markdown in ["# Shopping\n- milk", "", "\n\nleading blank lines", "trailing\n\n"] {
            let raw = serialize(&description(), markdown);
            assert_eq!(extractMarkdownBody(&raw), markdown);
        }
    }

    #[test]
    fn delimiter_inside_a_value_is_not_a_boundary() {
        let mut tricky = description();
        tricky.title = "before---".to_string();
        let raw = serialize(&tricky, "# Body");
        assert_eq!(extractMarkdownBody(&raw), "# Body");
    }

    #[test]
    fn body_without_front_matter_is_whole_text() {
        assert_eq!(extractMarkdownBody("# Plain note"), "# Plain note");
        assert_eq!(extractMarkdownBody("---\ntitle: half open"), "---\ntitle: half open");
    }

    #[test]
    fn body_of_front_matter_only_file_is_empty() {
        assert_eq!(extractMarkdownBody("---\ntitle: x\n---\n"), "");
    }

    #[test]
    fn metadata_is_read_back() {
        let raw = serialize(&description(), "# Shopping");
        let partial = deserializeMetadata(raw.lines().take(METADATA_LINES_TO_READ));
        assert_eq!(partial.title.as_deref(), Some("Shopping"));
        assert_eq!(partial.created, Some(1_600_000_000_000));
        assert_eq!(partial.modified, Some(1_600_000_500_000));
    }

    #[test]
    fn tag_entries_keep_leading_whitespace() {
        let partial = deserializeMetadata(["tags: [home, errands/weekly]"]);
        assert_eq!(partial.tags, Some(vec!["home".to_string(), " errands/weekly".to_string()]));

        let empty = deserializeMetadata(["tags: []"]);
        assert_eq!(empty.tags, Some(vec![]));
    }

    #[test]
    fn truncated_metadata_leaves_fields_unset() {
        let partial = deserializeMetadata(["---", "title: Only a title"]);
        assert_eq!(partial.title.as_deref(), Some("Only a title"));
        assert_eq!(partial.tags, None);
        assert_eq!(partial.created, None);
    }

    #[test]
    fn timestamps_accept_dates_and_reject_garbage() {
        assert_eq!(parseTimestamp("1600000000000"), Some(1_600_000_000_000));
        assert_eq!(parseTimestamp("'2020-09-13T12:26:40Z'"), Some(1_600_000_000_000));
        assert_eq!(parseTimestamp("1970-01-02"), Some(86_400_000));
        assert_eq!(parseTimestamp("soon"), None);
        assert_eq!(parseTimestamp(""), None);
    }

    #[test]
    fn title_comes_from_first_main_heading() {
        assert_eq!(extractTitle("intro\n## Sub\n# Real title\n# Second"), "Real title");
        assert_eq!(extractTitle("no heading here"), "Untitled");
        assert_eq!(extractTitle("# \nbody"), "Untitled");
        assert_eq!(extractTitle("# \n# Later"), "Later");
        assert_eq!(extractTitle("# Windows line\r\nbody"), "Windows line");
    }

    #[test]
    fn file_name_replaces_spaces_and_separators() {
        assert_eq!(extractFileName("# Meeting notes"), "Meeting_notes");
        assert_eq!(extractFileName("# a/b: c?"), "a_b__c_");
        assert_eq!(extractFileName("plain"), "Untitled");
        assert_eq!(extractFileName("# .."), "Untitled");
    }
}
