// Tag index - hierarchical tag tree and tag-path filtering
// Tags are `/`-separated paths; `work/projects` nests `projects` under `work`

use crate::models::{FileDescription, TagNode};

pub fn splitTagPath(tag: &str) -> Vec<&str> {
    if tag.is_empty() {
        return Vec::new();
    }
    tag.split('/').collect()
}

/// Selection seeded from the primary (first) tag of a note
pub fn primaryTagPath(tags: &[String]) -> Vec<String> {
    tags.first()
        .map(|tag| splitTagPath(tag).into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Forest of every tag path, siblings in first-seen order
pub fn buildTagTree(notes: &[FileDescription]) -> Vec<TagNode> {
    notes
        .iter()
        .flat_map(|note| note.tags.iter())
        .fold(Vec::new(), |roots, tag| mergeTagPath(roots, &splitTagPath(tag)))
}

fn mergeTagPath(mut nodes: Vec<TagNode>, path: &[&str]) -> Vec<TagNode> {
    let Some((head, rest)) = path.split_first() else {
        return nodes;
    };
    match nodes.iter().position(|node| node.name == *head) {
        Some(index) => {
            let children = std::mem::take(&mut nodes[index].children);
            nodes[index].children = mergeTagPath(children, rest);
        }
        None => nodes.push(TagNode {
            name: head.to_string(),
            children: mergeTagPath(Vec::new(), rest),
        }),
    }
    nodes
}

/// Copy of the forest with siblings ordered by name, for display
pub fn sortedTagTree(nodes: &[TagNode]) -> Vec<TagNode> {
    let mut sorted: Vec<TagNode> = nodes
        .iter()
        .map(|node| TagNode {
            name: node.name.clone(),
            children: sortedTagTree(&node.children),
        })
        .collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

/// A tag shorter than the selection never matches
pub fn noteMatchesTagPath(note: &FileDescription, selectedTags: &[String]) -> bool {
    note.tags.iter().any(|tag| {
        let parts = splitTagPath(tag);
        selectedTags
            .iter()
            .enumerate()
            .all(|(index, selected)| parts.get(index) == Some(&selected.as_str()))
    })
}

/// No selection passes everything through
pub fn filterNotes(notes: &[FileDescription], selectedTags: Option<&[String]>) -> Vec<FileDescription> {
    match selectedTags {
        None => notes.to_vec(),
        Some(selected) => notes
            .iter()
            .filter(|note| noteMatchesTagPath(note, selected))
            .cloned()
            .collect(),
    }
}

/// Whether the node at `nodePath` lies on the selected path and is highlighted
pub fn isPathSelected(nodePath: &[String], selectedTags: Option<&[String]>) -> bool {
    let Some(selected) = selectedTags else {
        return false;
    };
    !nodePath.is_empty() && selected.len() >= nodePath.len() && selected.starts_with(nodePath)
}

/// Suggestions for the tag editor, excluding the note being edited
pub fn tagsFromOtherNotes(notes: &[FileDescription], fileNameWithoutExtension: &str) -> Vec<String> {
    let mut tags: Vec<String> = notes
        .iter()
        .filter(|note| note.fileNameWithoutExtension != fileNameWithoutExtension)
        .flat_map(|note| note.tags.iter().cloned())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}
