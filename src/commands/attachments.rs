// Attachment commands - clipboard images saved next to the notes folder
// Markdown refers to them through the `@attachments` placeholder so stored notes stay portable

use std::path::Path;
use std::sync::LazyLock;

use base64::Engine;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::errors::{AppError, AppResult};
use crate::storage::Paths;

pub const ATTACHMENTS_PLACEHOLDER: &str = "@attachments";

pub const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/gif", "image/png", "image/jpeg", "image/bmp"];

static PLACEHOLDER_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!\[[^\]]*\]\()@attachments/").expect("valid regex"));

/// Image pasted into the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardImage {
    pub name: String,
    pub mimeType: String,
    /// Epoch milliseconds of the source file, used as a name prefix
    pub lastModified: i64,
    /// Base64 payload, with or without a `data:<mime>;base64,` prefix
    pub data: String,
}

pub fn isAcceptedImageType(mimeType: &str) -> bool {
    ACCEPTED_IMAGE_TYPES.contains(&mimeType)
}

fn attachmentFileName(image: &ClipboardImage) -> String {
    let name: String = image
        .name
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '(' | ')' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}-{}", image.lastModified, name)
}

fn decodePayload(data: &str) -> AppResult<Vec<u8>> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
}

/// Writes the image into the attachments folder and returns the markdown to insert
pub async fn saveImageAttachment(paths: &Paths, image: &ClipboardImage) -> AppResult<String> {
    tracing::debug!("[saveImageAttachment] {} ({})", image.name, image.mimeType);

    if !isAcceptedImageType(&image.mimeType) {
        return Err(AppError::Attachment(format!("unsupported image type {}", image.mimeType)));
    }
    let bytes = decodePayload(&image.data)?;

    let fileName = attachmentFileName(image);
    let path = paths.attachmentsFolderPath.join(&fileName);
    fs::create_dir_all(&paths.attachmentsFolderPath).await?;
    fs::write(&path, bytes).await.map_err(|e| {
        tracing::error!("[saveImageAttachment] Failed to write {:?}: {}", path, e);
        AppError::Write(format!("{}: {}", path.display(), e))
    })?;

    tracing::info!("[saveImageAttachment] Saved {}", fileName);
    Ok(format!("![]({}/{})", ATTACHMENTS_PLACEHOLDER, fileName))
}

fn folderPrefix(attachmentsFolderPath: &Path) -> String {
    let folder = attachmentsFolderPath.to_string_lossy();
    format!("{}/", folder.trim_end_matches(['/', '\\']))
}

/// Placeholder to absolute path, for rendering
pub fn replaceAttachmentPlaceholders(markdown: &str, attachmentsFolderPath: &Path) -> String {
    let prefix = folderPrefix(attachmentsFolderPath);
    PLACEHOLDER_LINK
        .replace_all(markdown, |caps: &Captures| format!("{}{}", &caps[1], prefix))
        .into_owned()
}

/// Absolute path back to the placeholder, applied before every save
pub fn restoreAttachmentPlaceholders(markdown: &str, attachmentsFolderPath: &Path) -> String {
    let pattern = format!(r"(!\[[^\]]*\]\(){}", regex::escape(&folderPrefix(attachmentsFolderPath)));
    let Ok(absoluteLink) = Regex::new(&pattern) else {
        return markdown.to_string();
    };
    absoluteLink
        .replace_all(markdown, |caps: &Captures| format!("{}{}/", &caps[1], ATTACHMENTS_PLACEHOLDER))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn image(data: &str) -> ClipboardImage {
        ClipboardImage {
            name: "screen shot.png".to_string(),
            mimeType: "image/png".to_string(),
            lastModified: 1_700_000_000_000,
            data: data.to_string(),
        }
    }

    #[tokio::test]
    async fn saves_decoded_image_and_returns_link() {
        let tmp = tempdir().unwrap();
        let paths = Paths::fromRoot(tmp.path());
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"png-bytes");

        let link = saveImageAttachment(&paths, &image(&format!("data:image/png;base64,{}", encoded)))
            .await
            .unwrap();

        assert_eq!(link, "![](@attachments/1700000000000-screen_shot.png)");
        let written = std::fs::read(paths.attachmentsFolderPath.join("1700000000000-screen_shot.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn accepts_payload_without_data_url_prefix() {
        let tmp = tempdir().unwrap();
        let paths = Paths::fromRoot(tmp.path());
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"raw");
        assert!(saveImageAttachment(&paths, &image(&encoded)).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_unsupported_type_and_bad_payload() {
        let tmp = tempdir().unwrap();
        let paths = Paths::fromRoot(tmp.path());

        let mut svg = image("AAAA");
        svg.mimeType = "image/svg+xml".to_string();
        assert!(matches!(saveImageAttachment(&paths, &svg).await, Err(AppError::Attachment(_))));

        let garbage = image("not base64!!");
        assert!(matches!(saveImageAttachment(&paths, &garbage).await, Err(AppError::Attachment(_))));
    }

    #[test]
    fn placeholders_resolve_and_restore() {
        let folder = Path::new("/home/me/.noetter/attachments");
        let stored = "# Trip\n![](@attachments/1-a.png)\n![alt](@attachments/2-b.jpg)\n@attachments/not-a-link";

        let rendered = replaceAttachmentPlaceholders(stored, folder);
        assert!(rendered.contains("![](/home/me/.noetter/attachments/1-a.png)"));
        assert!(rendered.contains("![alt](/home/me/.noetter/attachments/2-b.jpg)"));
        assert!(rendered.ends_with("@attachments/not-a-link"));

        assert_eq!(restoreAttachmentPlaceholders(&rendered, folder), stored);
    }

    #[test]
    fn restore_ignores_other_absolute_links() {
        let folder = Path::new("/data/attachments");
        let markdown = "![](/elsewhere/pic.png)";
        assert_eq!(restoreAttachmentPlaceholders(markdown, folder), markdown);
    }
}
