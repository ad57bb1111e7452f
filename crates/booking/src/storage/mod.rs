//! Attachment blob naming and the filesystem blob store.

pub mod filesystem;

use std::path::PathBuf;

use uuid::Uuid;

use crate::model::AttachmentUpload;

pub use filesystem::BlobStorage;

const MAX_HINT_CHARS: usize = 100;
const FALLBACK_HINT: &str = "attachment";

/// Reduces a user-supplied file name to `[A-Za-z0-9._-]`.
///
/// Directory components are dropped, other characters become `_`, leading
/// dots are stripped and the result is capped at 100 characters.
pub fn sanitize_file_name(hint: &str) -> String {
    let base = hint.rsplit(['/', '\\']).next().unwrap_or(hint);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed: String = cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_HINT_CHARS)
        .collect();

    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        FALLBACK_HINT.to_string()
    } else {
        trimmed
    }
}

/// `<uuid>-<sanitized hint>`. Unique per call, even for identical hints.
pub fn object_name(hint: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_file_name(hint))
}

/// The declared content type, or one guessed from the file name.
pub fn content_type_for(upload: &AttachmentUpload) -> String {
    let declared = upload.content_type.trim();
    if !declared.is_empty() {
        return declared.to_string();
    }
    mime_guess::from_path(&upload.file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// `~/.booking/uploads`
pub fn default_blob_directory() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".booking").join("uploads"))
}
