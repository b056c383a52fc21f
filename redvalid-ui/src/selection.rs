//! Client-side video file selection
//!
//! A file is accepted only when its content type starts with `video/` and
//! its size is within the configured limit. Both checks run before any
//! network call; the size check runs before the file is read.

use crate::display::format_bytes;
use crate::error::{FlowError, FlowResult};
use crate::messages::SELECT_VIDEO_FILE;
use std::path::Path;
use tracing::debug;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A video file picked by the user
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl SelectedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Check type and size against the limit
    pub fn validate(&self, max_bytes: u64) -> FlowResult<()> {
        validate_selection(self.size(), &self.content_type, max_bytes)
    }

    /// Open a file from disk, rejecting it before reading if it is too large
    pub async fn open(path: &Path, max_bytes: u64) -> FlowResult<Self> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| FlowError::Validation(format!("Cannot open {}: {}", path.display(), e)))?;

        if !metadata.is_file() {
            return Err(FlowError::Validation(SELECT_VIDEO_FILE.to_string()));
        }
        check_size(metadata.len(), max_bytes)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FlowError::Validation(format!("Cannot read {}: {}", path.display(), e)))?;

        let content_type = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        debug!(
            file = %file_name,
            content_type = %content_type,
            size = bytes.len(),
            "Selected video file"
        );

        let file = Self::new(file_name, content_type, bytes);
        file.validate(max_bytes)?;
        Ok(file)
    }
}

/// Reject non-video content types and oversized files
pub fn validate_selection(size: u64, content_type: &str, max_bytes: u64) -> FlowResult<()> {
    if !content_type.to_ascii_lowercase().starts_with("video/") {
        return Err(FlowError::Validation(format!(
            "Only video files can be selected (got {}).",
            if content_type.is_empty() { "unknown type" } else { content_type }
        )));
    }
    check_size(size, max_bytes)
}

fn check_size(size: u64, max_bytes: u64) -> FlowResult<()> {
    if size > max_bytes {
        return Err(FlowError::Validation(format!(
            "File is too large ({}). The limit is {}.",
            format_bytes(size),
            format_bytes(max_bytes)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 50 * 1024 * 1024;

    #[test]
    fn test_accepts_video_within_limit() {
        assert!(validate_selection(LIMIT, "video/mp4", LIMIT).is_ok());
        assert!(validate_selection(1, "VIDEO/webm", LIMIT).is_ok());
    }

    #[test]
    fn test_rejects_oversized_video() {
        let err = validate_selection(LIMIT + 1, "video/mp4", LIMIT).unwrap_err();
        match err {
            FlowError::Validation(msg) => assert!(msg.contains("50.0 MB"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_video_type() {
        assert!(validate_selection(10, "image/png", LIMIT).is_err());
        assert!(validate_selection(10, "", LIMIT).is_err());
        assert!(validate_selection(10, "application/octet-stream", LIMIT).is_err());
    }

    #[test]
    fn test_debug_omits_bytes() {
        let file = SelectedFile::new("a.mp4", "video/mp4", vec![0; 4]);
        let text = format!("{:?}", file);
        assert!(text.contains("size: 4"));
        assert!(!text.contains("[0, 0"));
    }
}
