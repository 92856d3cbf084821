//! Validation of user-uploaded ringtone files

use std::path::Path;

use tracing::debug;

use crate::error::UploadError;

/// Largest accepted upload, in bytes
pub const MAX_FILE_SIZE: u64 = 512 * 1024;

/// Longest accepted display name, in characters
pub const MAX_NAME_LENGTH: usize = 50;

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/ogg",
];

pub const ALLOWED_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];

/// An uploaded audio file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    /// Declared size in bytes
    pub size: u64,
    pub contents: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: &str, mime_type: &str, contents: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            size: contents.len() as u64,
            contents,
        }
    }

    /// Read a file from disk, guessing the MIME type from its extension
    pub fn open(path: &Path) -> Result<Self, UploadError> {
        let contents = std::fs::read(path).map_err(|e| UploadError::ReadError(e.to_string()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_for_file_name(&file_name);
        Ok(Self::new(&file_name, mime_type, contents))
    }

    /// Lowercase extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}

/// MIME type conventionally used for a file name's extension
pub fn mime_for_file_name(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// Validate an upload and its display name
///
/// Returns the trimmed display name on success.
pub fn validate_upload(file: &UploadFile, name: &str) -> Result<String, UploadError> {
    if file.size > MAX_FILE_SIZE {
        return Err(UploadError::FileTooLarge {
            size: file.size,
            limit: MAX_FILE_SIZE,
        });
    }

    if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(UploadError::InvalidFormat(file.mime_type.clone()));
    }

    match file.extension() {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        other => return Err(UploadError::InvalidExtension(other.unwrap_or_default())),
    }

    if file.contents.len() as u64 != file.size {
        return Err(UploadError::ReadError(format!(
            "expected {} bytes, read {}",
            file.size,
            file.contents.len()
        )));
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(UploadError::EmptyName);
    }
    let len = name.chars().count();
    if len > MAX_NAME_LENGTH {
        return Err(UploadError::NameTooLong {
            len,
            limit: MAX_NAME_LENGTH,
        });
    }

    debug!(file = %file.file_name, size = file.size, "Upload validated");
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, size: usize) -> UploadFile {
        UploadFile::new(name, mime, vec![0u8; size])
    }

    #[test]
    fn test_accepts_small_mp3() {
        let upload = file("bell.mp3", "audio/mpeg", 10 * 1024);
        assert_eq!(validate_upload(&upload, "  Bell  "), Ok("Bell".to_string()));
    }

    #[test]
    fn test_rejects_oversize() {
        let upload = file("big.mp3", "audio/mpeg", 600 * 1024);
        let err = validate_upload(&upload, "Big").unwrap_err();
        assert_eq!(err.key(), "fileTooLarge");
    }

    #[test]
    fn test_rejects_text_file() {
        let upload = file("notes.txt", "text/plain", 100);
        let err = validate_upload(&upload, "Notes").unwrap_err();
        assert_eq!(err.key(), "invalidFormat");
    }

    #[test]
    fn test_rejects_mismatched_extension() {
        let upload = file("bell.flac", "audio/mpeg", 100);
        assert_eq!(
            validate_upload(&upload, "Bell"),
            Err(UploadError::InvalidExtension("flac".to_string()))
        );

        let upload = file("bell", "audio/mpeg", 100);
        assert!(matches!(
            validate_upload(&upload, "Bell"),
            Err(UploadError::InvalidExtension(_))
        ));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let upload = file("BELL.WAV", "audio/wav", 100);
        assert!(validate_upload(&upload, "Bell").is_ok());
    }

    #[test]
    fn test_name_bounds() {
        let upload = file("bell.ogg", "audio/ogg", 100);
        assert_eq!(validate_upload(&upload, "   "), Err(UploadError::EmptyName));

        let long = "a".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(
            validate_upload(&upload, &long),
            Err(UploadError::NameTooLong { len: 51, .. })
        ));

        let exact = "b".repeat(MAX_NAME_LENGTH);
        assert!(validate_upload(&upload, &exact).is_ok());
    }

    #[test]
    fn test_truncated_read() {
        let mut upload = file("bell.ogg", "audio/ogg", 100);
        upload.size = 200;
        assert_eq!(validate_upload(&upload, "Bell").unwrap_err().key(), "readError");
    }

    #[test]
    fn test_open_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ding.wav");
        std::fs::write(&path, b"RIFF....").unwrap();

        let upload = UploadFile::open(&path).unwrap();
        assert_eq!(upload.file_name, "ding.wav");
        assert_eq!(upload.mime_type, "audio/wav");
        assert_eq!(upload.size, 8);

        let missing = UploadFile::open(&dir.path().join("missing.mp3"));
        assert!(matches!(missing, Err(UploadError::ReadError(_))));
    }
}
