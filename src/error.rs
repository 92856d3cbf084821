// Error types for the event timer
//
// This module defines error types using thiserror. Validation failures carry
// a stable message key so the UI layer can look up a localized string.

use thiserror::Error;

/// Errors raised by the alarm engine and template handling
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlarmError {
    #[error("Ring count must be between 1 and 5, got {0}")]
    InvalidRingCount(u32),

    #[error("Auto alarm interval must be at least one second")]
    InvalidInterval,

    #[error("Alarm template not found: {0}")]
    UnknownTemplate(String),

    #[error("Alarm template name is empty")]
    EmptyTemplateName,

    #[error("Alarm template has no time points")]
    NoTimePoints,

    #[error("Alarm template already exists: {0}")]
    DuplicateTemplate(String),

    #[error("Built-in alarm template cannot be modified: {0}")]
    BuiltinTemplate(String),
}

impl AlarmError {
    /// Message key for user-facing validation messages
    pub fn key(&self) -> &'static str {
        match self {
            AlarmError::InvalidRingCount(_) => "ringCountRange",
            AlarmError::InvalidInterval => "intervalGreaterThanZero",
            AlarmError::UnknownTemplate(_) => "templateNotFound",
            AlarmError::EmptyTemplateName => "enterTemplateName",
            AlarmError::NoTimePoints => "addTimePointFirst",
            AlarmError::DuplicateTemplate(_) => "templateExists",
            AlarmError::BuiltinTemplate(_) => "templateReadOnly",
        }
    }
}

/// Custom ringtone upload validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("File is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Unsupported audio type: {0}")]
    InvalidFormat(String),

    #[error("Unsupported file extension: {0}")]
    InvalidExtension(String),

    #[error("Ringtone name is empty")]
    EmptyName,

    #[error("Ringtone name is {len} characters, the limit is {limit}")]
    NameTooLong { len: usize, limit: usize },

    #[error("Failed to read audio data: {0}")]
    ReadError(String),
}

impl UploadError {
    /// Message key for user-facing validation messages
    pub fn key(&self) -> &'static str {
        match self {
            UploadError::FileTooLarge { .. } => "fileTooLarge",
            UploadError::InvalidFormat(_) => "invalidFormat",
            UploadError::InvalidExtension(_) => "invalidExtension",
            UploadError::EmptyName => "nameRequired",
            UploadError::NameTooLong { .. } => "nameTooLong",
            UploadError::ReadError(_) => "readError",
        }
    }
}

/// Key-value storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage quota exceeded while writing '{key}'")]
    QuotaExceeded { key: String },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

// Convenience type aliases for common Result types
pub type AlarmResult<T> = std::result::Result<T, AlarmError>;
pub type StorageResult<T> = std::result::Result<T, StorageError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
