//! Ringtone descriptors
//!
//! A ringtone is either one of the built-in synthesized presets (looked up in
//! [`catalog`]) or a user-uploaded audio clip carried inline as a base64 data
//! URL or referenced by location.

pub mod catalog;
pub mod upload;

pub use catalog::{find_preset, PresetRingtone, DEFAULT_RINGTONE_ID, PRESET_RINGTONES};
pub use upload::{validate_upload, UploadFile};

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::audio::AudioError;

/// Prefix distinguishing custom ringtone ids from presets
pub const CUSTOM_ID_PREFIX: &str = "custom";

/// Preset or custom payload of a ringtone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RingtoneKind {
    /// Synthesized from the catalog entry with the same id
    Preset,
    /// User-supplied audio
    Custom {
        /// Inline `data:<mime>;base64,…` payload
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
        /// Path or `file://` URL of the audio file
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

/// A selectable ringtone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ringtone {
    pub id: String,
    /// Message key for presets, user-supplied name for custom ringtones
    pub name: String,
    #[serde(flatten)]
    pub kind: RingtoneKind,
}

impl Ringtone {
    /// Descriptor for a catalog preset
    pub fn preset(preset: &PresetRingtone) -> Self {
        Self {
            id: preset.id.to_string(),
            name: preset.name_key.to_string(),
            kind: RingtoneKind::Preset,
        }
    }

    /// Custom ringtone with an inline data URL payload and a fresh id
    pub fn custom(name: &str, data_url: String) -> Self {
        Self {
            id: crate::id::prefixed_id(CUSTOM_ID_PREFIX),
            name: name.to_string(),
            kind: RingtoneKind::Custom {
                data: Some(data_url),
                url: None,
            },
        }
    }

    /// The default preset ringtone
    pub fn default_preset() -> Self {
        Self::preset(catalog::default_preset())
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.kind, RingtoneKind::Custom { .. })
    }

    /// Load the encoded audio of a custom ringtone
    ///
    /// Inline data takes precedence over a location.
    pub async fn load_audio(&self) -> Result<Vec<u8>, AudioError> {
        match &self.kind {
            RingtoneKind::Preset => Err(AudioError::NoSource),
            RingtoneKind::Custom { data: Some(data), .. } => decode_data_url(data),
            RingtoneKind::Custom { url: Some(url), .. } => {
                let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
                Ok(tokio::fs::read(path).await?)
            }
            RingtoneKind::Custom { .. } => Err(AudioError::NoSource),
        }
    }
}

/// Encode audio bytes as a `data:` URL
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}

/// Decode the payload of a base64 `data:` URL
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, AudioError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AudioError::DecodeError("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AudioError::DecodeError("data URL has no payload".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(AudioError::DecodeError(
            "data URL is not base64 encoded".to_string(),
        ));
    }

    BASE64
        .decode(payload.trim())
        .map_err(|e| AudioError::DecodeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_round_trip() {
        let url = encode_data_url("audio/mpeg", b"ID3\x03");
        assert!(url.starts_with("data:audio/mpeg;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), b"ID3\x03");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode_data_url("http://example.com/a.mp3").is_err());
        assert!(decode_data_url("data:audio/mpeg;base64").is_err());
        assert!(decode_data_url("data:audio/mpeg,plain").is_err());
        assert!(decode_data_url("data:audio/mpeg;base64,!!!").is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let preset = Ringtone::default_preset();
        let json = serde_json::to_value(&preset).unwrap();
        assert_eq!(json["id"], "preset-classic");
        assert_eq!(json["name"], "ringtone.classic");
        assert_eq!(json["type"], "preset");

        let custom = Ringtone::custom("Bell", "data:audio/ogg;base64,AA==".to_string());
        let json = serde_json::to_value(&custom).unwrap();
        assert_eq!(json["type"], "custom");
        assert_eq!(json["data"], "data:audio/ogg;base64,AA==");
        assert!(json.get("url").is_none());

        let back: Ringtone = serde_json::from_value(json).unwrap();
        assert_eq!(back, custom);
    }

    #[test]
    fn test_custom_ids_are_prefixed() {
        let custom = Ringtone::custom("Bell", String::new());
        assert!(custom.id.starts_with("custom-"));
        assert!(custom.is_custom());
        assert!(!Ringtone::default_preset().is_custom());
    }

    #[tokio::test]
    async fn test_load_audio() {
        let custom = Ringtone::custom("Bell", encode_data_url("audio/wav", b"RIFF"));
        assert_eq!(custom.load_audio().await.unwrap(), b"RIFF");

        let empty = Ringtone {
            id: "custom-x".to_string(),
            name: "Empty".to_string(),
            kind: RingtoneKind::Custom {
                data: None,
                url: None,
            },
        };
        assert!(matches!(empty.load_audio().await, Err(AudioError::NoSource)));
        assert!(Ringtone::default_preset().load_audio().await.is_err());
    }
}
