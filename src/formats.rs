//! # Format Registry Module
//!
//! Tabella immutabile che associa ogni formato destinazione al profilo di
//! argomenti per l'encoder.
//!
//! ## Responsabilità:
//! - Definisce `AudioFormat`, gli identificatori riconosciuti (`flac`, `mp3`, ...)
//! - Definisce `EncoderProfile`: codec, regola bitrate, metadata e cover art
//! - Costruisce il registry per il set di profili scelto (`minimal` / `extended`)
//! - Valida gli identificatori forniti dall'utente nominando l'opzione CLI
//!
//! ## Profili registrati:
//! - **flac**: codec `flac`, impostazioni di default, nessun bitrate
//! - **mp3**: `libmp3lame`, bitrate costante, ID3v2.3, cover art copiata
//! - **wav**: PCM `pcm_s16le`, nessun bitrate
//! - **aac** (extended): codec `aac`, bitrate costante
//! - **ogg** (extended): `libvorbis`, controllo a qualità (`-q:a 6`)
//!
//! Aggiungere un formato è una modifica ai soli dati di `FormatRegistry::new`.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Audio container/codec identifiers understood by the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Aac,
    Flac,
    Mp3,
    Ogg,
    Wav,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 5] = [
        AudioFormat::Aac,
        AudioFormat::Flac,
        AudioFormat::Mp3,
        AudioFormat::Ogg,
        AudioFormat::Wav,
    ];

    /// Identifier as typed on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Wav => "wav",
        }
    }

    /// File extension (without the dot) produced for this format
    pub fn extension(&self) -> &'static str {
        self.id()
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.id() == lower)
            .ok_or_else(|| format!("unknown audio format: {}", s))
    }
}

/// How the bitrate option is applied for a given target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitrateRule {
    /// `-b:a <bitrate>` with the user supplied bitrate
    Constant,
    /// `-q:a <value>`, the user bitrate is ignored
    Quality(&'static str),
    /// No rate control argument at all
    None,
}

/// Encoder argument profile for one target format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderProfile {
    pub codec: &'static str,
    pub bitrate: BitrateRule,
    /// Carry container metadata and chapters from the first input
    pub preserve_metadata: bool,
    /// Pass through the first video stream (embedded cover image) if present
    pub cover_art: bool,
    /// Codec specific flags appended after the codec selection
    pub extra_args: &'static [&'static str],
}

/// Which group of profiles is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSet {
    /// flac, mp3, wav
    Minimal,
    /// minimal plus aac, ogg
    #[default]
    Extended,
}

impl FromStr for ProfileSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "extended" => Ok(Self::Extended),
            other => Err(format!("unknown profile set '{}' (expected minimal or extended)", other)),
        }
    }
}

/// Immutable mapping from target format to encoder profile
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    profiles: BTreeMap<AudioFormat, EncoderProfile>,
}

impl FormatRegistry {
    /// Build the registry for a profile set
    pub fn new(set: ProfileSet) -> Self {
        let mut profiles = BTreeMap::new();

        profiles.insert(
            AudioFormat::Mp3,
            EncoderProfile {
                codec: "libmp3lame",
                bitrate: BitrateRule::Constant,
                preserve_metadata: true,
                cover_art: true,
                extra_args: &["-id3v2_version", "3"],
            },
        );
        profiles.insert(
            AudioFormat::Flac,
            EncoderProfile {
                codec: "flac",
                bitrate: BitrateRule::None,
                preserve_metadata: true,
                cover_art: false,
                extra_args: &[],
            },
        );
        profiles.insert(
            AudioFormat::Wav,
            EncoderProfile {
                codec: "pcm_s16le",
                bitrate: BitrateRule::None,
                preserve_metadata: true,
                cover_art: false,
                extra_args: &[],
            },
        );

        if set == ProfileSet::Extended {
            profiles.insert(
                AudioFormat::Aac,
                EncoderProfile {
                    codec: "aac",
                    bitrate: BitrateRule::Constant,
                    preserve_metadata: true,
                    cover_art: false,
                    extra_args: &[],
                },
            );
            profiles.insert(
                AudioFormat::Ogg,
                EncoderProfile {
                    codec: "libvorbis",
                    bitrate: BitrateRule::Quality("6"),
                    preserve_metadata: true,
                    cover_art: false,
                    extra_args: &[],
                },
            );
        }

        Self { profiles }
    }

    /// Look up the profile for a registered format
    pub fn get(&self, format: AudioFormat) -> Option<&EncoderProfile> {
        self.profiles.get(&format)
    }

    pub fn contains(&self, format: AudioFormat) -> bool {
        self.profiles.contains_key(&format)
    }

    /// Comma separated, alphabetically sorted list of registered identifiers
    pub fn valid_formats(&self) -> String {
        self.profiles
            .keys()
            .map(|f| f.id())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Parse a user supplied identifier, rejecting anything not registered
    ///
    /// `option` is the CLI option the value came from and is echoed back in
    /// the error message.
    pub fn resolve(&self, option: &'static str, value: &str) -> Result<AudioFormat, ConvertError> {
        match value.parse::<AudioFormat>() {
            Ok(format) if self.contains(format) => Ok(format),
            _ => Err(ConvertError::UnknownFormat {
                option,
                value: value.to_string(),
                valid: self.valid_formats(),
            }),
        }
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new(ProfileSet::default())
    }
}
