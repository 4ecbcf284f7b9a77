//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri del run
//! - Valida i parametri prima che qualsiasi file venga toccato
//! - Supporta caricamento configurazione da file JSON
//! - Fornisce valori di default identici a quelli della CLI
//!
//! ## Parametri di configurazione:
//! - `source_format`: formato da convertire (default: "flac")
//! - `target_format`: formato di destinazione (default: "mp3")
//! - `delete_original`: cancella la sorgente dopo una conversione riuscita (default: false)
//! - `recursive`: cerca anche nelle sottodirectory (default: true)
//! - `bitrate`: bitrate per i formati CBR (default: "320k")
//! - `profile_set`: set di profili registrati (default: extended)
//! - `timeout_secs`: limite per invocazione di ffprobe/ffmpeg (default: nessuno)
//! - `json_output`: eventi JSON invece della progress bar (default: false)
//! - `tools_dir`: directory dove cercare ffmpeg/ffprobe prima del PATH
//!
//! ## Validazione (in quest'ordine):
//! 1. la radice è una directory
//! 2. `--convert-from` è registrato
//! 3. `--convert-to` è registrato
//! 4. i due formati sono diversi
//! 5. il bitrate è nella forma `<cifre>[k|M]`
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     target_format: "wav".to_string(),
//!     ..Default::default()
//! };
//! let plan = config.validate(Path::new("/music"))?;
//! ```

use crate::error::ConvertError;
use crate::formats::{AudioFormat, FormatRegistry, ProfileSet};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Audio file format to convert from
    pub source_format: String,
    /// Audio file format to convert to
    pub target_format: String,
    /// Delete original files after successful conversion
    pub delete_original: bool,
    /// Recursively search for files in subdirectories
    pub recursive: bool,
    /// Audio bitrate for CBR encodes
    pub bitrate: String,
    /// Which format profiles are registered
    pub profile_set: ProfileSet,
    /// Per-invocation limit for ffprobe/ffmpeg; `None` or 0 disables it
    pub timeout_secs: Option<u64>,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
    /// Directory searched for ffmpeg/ffprobe before `PATH`
    pub tools_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_format: "flac".to_string(),
            target_format: "mp3".to_string(),
            delete_original: false,
            recursive: true,
            bitrate: "320k".to_string(),
            profile_set: ProfileSet::default(),
            timeout_secs: None,
            json_output: false,
            tools_dir: None,
        }
    }
}

/// Validated, immutable run parameters consumed by the engine
#[derive(Debug, Clone)]
pub struct ConversionPlan {
    pub root: PathBuf,
    pub source: AudioFormat,
    pub target: AudioFormat,
    pub registry: FormatRegistry,
    pub bitrate: String,
    pub delete_original: bool,
    pub recursive: bool,
    pub timeout: Option<Duration>,
}

impl Config {
    /// Validate configuration parameters against `root`
    pub fn validate(&self, root: &Path) -> Result<ConversionPlan, ConvertError> {
        if !root.is_dir() {
            return Err(ConvertError::InvalidRoot(root.to_path_buf()));
        }

        let registry = FormatRegistry::new(self.profile_set);
        let source = registry.resolve("--convert-from", &self.source_format)?;
        let target = registry.resolve("--convert-to", &self.target_format)?;

        if source == target {
            return Err(ConvertError::SameFormat);
        }

        if !is_valid_bitrate(&self.bitrate) {
            return Err(ConvertError::InvalidBitrate(self.bitrate.clone()));
        }

        Ok(ConversionPlan {
            root: root.to_path_buf(),
            source,
            target,
            registry,
            bitrate: self.bitrate.trim().to_string(),
            delete_original: self.delete_original,
            recursive: self.recursive,
            timeout: self.timeout_secs.filter(|&s| s > 0).map(Duration::from_secs),
        })
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }
}

/// `<digits>` optionally followed by `k` or `M` (any case), e.g. `320k`
fn is_valid_bitrate(bitrate: &str) -> bool {
    let bitrate = bitrate.trim();
    let digits = bitrate
        .strip_suffix(|c: char| matches!(c, 'k' | 'K' | 'm' | 'M'))
        .unwrap_or(bitrate);

    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && digits.parse::<u64>().map(|n| n > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.source_format, "flac");
        assert_eq!(config.target_format, "mp3");
        assert!(!config.delete_original);
        assert!(config.recursive);
        assert_eq!(config.bitrate, "320k");
        assert_eq!(config.profile_set, ProfileSet::Extended);
    }

    #[test]
    fn test_validate_ok() {
        let temp_dir = TempDir::new().unwrap();
        let plan = Config::default().validate(temp_dir.path()).unwrap();
        assert_eq!(plan.source, AudioFormat::Flac);
        assert_eq!(plan.target, AudioFormat::Mp3);
        assert_eq!(plan.bitrate, "320k");
        assert!(plan.timeout.is_none());
    }

    #[test]
    fn test_invalid_root() {
        let temp_dir = TempDir::new().unwrap();
        let err = Config::default()
            .validate(&temp_dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidRoot(_)));
    }

    #[test]
    fn test_unknown_formats_name_the_option() {
        let temp_dir = TempDir::new().unwrap();

        let config = Config {
            source_format: "opus".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(temp_dir.path()),
            Err(ConvertError::UnknownFormat { option: "--convert-from", .. })
        ));

        let config = Config {
            target_format: "opus".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(temp_dir.path()),
            Err(ConvertError::UnknownFormat { option: "--convert-to", .. })
        ));
    }

    #[test]
    fn test_profile_set_restricts_formats() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            target_format: "ogg".to_string(),
            profile_set: ProfileSet::Minimal,
            ..Default::default()
        };
        assert!(config.validate(temp_dir.path()).is_err());

        let config = Config {
            target_format: "ogg".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(temp_dir.path()).unwrap().target, AudioFormat::Ogg);
    }

    #[test]
    fn test_same_format_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            source_format: "mp3".to_string(),
            target_format: "MP3".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(temp_dir.path()), Err(ConvertError::SameFormat)));
    }

    #[test]
    fn test_bitrate_validation() {
        assert!(is_valid_bitrate("320k"));
        assert!(is_valid_bitrate("192K"));
        assert!(is_valid_bitrate("1M"));
        assert!(is_valid_bitrate("128000"));
        assert!(!is_valid_bitrate(""));
        assert!(!is_valid_bitrate("k"));
        assert!(!is_valid_bitrate("0k"));
        assert!(!is_valid_bitrate("fast"));
        assert!(!is_valid_bitrate("32.5k"));
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate(temp_dir.path()).unwrap().timeout.is_none());

        let config = Config {
            timeout_secs: Some(30),
            ..Default::default()
        };
        assert_eq!(
            config.validate(temp_dir.path()).unwrap().timeout,
            Some(Duration::from_secs(30))
        );
    }

    #[tokio::test]
    async fn test_config_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("audx.json");
        tokio::fs::write(&config_path, r#"{"target_format": "wav", "delete_original": true}"#)
            .await
            .unwrap();

        let config = Config::from_file(&config_path).await.unwrap();
        assert_eq!(config.target_format, "wav");
        assert!(config.delete_original);
        assert_eq!(config.source_format, "flac");
        assert_eq!(config.bitrate, "320k");
    }

    #[tokio::test]
    async fn test_config_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::from_file(&temp_dir.path().join("nope.json")).await.is_err());
    }
}
