//! # Converter Module
//!
//! Questo modulo gestisce la conversione di un singolo file con FFmpeg.
//!
//! ## Responsabilità:
//! - Costruisce l'invocazione dell'encoder a partire dal profilo del formato
//! - Crea la directory padre della destinazione (anche intermedie)
//! - Garantisce che un encode fallito non lasci file di destinazione parziali
//!
//! ## Argomenti sempre presenti:
//! - banner e verbosità soppressi, sovrascrittura abilitata (`-y`)
//! - mappa esattamente il primo stream audio (`0:a:0`)
//! - copia metadata e capitoli del primo input (`-map_metadata 0`, `-map_chapters 0`)
//!
//! ## Argomenti per profilo:
//! - codec (`-c:a`), regola bitrate (`-b:a` / `-q:a` / nessuna), flag extra
//! - cover art: mappa opzionale del primo stream video (`0:v?`) copiato senza
//!   ricodifica; la sua assenza non fa fallire il job
//!
//! ## Esempio:
//! ```rust,ignore
//! let converter = Converter::new(FfmpegEncoder::new(ffmpeg, None), &registry, AudioFormat::Mp3)?;
//! let status = converter.convert(&src, &dst, "320k").await?;
//! ```

use crate::command::run_command;
use crate::error::ConvertError;
use crate::file_manager::FileManager;
use crate::formats::{AudioFormat, BitrateRule, EncoderProfile, FormatRegistry};
use crate::tool_resolver::FFMPEG;
use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// A `-map` argument, optionally tolerant of the stream being absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSelector {
    pub input: usize,
    /// Stream specifier such as `a:0` or `v`
    pub stream: String,
    /// Append `?` so a missing stream does not fail the encode
    pub optional: bool,
}

impl StreamSelector {
    pub fn required(input: usize, stream: &str) -> Self {
        Self {
            input,
            stream: stream.to_string(),
            optional: false,
        }
    }

    pub fn optional(input: usize, stream: &str) -> Self {
        Self {
            input,
            stream: stream.to_string(),
            optional: true,
        }
    }
}

impl fmt::Display for StreamSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.input, self.stream, if self.optional { "?" } else { "" })
    }
}

/// Builder for a single ffmpeg invocation
#[derive(Debug, Clone)]
pub struct EncoderCommand {
    input: PathBuf,
    output: PathBuf,
    maps: Vec<StreamSelector>,
    metadata_from: Option<usize>,
    codec_args: Vec<String>,
}

impl EncoderCommand {
    pub fn new(input: &Path, output: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            maps: Vec::new(),
            metadata_from: None,
            codec_args: Vec::new(),
        }
    }

    /// Build the invocation for `profile`
    pub fn for_profile(input: &Path, output: &Path, profile: &EncoderProfile, bitrate: &str) -> Self {
        let mut command = Self::new(input, output).map(StreamSelector::required(0, "a:0"));

        if profile.preserve_metadata {
            command = command.preserve_metadata_from(0);
        }
        if profile.cover_art {
            command = command.map(StreamSelector::optional(0, "v"));
        }

        command = command.arg("-c:a").arg(profile.codec);
        match profile.bitrate {
            BitrateRule::Constant => command = command.arg("-b:a").arg(bitrate),
            BitrateRule::Quality(q) => command = command.arg("-q:a").arg(q),
            BitrateRule::None => {}
        }
        for extra in profile.extra_args {
            command = command.arg(*extra);
        }
        if profile.cover_art {
            command = command.arg("-c:v").arg("copy");
        }

        command
    }

    pub fn map(mut self, selector: StreamSelector) -> Self {
        self.maps.push(selector);
        self
    }

    /// Copy container metadata and chapters from input `index`
    pub fn preserve_metadata_from(mut self, index: usize) -> Self {
        self.metadata_from = Some(index);
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.codec_args.push(arg.into());
        self
    }

    /// Full argument list, without the program name
    ///
    /// Input and output paths are passed through as-is, including names that
    /// are not UTF-8.
    pub fn build(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            self.input.clone().into_os_string(),
        ];

        for selector in &self.maps {
            args.push("-map".into());
            args.push(selector.to_string().into());
        }

        if let Some(index) = self.metadata_from {
            for flag in ["-map_metadata", "-map_chapters"] {
                args.push(flag.into());
                args.push(index.to_string().into());
            }
        }

        args.extend(self.codec_args.iter().map(OsString::from));
        args.push(self.output.clone().into_os_string());
        args
    }
}

/// Runs one encode; no cleanup responsibilities
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Non-zero exit maps to `ConvertError::Encoder`, a spawn failure to `ConvertError::Io`
    async fn encode(
        &self,
        source: &Path,
        destination: &Path,
        profile: &EncoderProfile,
        bitrate: &str,
    ) -> Result<(), ConvertError>;
}

/// ffmpeg-backed encoder
pub struct FfmpegEncoder {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegEncoder {
    pub fn new(program: PathBuf, timeout: Option<Duration>) -> Self {
        Self { program, timeout }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(
        &self,
        source: &Path,
        destination: &Path,
        profile: &EncoderProfile,
        bitrate: &str,
    ) -> Result<(), ConvertError> {
        let args = EncoderCommand::for_profile(source, destination, profile, bitrate).build();

        let mut cmd = Command::new(&self.program);
        cmd.args(&args);

        let output = run_command(&mut cmd, FFMPEG, self.timeout).await?;
        if !output.status.success() {
            return Err(ConvertError::Encoder {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// Result of a single conversion attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStatus {
    Converted,
    Failed {
        reason: String,
        /// A partial destination file existed and was deleted
        removed_partial: bool,
    },
}

/// Converts source files to one target format with failure cleanup
pub struct Converter<E: Encoder> {
    encoder: E,
    target: AudioFormat,
    profile: EncoderProfile,
}

impl<E: Encoder> Converter<E> {
    /// Bind the encoder to a target; an unregistered target is a configuration error
    pub fn new(encoder: E, registry: &FormatRegistry, target: AudioFormat) -> Result<Self, ConvertError> {
        let profile = registry
            .get(target)
            .cloned()
            .ok_or_else(|| ConvertError::UnknownFormat {
                option: "--convert-to",
                value: target.to_string(),
                valid: registry.valid_formats(),
            })?;

        Ok(Self {
            encoder,
            target,
            profile,
        })
    }

    pub fn target(&self) -> AudioFormat {
        self.target
    }

    pub fn profile(&self) -> &EncoderProfile {
        &self.profile
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Convert `source` into `destination`
    ///
    /// Encoder failures come back as `ConversionStatus::Failed` after any
    /// partial destination has been removed. `Err` means the environment is
    /// broken (parent directory cannot be created, encoder cannot be spawned).
    pub async fn convert(
        &self,
        source: &Path,
        destination: &Path,
        bitrate: &str,
    ) -> Result<ConversionStatus, ConvertError> {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        debug!(
            "Converting {} -> {} ({})",
            source.display(),
            destination.display(),
            self.profile.codec
        );

        match self.encoder.encode(source, destination, &self.profile, bitrate).await {
            Ok(()) => Ok(ConversionStatus::Converted),
            Err(e) => {
                let removed_partial = match FileManager::remove_if_exists(destination).await {
                    Ok(removed) => removed,
                    Err(cleanup) => {
                        warn!(
                            "Failed to remove partial output {}: {}",
                            destination.display(),
                            cleanup
                        );
                        false
                    }
                };
                if removed_partial {
                    debug!("Removed partial output {}", destination.display());
                }

                if e.is_fatal() {
                    return Err(e);
                }
                Ok(ConversionStatus::Failed {
                    reason: e.to_string(),
                    removed_partial,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ProfileSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn args_for(target: AudioFormat) -> Vec<String> {
        let registry = FormatRegistry::default();
        let profile = registry.get(target).unwrap();
        EncoderCommand::for_profile(Path::new("in.flac"), Path::new("out.x"), profile, "320k")
            .build()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn window(args: &[String], flag: &str) -> Option<String> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1).cloned())
    }

    #[test]
    fn test_mp3_arguments() {
        let args = args_for(AudioFormat::Mp3);
        assert_eq!(
            args,
            vec![
                "-hide_banner", "-loglevel", "error", "-y", "-i", "in.flac",
                "-map", "0:a:0", "-map", "0:v?",
                "-map_metadata", "0", "-map_chapters", "0",
                "-c:a", "libmp3lame", "-b:a", "320k", "-id3v2_version", "3",
                "-c:v", "copy", "out.x",
            ]
        );
    }

    #[test]
    fn test_flac_has_no_bitrate() {
        let args = args_for(AudioFormat::Flac);
        assert_eq!(window(&args, "-c:a").as_deref(), Some("flac"));
        assert!(!args.contains(&"-b:a".to_string()));
        assert!(!args.contains(&"0:v?".to_string()));
        assert_eq!(window(&args, "-map_metadata").as_deref(), Some("0"));
        assert_eq!(window(&args, "-map_chapters").as_deref(), Some("0"));
    }

    #[test]
    fn test_wav_is_16bit_pcm() {
        let args = args_for(AudioFormat::Wav);
        assert_eq!(window(&args, "-c:a").as_deref(), Some("pcm_s16le"));
        assert!(!args.contains(&"-b:a".to_string()));
    }

    #[test]
    fn test_ogg_uses_quality() {
        let args = args_for(AudioFormat::Ogg);
        assert_eq!(window(&args, "-c:a").as_deref(), Some("libvorbis"));
        assert_eq!(window(&args, "-q:a").as_deref(), Some("6"));
        assert!(!args.contains(&"320k".to_string()));
    }

    #[test]
    fn test_stream_selector_display() {
        assert_eq!(StreamSelector::required(0, "a:0").to_string(), "0:a:0");
        assert_eq!(StreamSelector::optional(0, "v").to_string(), "0:v?");
    }

    #[test]
    fn test_unregistered_target_is_configuration_error() {
        let registry = FormatRegistry::new(ProfileSet::Minimal);
        let result = Converter::new(FakeEncoder::succeeding(), &registry, AudioFormat::Ogg);
        assert!(matches!(result, Err(ConvertError::UnknownFormat { option: "--convert-to", .. })));
    }

    /// Writes the destination, then optionally fails
    struct FakeEncoder {
        fail: bool,
        calls: Mutex<Vec<(PathBuf, PathBuf, String)>>,
    }

    impl FakeEncoder {
        fn succeeding() -> Self {
            Self { fail: false, calls: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { fail: true, calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Encoder for FakeEncoder {
        async fn encode(
            &self,
            source: &Path,
            destination: &Path,
            _profile: &EncoderProfile,
            bitrate: &str,
        ) -> Result<(), ConvertError> {
            self.calls.lock().unwrap().push((
                source.to_path_buf(),
                destination.to_path_buf(),
                bitrate.to_string(),
            ));
            tokio::fs::write(destination, b"partial").await?;
            if self.fail {
                return Err(ConvertError::Encoder { code: Some(1), stderr: "boom".into() });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("a/b/c/out.mp3");
        let converter =
            Converter::new(FakeEncoder::succeeding(), &FormatRegistry::default(), AudioFormat::Mp3).unwrap();

        let status = converter
            .convert(Path::new("in.flac"), &destination, "192k")
            .await
            .unwrap();
        assert_eq!(status, ConversionStatus::Converted);
        assert!(destination.exists());
        assert_eq!(converter.encoder.calls.lock().unwrap()[0].2, "192k");
    }

    #[tokio::test]
    async fn test_failure_removes_partial_output() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("out.mp3");
        let converter =
            Converter::new(FakeEncoder::failing(), &FormatRegistry::default(), AudioFormat::Mp3).unwrap();

        let status = converter
            .convert(Path::new("in.flac"), &destination, "320k")
            .await
            .unwrap();
        match status {
            ConversionStatus::Failed { removed_partial, .. } => assert!(removed_partial),
            other => panic!("unexpected status: {:?}", other),
        }
        assert!(!destination.exists());
    }

    #[cfg(unix)]
    mod subprocess {
        use super::super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        /// Fake ffmpeg: writes something to its last argument, then exits with `code`
        fn fake_ffmpeg(dir: &Path, code: i32) -> PathBuf {
            let path = dir.join("ffmpeg");
            let script = format!(
                "#!/bin/sh\nfor last; do :; done\necho partial > \"$last\"\necho 'encode error' >&2\nexit {}\n",
                code
            );
            fs::write(&path, script).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_ffmpeg_success() {
            let temp_dir = TempDir::new().unwrap();
            let encoder = FfmpegEncoder::new(fake_ffmpeg(temp_dir.path(), 0), None);
            let converter = Converter::new(encoder, &FormatRegistry::default(), AudioFormat::Wav).unwrap();
            let destination = temp_dir.path().join("out/song.wav");

            let status = converter
                .convert(Path::new("song.flac"), &destination, "320k")
                .await
                .unwrap();
            assert_eq!(status, ConversionStatus::Converted);
            assert!(destination.exists());
        }

        #[tokio::test]
        async fn test_ffmpeg_failure_cleans_up() {
            let temp_dir = TempDir::new().unwrap();
            let encoder = FfmpegEncoder::new(fake_ffmpeg(temp_dir.path(), 1), None);
            let converter = Converter::new(encoder, &FormatRegistry::default(), AudioFormat::Mp3).unwrap();
            let destination = temp_dir.path().join("song.mp3");

            let status = converter
                .convert(Path::new("song.flac"), &destination, "320k")
                .await
                .unwrap();
            match status {
                ConversionStatus::Failed { reason, removed_partial } => {
                    assert!(removed_partial);
                    assert!(reason.contains("encode error"));
                }
                other => panic!("unexpected status: {:?}", other),
            }
            assert!(!destination.exists());
        }

        #[cfg(target_os = "linux")]
        #[tokio::test]
        async fn test_non_utf8_names_reach_ffmpeg_unchanged() {
            use std::ffi::OsStr;
            use std::os::unix::ffi::OsStrExt;

            let temp_dir = TempDir::new().unwrap();
            let encoder = FfmpegEncoder::new(fake_ffmpeg(temp_dir.path(), 0), None);
            let converter = Converter::new(encoder, &FormatRegistry::default(), AudioFormat::Mp3).unwrap();
            let source = temp_dir.path().join(OsStr::from_bytes(b"caf\xe9.flac"));
            let destination = temp_dir.path().join(OsStr::from_bytes(b"caf\xe9.mp3"));
            fs::write(&source, b"flac").unwrap();

            let status = converter.convert(&source, &destination, "320k").await.unwrap();

            assert_eq!(status, ConversionStatus::Converted);
            assert!(destination.exists());
            assert!(!temp_dir.path().join("caf\u{FFFD}.mp3").exists());
        }

        #[test]
        fn test_build_keeps_raw_path_bytes() {
            use std::ffi::OsStr;
            use std::os::unix::ffi::OsStrExt;

            let input = Path::new(OsStr::from_bytes(b"/m/caf\xe9.flac"));
            let output = Path::new(OsStr::from_bytes(b"/m/caf\xe9.mp3"));
            let profile = FormatRegistry::default().get(AudioFormat::Mp3).unwrap().clone();

            let args = EncoderCommand::for_profile(input, output, &profile, "320k").build();

            assert_eq!(args[5].as_os_str(), input.as_os_str());
            assert_eq!(args.last().unwrap().as_os_str(), output.as_os_str());
        }

        #[tokio::test]
        async fn test_encode_timeout_is_failed_conversion_without_output() {
            let temp_dir = TempDir::new().unwrap();
            let program = temp_dir.path().join("ffmpeg");
            fs::write(
                &program,
                "#!/bin/sh\nfor last; do :; done\necho partial > \"$last\"\nexec sleep 5\n",
            )
            .unwrap();
            fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

            let encoder = FfmpegEncoder::new(program, Some(Duration::from_millis(300)));
            let converter = Converter::new(encoder, &FormatRegistry::default(), AudioFormat::Mp3).unwrap();
            let destination = temp_dir.path().join("song.mp3");

            let status = converter
                .convert(Path::new("song.flac"), &destination, "320k")
                .await
                .unwrap();

            match status {
                ConversionStatus::Failed { reason, .. } => assert!(reason.contains("timed out")),
                other => panic!("unexpected status: {:?}", other),
            }
            assert!(!destination.exists());
        }

        #[tokio::test]
        async fn test_missing_ffmpeg_is_fatal() {
            let temp_dir = TempDir::new().unwrap();
            let encoder = FfmpegEncoder::new(PathBuf::from("/nonexistent/ffmpeg"), None);
            let converter = Converter::new(encoder, &FormatRegistry::default(), AudioFormat::Mp3).unwrap();

            let result = converter
                .convert(Path::new("song.flac"), &temp_dir.path().join("song.mp3"), "320k")
                .await;
            assert!(result.is_err());
        }
    }
}
