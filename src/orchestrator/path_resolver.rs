//! # Path Resolution Module
//!
//! Centralizza il calcolo del path di destinazione: stesso parent, stesso
//! stem, estensione del formato destinazione.
//!
//! Due sorgenti con lo stesso stem ma estensioni diverse (`a.flac`, `a.FLAC`)
//! puntano alla stessa destinazione: la seconda verrà saltata perché la
//! destinazione esiste già.

use crate::formats::AudioFormat;
use std::path::{Path, PathBuf};

/// Utility per calcolare i path di output
pub struct PathResolver;

impl PathResolver {
    /// Destination for `source` when converting to `target`
    pub fn destination_path(source: &Path, target: AudioFormat) -> PathBuf {
        source.with_extension(target.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_extension_in_place() {
        assert_eq!(
            PathResolver::destination_path(Path::new("/music/album/01 - Intro.flac"), AudioFormat::Mp3),
            PathBuf::from("/music/album/01 - Intro.mp3")
        );
    }

    #[test]
    fn test_only_last_extension_is_replaced() {
        assert_eq!(
            PathResolver::destination_path(Path::new("live.2019.FLAC"), AudioFormat::Wav),
            PathBuf::from("live.2019.wav")
        );
    }

    #[test]
    fn test_is_deterministic() {
        let source = Path::new("/m/a.flac");
        assert_eq!(
            PathResolver::destination_path(source, AudioFormat::Ogg),
            PathResolver::destination_path(source, AudioFormat::Ogg)
        );
    }
}
