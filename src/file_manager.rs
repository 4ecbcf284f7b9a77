//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei file sorgente e le operazioni
//! sui file di destinazione.
//!
//! ## Responsabilità:
//! - Discovery (ricorsiva o solo figli diretti) dei file con l'estensione sorgente
//! - Confronto estensioni case-insensitive (`Song.FLAC` è un file `flac`)
//! - Rimozione di output parziali lasciati da un encoder fallito
//!
//! ## Ordine:
//! L'ordine restituito è quello dell'enumerazione del filesystem fatta da
//! `walkdir`; non viene riordinato e fissa l'ordine di elaborazione del run.
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::find_source_files(root, AudioFormat::Flac, true)?;
//! ```

use crate::error::ConvertError;
use crate::formats::AudioFormat;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Find all files under `root` whose lowercased name ends in `.<format>`
    ///
    /// With `recursive == false` only direct children of `root` are returned.
    /// An empty result is not an error.
    pub fn find_source_files(
        root: &Path,
        format: AudioFormat,
        recursive: bool,
    ) -> Result<Vec<PathBuf>, ConvertError> {
        if !root.is_dir() {
            return Err(ConvertError::InvalidRoot(root.to_path_buf()));
        }

        let mut walker = WalkDir::new(root).min_depth(1);
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error reading directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            // Symlinks are not followed for descent but a link to a regular file counts
            if !path.is_file() {
                continue;
            }

            if Self::has_format_extension(path, format) {
                files.push(path.to_path_buf());
            }
        }

        debug!("Discovered {} .{} files under {}", files.len(), format, root.display());
        Ok(files)
    }

    /// Check whether a file name ends with `.<format>`, ignoring case
    pub fn has_format_extension(path: &Path, format: AudioFormat) -> bool {
        match path.file_name() {
            Some(name) => name
                .to_string_lossy()
                .to_lowercase()
                .ends_with(&format!(".{}", format.extension())),
            None => false,
        }
    }

    /// Remove a file if present; a missing file is not an error
    ///
    /// Returns whether something was actually removed.
    pub async fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
