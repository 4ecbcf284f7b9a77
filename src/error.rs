//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `ConvertError` enum per categorizzare gli errori fatali
//! - Fornisce messaggi di errore che nominano l'opzione CLI responsabile
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `InvalidRoot`: la directory radice non esiste o non è una directory
//! - `UnknownFormat`: identificatore di formato non registrato
//! - `SameFormat`: formato sorgente uguale al formato destinazione
//! - `InvalidBitrate`: bitrate non nel formato `<cifre>[k|M]`
//! - `MissingDependency`: tool esterno mancante (ffmpeg, ffprobe)
//! - `Encoder` / `Timeout`: fallimento di una singola invocazione esterna
//! - `Io`: errori di I/O (creazione directory, spawn dei processi)
//!
//! ## Nota:
//! Gli errori per singolo file (`Encoder`, `Timeout`) non escono mai dal
//! job: vengono convertiti in `JobOutcome` e contati nelle statistiche.
//! Solo gli errori di configurazione e d'ambiente terminano il run.

use std::path::PathBuf;

/// Custom error types for batch conversion
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for 'PATH': Provided path '{}' is not a directory.", .0.display())]
    InvalidRoot(PathBuf),

    #[error("Invalid value for '{option}': {value}.\nValid formats: {valid}.")]
    UnknownFormat {
        option: &'static str,
        value: String,
        valid: String,
    },

    #[error("convert-from and convert-to must be different.")]
    SameFormat,

    #[error("Invalid value for '--bitrate': {0} (expected e.g. 320k)")]
    InvalidBitrate(String),

    #[error("{0}")]
    MissingDependency(String),

    #[error("Encoder exited with status {code:?}: {stderr}")]
    Encoder { code: Option<i32>, stderr: String },

    #[error("{tool} timed out after {secs}s")]
    Timeout { tool: &'static str, secs: u64 },
}

impl ConvertError {
    /// Whether this error must abort the whole run rather than a single job.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Encoder { .. } | Self::Timeout { .. })
    }
}
