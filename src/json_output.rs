//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per consumatori headless.
//!
//! ## Responsabilità:
//! - Emette un oggetto JSON per riga su stdout per ogni evento del run
//! - Implementa `ReportSink`, alternativa alla progress bar (`--json`)
//!
//! ## Tipi di messaggi:
//! - `start`: inizio del run (formati, totale file)
//! - `file_start`: inizio elaborazione di un file
//! - `file_complete`: esito di un file
//! - `progress`: snapshot dei contatori dopo ogni file
//! - `complete`: statistiche finali
//! - `no_files`: nessun file sorgente trovato
//! - `error`: errore fatale di configurazione o d'ambiente

use crate::config::Config;
use crate::error::ConvertError;
use crate::orchestrator::job::{ConversionJob, JobOutcome};
use crate::progress::{ReportSink, RunStats};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Start {
        root: PathBuf,
        total_files: usize,
        config: JsonConfig,
    },

    FileStart {
        path: PathBuf,
        index: usize,
        total: usize,
    },

    FileComplete {
        path: PathBuf,
        destination: PathBuf,
        outcome: JobOutcome,
        error: Option<String>,
    },

    Progress {
        processed: usize,
        total: usize,
        percentage: f64,
        converted: usize,
        failed: usize,
        skipped: usize,
        current: String,
    },

    Complete {
        total: usize,
        converted: usize,
        failed: usize,
        skipped: usize,
        rejected: usize,
        conversion_failures: usize,
        delete_failures: usize,
        duration_seconds: f64,
    },

    NoFiles {
        root: PathBuf,
        source_format: String,
    },

    Error {
        message: String,
    },
}

/// Configurazione per output JSON
#[derive(Debug, Clone, Serialize)]
pub struct JsonConfig {
    pub source_format: String,
    pub target_format: String,
    pub bitrate: String,
    pub delete_original: bool,
    pub recursive: bool,
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            source_format: config.source_format.clone(),
            target_format: config.target_format.clone(),
            bitrate: config.bitrate.clone(),
            delete_original: config.delete_original,
            recursive: config.recursive,
        }
    }
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Snapshot dei contatori dopo un file
    pub fn progress(stats: &RunStats, current: String) -> Self {
        let percentage = if stats.total > 0 {
            (stats.processed as f64 / stats.total as f64) * 100.0
        } else {
            0.0
        };

        Self::Progress {
            processed: stats.processed,
            total: stats.total,
            percentage,
            converted: stats.converted,
            failed: stats.failed,
            skipped: stats.skipped,
            current,
        }
    }

    pub fn complete(stats: &RunStats, elapsed: Duration) -> Self {
        Self::Complete {
            total: stats.total,
            converted: stats.converted,
            failed: stats.failed,
            skipped: stats.skipped,
            rejected: stats.rejected,
            conversion_failures: stats.conversion_failures,
            delete_failures: stats.delete_failures,
            duration_seconds: elapsed.as_secs_f64(),
        }
    }

    pub fn error(message: String) -> Self {
        Self::Error { message }
    }
}

/// Headless sink writing JSON lines to stdout
pub struct JsonSink {
    root: PathBuf,
    config: JsonConfig,
    /// Messages are collected instead of printed (tests)
    captured: Option<Vec<JsonMessage>>,
}

impl JsonSink {
    pub fn new(root: PathBuf, config: JsonConfig) -> Self {
        Self {
            root,
            config,
            captured: None,
        }
    }

    #[cfg(test)]
    fn capturing(root: PathBuf, config: JsonConfig) -> Self {
        Self {
            root,
            config,
            captured: Some(Vec::new()),
        }
    }

    fn send(&mut self, message: JsonMessage) {
        match self.captured {
            Some(ref mut messages) => messages.push(message),
            None => message.emit(),
        }
    }
}

impl ReportSink for JsonSink {
    fn on_run_start(&mut self, total: usize) {
        self.send(JsonMessage::Start {
            root: self.root.clone(),
            total_files: total,
            config: self.config.clone(),
        });
    }

    fn on_job_start(&mut self, job: &ConversionJob, stats: &RunStats) {
        self.send(JsonMessage::FileStart {
            path: job.source.clone(),
            index: job.index,
            total: stats.total,
        });
    }

    fn on_job_complete(&mut self, job: &ConversionJob, stats: &RunStats) {
        self.send(JsonMessage::FileComplete {
            path: job.source.clone(),
            destination: job.destination.clone(),
            outcome: job.outcome,
            error: job.detail.clone(),
        });
        self.send(JsonMessage::progress(stats, job.file_name()));
    }

    fn on_run_complete(&mut self, stats: &RunStats, elapsed: Duration) {
        self.send(JsonMessage::complete(stats, elapsed));
    }

    fn on_run_aborted(&mut self, _stats: &RunStats, error: &ConvertError) {
        self.send(JsonMessage::error(error.to_string()));
    }
}
