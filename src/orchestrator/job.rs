//! # Conversion Job
//!
//! Unità di lavoro: un file sorgente e il suo percorso attraverso la
//! macchina a stati (`pending` → uno stato terminale, mai rivisitato).

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Terminal (or pending) state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Pending,
    /// Destination already existed; prober and encoder were not invoked
    SkippedExists,
    /// Prober found no decodable audio packet
    RejectedUndecodable,
    /// Destination written (and source deleted, if requested)
    Converted,
    /// Encoder failed; no destination left behind
    FailedConversion,
    /// Converted, but the source could not be deleted
    FailedDelete,
}

impl JobOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Short tag used in progress messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::SkippedExists => "SKIP",
            Self::RejectedUndecodable => "REJECTED",
            Self::Converted => "OK",
            Self::FailedConversion => "ERROR",
            Self::FailedDelete => "DELETE FAILED",
        }
    }
}

/// One discovered source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Position in discovery order, starting at 0
    pub index: usize,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: JobOutcome,
    /// Failure reason, when there is one
    pub detail: Option<String>,
}

impl ConversionJob {
    pub fn new(index: usize, source: PathBuf, destination: PathBuf) -> Self {
        Self {
            index,
            source,
            destination,
            outcome: JobOutcome::Pending,
            detail: None,
        }
    }

    /// Move the job to its terminal state
    ///
    /// A job reaches exactly one terminal state; finishing twice is a bug.
    pub fn finish(&mut self, outcome: JobOutcome, detail: Option<String>) {
        debug_assert!(!self.outcome.is_terminal(), "job {} finished twice", self.index);
        debug_assert!(outcome.is_terminal());
        self.outcome = outcome;
        self.detail = detail;
    }

    pub fn file_name(&self) -> String {
        display_name(&self.source)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_pending() {
        let job = ConversionJob::new(0, PathBuf::from("/m/a.flac"), PathBuf::from("/m/a.mp3"));
        assert_eq!(job.outcome, JobOutcome::Pending);
        assert!(!job.outcome.is_terminal());
        assert_eq!(job.file_name(), "a.flac");
    }

    #[test]
    fn test_finish() {
        let mut job = ConversionJob::new(3, PathBuf::from("a.flac"), PathBuf::from("a.mp3"));
        job.finish(JobOutcome::FailedConversion, Some("exit 1".into()));
        assert_eq!(job.outcome, JobOutcome::FailedConversion);
        assert_eq!(job.detail.as_deref(), Some("exit 1"));
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&JobOutcome::RejectedUndecodable).unwrap();
        assert_eq!(json, "\"rejected_undecodable\"");
    }
}
