//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce le statistiche del run e la loro presentazione.
//!
//! ## Responsabilità:
//! - `RunStats`: contatori monotoni (converted, failed, skipped) del run
//! - `ReportSink`: interfaccia ad eventi consumata dall'orchestratore
//! - `ProgressManager` / `ProgressBarSink`: progress bar live con `indicatif`
//!
//! ## Conteggi:
//! - **skipped**: destinazione già esistente
//! - **failed**: file non decodificabili, encode falliti, cancellazioni fallite
//! - **converted**: encode riusciti (anche se la cancellazione poi fallisce)
//!
//! Un job con cancellazione fallita conta sia in `converted` che in `failed`.
//!
//! ## Visual feedback:
//! ```text
//! Converting [████████████░░░░░░░░░░░░░░░░░░] 12/30 • Converted: 10 • Failed: 1 • Skipped: 1 • track12.flac
//! ```

use crate::error::ConvertError;
use crate::orchestrator::job::{ConversionJob, JobOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Counters for one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Fixed at discovery time
    pub total: usize,
    /// Jobs that reached a terminal state
    pub processed: usize,
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Breakdown of `failed`
    pub rejected: usize,
    pub conversion_failures: usize,
    pub delete_failures: usize,
}

impl RunStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Account for one finished job
    pub fn record(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Pending => return,
            JobOutcome::SkippedExists => self.skipped += 1,
            JobOutcome::RejectedUndecodable => {
                self.failed += 1;
                self.rejected += 1;
            }
            JobOutcome::Converted => self.converted += 1,
            JobOutcome::FailedConversion => {
                self.failed += 1;
                self.conversion_failures += 1;
            }
            JobOutcome::FailedDelete => {
                self.converted += 1;
                self.failed += 1;
                self.delete_failures += 1;
            }
        }
        self.processed += 1;
    }

    /// Every processed job lands in exactly one of these buckets
    pub fn exclusive_outcomes(&self) -> usize {
        self.converted + self.rejected + self.skipped + self.conversion_failures
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Found: {} | Converted: {} | Failed: {} | Skipped: {}",
            self.total, self.converted, self.failed, self.skipped
        )
    }

    pub fn format_breakdown(&self) -> String {
        format!(
            "Undecodable: {} | Encoder failures: {} | Delete failures: {}",
            self.rejected, self.conversion_failures, self.delete_failures
        )
    }
}

/// Consumer of run events
///
/// The orchestrator calls these in order: `on_run_start` once, then
/// `on_job_start`/`on_job_complete` per job, then `on_run_complete`. None of
/// them is called when discovery finds nothing.
pub trait ReportSink {
    fn on_run_start(&mut self, _total: usize) {}

    fn on_job_start(&mut self, _job: &ConversionJob, _stats: &RunStats) {}

    /// `stats` already include this job
    fn on_job_complete(&mut self, job: &ConversionJob, stats: &RunStats);

    fn on_run_complete(&mut self, _stats: &RunStats, _elapsed: Duration) {}

    /// A fatal error stopped the run before every job finished
    fn on_run_aborted(&mut self, _stats: &RunStats, _error: &ConvertError) {}
}

/// Manages the live progress bar
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.bold.blue} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Refresh counters and current file without advancing
    pub fn set_status(&self, stats: &RunStats, current: &str) {
        self.bar.set_message(Self::status_line(stats, current));
    }

    /// Advance by one finished file
    pub fn advance(&self, stats: &RunStats, current: &str) {
        self.bar.inc(1);
        self.set_status(stats, current);
    }

    /// Finish with the final counters
    pub fn finish(&self, stats: &RunStats) {
        self.bar.set_prefix("Completed");
        self.bar.finish_with_message(Self::status_line(stats, ""));
    }

    /// Leave the bar where it stopped
    pub fn abandon(&self, stats: &RunStats) {
        self.bar.set_prefix("Aborted");
        self.bar.abandon_with_message(Self::status_line(stats, ""));
    }

    fn status_line(stats: &RunStats, current: &str) -> String {
        let mut line = format!(
            "• Converted: {} • Failed: {} • Skipped: {}",
            stats.converted, stats.failed, stats.skipped
        );
        if !current.is_empty() {
            line.push_str(" • ");
            line.push_str(current);
        }
        line
    }
}

/// Live terminal display
///
/// The bar is created on `on_run_start`, so nothing is drawn for an empty run.
#[derive(Default)]
pub struct ProgressBarSink {
    progress: Option<ProgressManager>,
}

impl ProgressBarSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for ProgressBarSink {
    fn on_run_start(&mut self, total: usize) {
        self.progress = Some(ProgressManager::new(total as u64));
    }

    fn on_job_start(&mut self, job: &ConversionJob, stats: &RunStats) {
        if let Some(ref progress) = self.progress {
            progress.set_status(stats, &job.file_name());
        }
    }

    fn on_job_complete(&mut self, job: &ConversionJob, stats: &RunStats) {
        if let Some(ref progress) = self.progress {
            let current = match job.outcome {
                JobOutcome::Converted => job.file_name(),
                other => format!("[{}] {}", other.label(), job.file_name()),
            };
            progress.advance(stats, &current);
        }
    }

    fn on_run_complete(&mut self, stats: &RunStats, _elapsed: Duration) {
        if let Some(ref progress) = self.progress {
            progress.finish(stats);
        }
    }

    fn on_run_aborted(&mut self, stats: &RunStats, _error: &ConvertError) {
        if let Some(ref progress) = self.progress {
            progress.abandon(stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let mut stats = RunStats::new(6);
        stats.record(JobOutcome::Converted);
        stats.record(JobOutcome::SkippedExists);
        stats.record(JobOutcome::RejectedUndecodable);
        stats.record(JobOutcome::FailedConversion);
        stats.record(JobOutcome::FailedDelete);

        assert_eq!(stats.processed, 5);
        assert_eq!(stats.converted, 2);
        assert_eq!(stats.failed, 3);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.conversion_failures, 1);
        assert_eq!(stats.delete_failures, 1);
        assert_eq!(stats.exclusive_outcomes(), stats.processed);
    }

    #[test]
    fn test_pending_is_not_counted() {
        let mut stats = RunStats::new(1);
        stats.record(JobOutcome::Pending);
        assert_eq!(stats, RunStats::new(1));
    }

    #[test]
    fn test_summary() {
        let mut stats = RunStats::new(3);
        stats.record(JobOutcome::Converted);
        stats.record(JobOutcome::Converted);
        stats.record(JobOutcome::SkippedExists);
        assert_eq!(
            stats.format_summary(),
            "Found: 3 | Converted: 2 | Failed: 0 | Skipped: 1"
        );
    }

    #[test]
    fn test_status_line() {
        let stats = RunStats::new(2);
        assert_eq!(
            ProgressManager::status_line(&stats, "a.flac"),
            "• Converted: 0 • Failed: 0 • Skipped: 0 • a.flac"
        );
    }
}
