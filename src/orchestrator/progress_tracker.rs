//! # Progress Tracking Module
//!
//! Possiede le `RunStats` del run e le inoltra al `ReportSink` dopo ogni
//! passo. È l'unico punto che modifica i contatori.

use crate::error::ConvertError;
use crate::orchestrator::job::ConversionJob;
use crate::progress::{ReportSink, RunStats};
use std::time::Duration;

/// Single owner of the run counters
pub struct ProgressTracker<'a> {
    stats: RunStats,
    sink: &'a mut dyn ReportSink,
}

impl<'a> ProgressTracker<'a> {
    /// Fix the total and announce the run
    pub fn start(total: usize, sink: &'a mut dyn ReportSink) -> Self {
        sink.on_run_start(total);
        Self {
            stats: RunStats::new(total),
            sink,
        }
    }

    pub fn job_started(&mut self, job: &ConversionJob) {
        self.sink.on_job_start(job, &self.stats);
    }

    /// Count a finished job and emit one snapshot
    pub fn job_finished(&mut self, job: &ConversionJob) {
        self.stats.record(job.outcome);
        self.sink.on_job_complete(job, &self.stats);
    }

    pub fn finish(self, elapsed: Duration) -> RunStats {
        self.sink.on_run_complete(&self.stats, elapsed);
        self.stats
    }

    /// The run stops early on a fatal error
    pub fn abort(self, error: &ConvertError) -> RunStats {
        self.sink.on_run_aborted(&self.stats, error);
        self.stats
    }
}
