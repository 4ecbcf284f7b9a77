//! # Batch Converter Orchestrator
//!
//! Orchestratore principale del run, strettamente sequenziale.
//!
//! ## Flusso di esecuzione:
//! 1. **Dependency check**: ffmpeg e ffprobe devono essere risolvibili (in `new`)
//! 2. **File discovery**: trova i file sorgente e fissa l'ordine del run
//! 3. **Short-circuit**: nessun file → `RunOutcome::NoFiles`, il sink non viene toccato
//! 4. **Processing**: un job alla volta, nell'ordine di discovery
//! 5. **Progress tracking**: uno snapshot al sink dopo ogni job
//! 6. **Reporting**: statistiche finali
//!
//! ## Error handling:
//! - Errori per singoli file diventano esiti e contatori, il run continua
//! - Solo errori d'ambiente (spawn fallito, directory non creabile) interrompono il run

use crate::config::ConversionPlan;
use crate::converter::{Converter, Encoder, FfmpegEncoder};
use crate::error::ConvertError;
use crate::file_manager::FileManager;
use crate::orchestrator::job::ConversionJob;
use crate::orchestrator::job_runner::JobRunner;
use crate::orchestrator::path_resolver::PathResolver;
use crate::orchestrator::progress_tracker::ProgressTracker;
use crate::prober::{FfprobeProber, Prober};
use crate::progress::{ReportSink, RunStats};
use crate::tool_resolver::ToolPathResolver;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Discovery found no source files; nothing was started
    NoFiles,
    Completed { stats: RunStats, elapsed: Duration },
}

/// Orchestratore principale
pub struct BatchConverter<P: Prober, E: Encoder> {
    plan: ConversionPlan,
    runner: JobRunner<P, E>,
}

impl BatchConverter<FfprobeProber, FfmpegEncoder> {
    /// Resolve ffmpeg/ffprobe and build the production pipeline
    pub fn new(plan: ConversionPlan, tools: &ToolPathResolver) -> Result<Self, ConvertError> {
        let resolved = tools.verify_tools()?;
        info!(
            "Using ffmpeg at {} and ffprobe at {}",
            resolved.ffmpeg.display(),
            resolved.ffprobe.display()
        );

        let prober = FfprobeProber::new(resolved.ffprobe, plan.timeout);
        let encoder = FfmpegEncoder::new(resolved.ffmpeg, plan.timeout);
        Self::with_components(plan, prober, encoder)
    }
}

impl<P: Prober, E: Encoder> BatchConverter<P, E> {
    /// Build an orchestrator around any prober/encoder pair
    pub fn with_components(plan: ConversionPlan, prober: P, encoder: E) -> Result<Self, ConvertError> {
        let converter = Converter::new(encoder, &plan.registry, plan.target)?;
        let runner = JobRunner::new(prober, converter, plan.bitrate.clone(), plan.delete_original);
        Ok(Self { plan, runner })
    }

    pub fn plan(&self) -> &ConversionPlan {
        &self.plan
    }

    /// Find the source files for this run, in processing order
    pub fn discover(&self) -> Result<Vec<PathBuf>, ConvertError> {
        FileManager::find_source_files(&self.plan.root, self.plan.source, self.plan.recursive)
    }

    /// Discover and convert everything, reporting to `sink`
    pub async fn run(&self, sink: &mut dyn ReportSink) -> Result<RunOutcome, ConvertError> {
        let start_time = Instant::now();
        self.log_configuration();

        let files = self.discover()?;
        info!("Found {} .{} files to process", files.len(), self.plan.source);

        if files.is_empty() {
            return Ok(RunOutcome::NoFiles);
        }

        let stats = self.process_files(files, sink, start_time).await?;
        info!("=== Conversion Complete ===");
        info!("{}", stats.format_summary());
        info!("{}", stats.format_breakdown());

        Ok(RunOutcome::Completed {
            stats,
            elapsed: start_time.elapsed(),
        })
    }

    /// Process files strictly one after the other
    async fn process_files(
        &self,
        files: Vec<PathBuf>,
        sink: &mut dyn ReportSink,
        start_time: Instant,
    ) -> Result<RunStats, ConvertError> {
        let mut tracker = ProgressTracker::start(files.len(), sink);

        for (index, source) in files.into_iter().enumerate() {
            let destination = PathResolver::destination_path(&source, self.plan.target);
            let mut job = ConversionJob::new(index, source, destination);
            tracker.job_started(&job);

            if let Err(e) = self.runner.process(&mut job).await {
                error!("Aborting run while processing {}: {}", job.source.display(), e);
                let stats = tracker.abort(&e);
                debug!("Stopped after {} of {} files", stats.processed, stats.total);
                return Err(e);
            }

            debug!("Job {} finished as {:?}", index, job.outcome);
            tracker.job_finished(&job);
        }

        Ok(tracker.finish(start_time.elapsed()))
    }

    fn log_configuration(&self) {
        info!("Starting conversion in: {}", self.plan.root.display());
        info!(
            "Mode: .{} -> .{} ({}{})",
            self.plan.source,
            self.runner.converter().target(),
            self.runner.converter().profile().codec,
            if self.plan.recursive { ", recursive" } else { "" }
        );
        if self.plan.delete_original {
            info!("Originals will be deleted after successful conversion");
        }
        if let Some(timeout) = self.plan.timeout {
            info!("Per-invocation timeout: {}s", timeout.as_secs());
        }
    }
}
