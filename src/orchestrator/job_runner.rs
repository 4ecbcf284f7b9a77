//! # Job Runner Module
//!
//! Esegue la macchina a stati di un singolo job.
//! Separato dall'orchestratore principale per maggiore modularità.
//!
//! ```text
//! pending
//!   → skipped_exists        destinazione già presente (niente probe, niente encode)
//!   → rejected_undecodable  il prober risponde false
//!   → failed_conversion     l'encoder fallisce (output parziale rimosso)
//!   → converted             encode riuscito
//!       → failed_delete     cancellazione della sorgente fallita
//! ```

use crate::converter::{ConversionStatus, Converter, Encoder};
use crate::error::ConvertError;
use crate::orchestrator::job::{ConversionJob, JobOutcome};
use crate::prober::Prober;
use tracing::{debug, info};

/// Drives one job at a time to its terminal state
pub struct JobRunner<P: Prober, E: Encoder> {
    prober: P,
    converter: Converter<E>,
    bitrate: String,
    delete_original: bool,
}

impl<P: Prober, E: Encoder> JobRunner<P, E> {
    pub fn new(prober: P, converter: Converter<E>, bitrate: String, delete_original: bool) -> Self {
        Self {
            prober,
            converter,
            bitrate,
            delete_original,
        }
    }

    pub fn converter(&self) -> &Converter<E> {
        &self.converter
    }

    /// Move `job` from `pending` to a terminal state
    ///
    /// Per-file failures end up in `job.outcome`; `Err` only for failures
    /// that must stop the whole run.
    pub async fn process(&self, job: &mut ConversionJob) -> Result<(), ConvertError> {
        // Any directory entry counts, including a dangling symlink
        if tokio::fs::symlink_metadata(&job.destination).await.is_ok() {
            debug!(
                "[SKIP] Destination already exists: {} -> {}",
                job.source.display(),
                job.destination.display()
            );
            job.finish(JobOutcome::SkippedExists, None);
            return Ok(());
        }

        if !self.prober.has_decodable_audio(&job.source).await? {
            info!("[REJECTED] No decodable audio stream: {}", job.source.display());
            job.finish(
                JobOutcome::RejectedUndecodable,
                Some("no decodable audio stream".to_string()),
            );
            return Ok(());
        }

        match self
            .converter
            .convert(&job.source, &job.destination, &self.bitrate)
            .await?
        {
            ConversionStatus::Failed { reason, .. } => {
                info!("[ERROR] Conversion failed for {}: {}", job.source.display(), reason);
                job.finish(JobOutcome::FailedConversion, Some(reason));
            }
            ConversionStatus::Converted => {
                debug!("[OK] {} -> {}", job.source.display(), job.destination.display());
                self.finish_converted(job).await;
            }
        }

        Ok(())
    }

    /// Apply the delete-original overlay to a converted job
    async fn finish_converted(&self, job: &mut ConversionJob) {
        if !self.delete_original {
            job.finish(JobOutcome::Converted, None);
            return;
        }

        match tokio::fs::remove_file(&job.source).await {
            Ok(()) => {
                debug!("Deleted original {}", job.source.display());
                job.finish(JobOutcome::Converted, None);
            }
            Err(e) => {
                info!("[DELETE FAILED] Could not delete {}: {}", job.source.display(), e);
                job.finish(
                    JobOutcome::FailedDelete,
                    Some(format!("failed to delete original: {}", e)),
                );
            }
        }
    }
}
