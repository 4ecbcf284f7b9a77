//! # Orchestrator Module
//!
//! Motore del run, separato in sottomoduli:
//! - `batch_converter`: Orchestratore principale (discovery, loop sequenziale)
//! - `job_runner`: Macchina a stati di un singolo file
//! - `job`: Stato ed esito di un job
//! - `progress_tracker`: Unico proprietario dei contatori del run
//! - `path_resolver`: Calcolo del path di destinazione

pub mod batch_converter;
pub mod job;
pub mod job_runner;
pub mod path_resolver;
pub mod progress_tracker;

pub use batch_converter::{BatchConverter, RunOutcome};
pub use job::{ConversionJob, JobOutcome};
pub use job_runner::JobRunner;
pub use path_resolver::PathResolver;
pub use progress_tracker::ProgressTracker;
