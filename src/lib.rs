//! # audx Library
//!
//! Modulo principale della libreria: conversione batch di file audio
//! tramite ffmpeg/ffprobe.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi principali tramite re-exports per `main.rs` e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione, validazione e `ConversionPlan`
//! - `error`: Tipi di errore custom
//! - `formats`: Formati riconosciuti e profili dell'encoder
//! - `file_manager`: Discovery dei file sorgente
//! - `tool_resolver`: Ricerca di ffmpeg/ffprobe
//! - `command`: Esecuzione dei processi esterni con timeout
//! - `prober`: Pre-filtro "ha audio decodificabile?" con ffprobe
//! - `converter`: Costruzione della command line e invocazione di ffmpeg
//! - `orchestrator`: Loop del run e macchina a stati dei job
//! - `progress`: Statistiche, `ReportSink` e progress bar
//! - `json_output`: Eventi JSON per uso headless
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use audx::{BatchConverter, Config, ProgressBarSink, ToolPathResolver};
//!
//! let plan = Config::default().validate(&path)?;
//! let converter = BatchConverter::new(plan, &ToolPathResolver::default())?;
//! converter.run(&mut ProgressBarSink::new()).await?;
//! ```

pub mod command;
pub mod config;
pub mod converter;
pub mod error;
pub mod file_manager;
pub mod formats;
pub mod json_output;
pub mod orchestrator;
pub mod prober;
pub mod progress;
pub mod tool_resolver;

pub use config::{Config, ConversionPlan};
pub use error::ConvertError;
pub use formats::{AudioFormat, FormatRegistry, ProfileSet};
pub use json_output::{JsonConfig, JsonMessage, JsonSink};
pub use orchestrator::{BatchConverter, ConversionJob, JobOutcome, RunOutcome};
pub use progress::{ProgressBarSink, ReportSink, RunStats};
pub use tool_resolver::ToolPathResolver;
