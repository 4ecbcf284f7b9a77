//! # audx - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Merge di file di configurazione e flag CLI (i flag espliciti vincono)
//! - Validazione e avvio del `BatchConverter`
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Configura il logging su stderr (`RUST_LOG` ha la precedenza)
//! 3. Costruisce la `Config` e la valida: nessun file viene toccato prima
//! 4. Verifica ffmpeg/ffprobe e avvia la conversione
//! 5. Stampa il riepilogo finale
//!
//! ## Esempio di utilizzo:
//! ```bash
//! audx ~/Music --convert-from flac --convert-to mp3 --bitrate 256k --delete-original
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use audx::converter::FfmpegEncoder;
use audx::prober::FfprobeProber;
use audx::{
    BatchConverter, Config, ConvertError, JsonConfig, JsonMessage, JsonSink, ProfileSet,
    ProgressBarSink, ReportSink, RunOutcome, ToolPathResolver,
};

#[derive(Parser)]
#[command(name = "audx")]
#[command(about = "Batch-convert audio files between formats with ffmpeg")]
struct Args {
    /// Directory containing the files to convert
    path: PathBuf,

    /// Audio file format to convert from [default: flac]
    #[arg(long)]
    convert_from: Option<String>,

    /// Audio file format to convert to [default: mp3]
    #[arg(long)]
    convert_to: Option<String>,

    /// Audio bitrate for CBR targets [default: 320k]
    #[arg(short, long)]
    bitrate: Option<String>,

    /// Delete original files after successful conversion
    #[arg(long, overrides_with = "no_delete_original")]
    delete_original: bool,

    /// Keep original files (default)
    #[arg(long, overrides_with = "delete_original")]
    no_delete_original: bool,

    /// Search subdirectories (default)
    #[arg(long, overrides_with = "no_recursive")]
    recursive: bool,

    /// Only convert files directly inside PATH
    #[arg(long, overrides_with = "recursive")]
    no_recursive: bool,

    /// Registered format profiles: minimal (flac, mp3, wav) or extended (adds aac, ogg)
    #[arg(long)]
    profile_set: Option<ProfileSet>,

    /// Per-invocation limit for ffprobe/ffmpeg in seconds (0 disables it)
    #[arg(long)]
    timeout: Option<u64>,

    /// Output progress and status as JSON lines
    #[arg(long)]
    json: bool,

    /// Directory searched for ffmpeg/ffprobe before PATH
    #[arg(long, env = "AUDX_TOOLS_DIR")]
    tools_dir: Option<PathBuf>,

    /// JSON configuration file; explicit flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Overlay the flags that were actually given on top of `config`
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(ref from) = self.convert_from {
            config.source_format = from.clone();
        }
        if let Some(ref to) = self.convert_to {
            config.target_format = to.clone();
        }
        if let Some(ref bitrate) = self.bitrate {
            config.bitrate = bitrate.clone();
        }
        if self.delete_original {
            config.delete_original = true;
        } else if self.no_delete_original {
            config.delete_original = false;
        }
        if self.recursive {
            config.recursive = true;
        } else if self.no_recursive {
            config.recursive = false;
        }
        if let Some(profile_set) = self.profile_set {
            config.profile_set = profile_set;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = Some(timeout);
        }
        if self.json {
            config.json_output = true;
        }
        if let Some(ref dir) = self.tools_dir {
            config.tools_dir = Some(dir.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match args.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    let config = args.apply_to(config);

    init_logging(args.verbose, config.json_output)?;

    run(&args.path, &config).await
}

/// Logs go to stderr; the live bar keeps them at `warn` unless asked otherwise
fn init_logging(verbose: bool, json_output: bool) -> Result<()> {
    let default_level = if verbose {
        "debug"
    } else if json_output {
        "info"
    } else {
        "warn"
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Validate everything and check the tools before any file is touched
fn prepare(
    root: &Path,
    config: &Config,
) -> Result<BatchConverter<FfprobeProber, FfmpegEncoder>, ConvertError> {
    let plan = config.validate(root)?;
    let tools = ToolPathResolver::new(config.tools_dir.clone());
    BatchConverter::new(plan, &tools)
}

async fn run(root: &Path, config: &Config) -> Result<()> {
    let converter = match prepare(root, config) {
        Ok(converter) => converter,
        Err(e) => {
            if config.json_output {
                JsonMessage::error(e.to_string()).emit();
            }
            return Err(e.into());
        }
    };

    let mut sink: Box<dyn ReportSink> = if config.json_output {
        Box::new(JsonSink::new(root.to_path_buf(), JsonConfig::from(config)))
    } else {
        Box::new(ProgressBarSink::new())
    };

    // On abort the sink has already been told
    let outcome = converter.run(sink.as_mut()).await?;

    match outcome {
        RunOutcome::NoFiles => {
            let source = converter.plan().source;
            if config.json_output {
                JsonMessage::NoFiles {
                    root: root.to_path_buf(),
                    source_format: source.to_string(),
                }
                .emit();
            } else {
                println!("No .{} files found in {}", source, root.display());
            }
        }
        RunOutcome::Completed { stats, elapsed } => {
            if !config.json_output {
                println!();
                println!("=== Conversion Complete ===");
                println!("{}", stats.format_summary());
                println!("{}", stats.format_breakdown());
                println!("Elapsed: {:.1}s", elapsed.as_secs_f64());
            }
        }
    }

    Ok(())
}
