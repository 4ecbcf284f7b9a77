//! # Decodability Prober Module
//!
//! Pre-filtro economico prima dell'encoder: chiede a ffprobe di contare i
//! pacchetti del primo stream audio.
//!
//! ## Contratto:
//! - `true` solo se ffprobe termina con successo **e** riporta
//!   `nb_read_packets=<n>` con `n > 0`
//! - exit non-zero, chiave mancante o valore non intero → `false`
//! - timeout (se configurato) → `false`
//!
//! File corrotti ma con pacchetti non vengono intercettati qui: falliranno
//! nell'encoder.

use crate::command::run_command;
use crate::error::ConvertError;
use crate::tool_resolver::FFPROBE;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const PACKET_COUNT_KEY: &str = "nb_read_packets=";

/// Decides whether a file has at least one decodable audio packet
#[async_trait]
pub trait Prober: Send + Sync {
    /// `Err` is reserved for environment failures (the prober cannot run at all)
    async fn has_decodable_audio(&self, path: &Path) -> Result<bool, ConvertError>;
}

/// ffprobe-backed prober
pub struct FfprobeProber {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl FfprobeProber {
    pub fn new(program: PathBuf, timeout: Option<Duration>) -> Self {
        Self { program, timeout }
    }

    /// Arguments passed to ffprobe for `path`
    ///
    /// The path is passed through as-is, including names that are not UTF-8.
    pub fn build_args(path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-v",
            "error",
            "-select_streams",
            "a:0",
            "-count_packets",
            "-show_entries",
            "stream=nb_read_packets",
            "-of",
            "default=nw=1",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(path.as_os_str().to_os_string());
        args
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    async fn has_decodable_audio(&self, path: &Path) -> Result<bool, ConvertError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(Self::build_args(path));

        let output = match run_command(&mut cmd, FFPROBE, self.timeout).await {
            Ok(output) => output,
            Err(e @ ConvertError::Timeout { .. }) => {
                warn!("Probe of {} gave up: {}", path.display(), e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if !output.status.success() {
            debug!(
                "ffprobe rejected {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(false);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let decodable = matches!(parse_packet_count(&stdout), Some(n) if n > 0);
        debug!("Probe {}: decodable={}", path.display(), decodable);
        Ok(decodable)
    }
}

/// Extract the packet count from ffprobe's `key=value` output
///
/// Only the first `nb_read_packets=` line is considered; a value that is not
/// a non-negative integer yields `None`.
pub fn parse_packet_count(stdout: &str) -> Option<u64> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(PACKET_COUNT_KEY))
        .and_then(|value| value.trim().parse::<u64>().ok())
}
