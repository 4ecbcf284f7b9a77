//! Subprocess execution shared by the prober and the encoder.

use crate::error::ConvertError;
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Run a command to completion and capture its output
///
/// A non-zero exit is *not* an error here; callers inspect `status`.
/// Failing to spawn is an I/O error. With `timeout` set, the child is killed
/// and reaped before `ConvertError::Timeout` is returned, so it can no longer
/// write once the caller starts cleaning up.
pub async fn run_command(
    cmd: &mut Command,
    tool: &'static str,
    timeout: Option<Duration>,
) -> Result<Output, ConvertError> {
    debug!("Running {}: {:?}", tool, cmd.as_std());

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start_time = Instant::now();
    let mut child = cmd.spawn()?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let output = match timeout {
        Some(limit) => {
            let finished = tokio::time::timeout(limit, collect_output(&mut child, stdout, stderr)).await;
            match finished {
                Ok(result) => result?,
                Err(_) => {
                    // kill() also waits for the exit
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill timed-out {}: {}", tool, e);
                    }
                    return Err(ConvertError::Timeout {
                        tool,
                        secs: limit.as_secs(),
                    });
                }
            }
        }
        None => collect_output(&mut child, stdout, stderr).await?,
    };

    debug!(
        "{} exited with {:?} after {:.1}s",
        tool,
        output.status.code(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(output)
}

/// Read both pipes to the end while waiting for the exit status
async fn collect_output(
    child: &mut Child,
    stdout: Option<impl AsyncRead + Unpin>,
    stderr: Option<impl AsyncRead + Unpin>,
) -> std::io::Result<Output> {
    let (stdout, stderr, status) =
        tokio::try_join!(read_pipe(stdout), read_pipe(stderr), child.wait())?;
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

async fn read_pipe(pipe: Option<impl AsyncRead + Unpin>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
