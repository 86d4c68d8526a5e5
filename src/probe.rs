// ffprobe wrapper for container and stream metadata

use crate::error::SourceError;
use crossbeam_channel::RecvTimeoutError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    #[serde(default)]
    format: Map<String, Value>,
    #[serde(default)]
    streams: Vec<Value>,
}

/// Top-level format fields and per-stream fields, in the order ffprobe reports them.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutput {
    pub format: Map<String, Value>,
    pub streams: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct VideoProbe {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for VideoProbe {
    fn default() -> Self {
        Self::new("ffprobe", DEFAULT_PROBE_TIMEOUT)
    }
}

impl VideoProbe {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Runs ffprobe on `path`.
    ///
    /// `Ok(None)` covers the soft failures: binary missing, timeout, non-zero
    /// exit. Only a zero exit whose output fails to decode is an error.
    pub fn probe(&self, path: &Path) -> Result<Option<ProbeOutput>, SourceError> {
        let deadline = Instant::now() + self.timeout;
        let spawned = Command::new(&self.binary)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("Probe binary {:?} not available", self.binary);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(mut stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        };

        let (output_tx, output_rx) = crossbeam_channel::bounded(1);
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let result = stdout.read_to_end(&mut buffer).map(|_| buffer);
            let _ = output_tx.send(result);
        });

        let output = match output_rx.recv_deadline(deadline) {
            Ok(result) => result?,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("Probe of {:?} timed out after {:?}", path, self.timeout);
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
        };

        // Stdout can close well before the process exits.
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                log::warn!("Probe of {:?} did not exit within {:?}", path, self.timeout);
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            thread::sleep(Duration::from_millis(10));
        };
        if !status.success() {
            log::debug!("Probe of {:?} exited with {}", path, status);
            return Ok(None);
        }

        let parsed: FFprobeOutput = serde_json::from_slice(&output)?;
        Ok(Some(ProbeOutput {
            format: parsed.format,
            streams: parsed.streams,
        }))
    }
}
