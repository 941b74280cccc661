//! Process execution for ffmpeg and ffprobe

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::command::FfmpegCommand;
use super::Stage;
use crate::config::ToolsConfig;
use crate::error::{Result, TimelapseError};

/// Runs media stages; the muxer only talks to this
#[async_trait]
pub trait MediaRunner: Send + Sync {
    /// Run one ffmpeg stage to completion
    async fn run(&self, stage: Stage, command: &FfmpegCommand) -> Result<()>;

    /// Container duration in seconds
    async fn probe_duration(&self, path: &Path) -> Result<f64>;
}

/// Spawns the real binaries with a per-stage deadline
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    stage_timeout: Duration,
    probe_timeout: Duration,
}

impl ProcessRunner {
    #[must_use]
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            ffprobe: tools.ffprobe.clone(),
            stage_timeout: tools.stage_timeout(),
            probe_timeout: tools.probe_timeout(),
        }
    }

    /// Run `command`, killing it if `limit` passes first
    async fn execute(
        stage: Stage,
        mut command: Command,
        limit: Duration,
    ) -> Result<std::process::Output> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn()?;
        let output = tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| TimelapseError::StageTimeout {
                stage,
                timeout_secs: limit.as_secs(),
            })??;

        if !output.status.success() {
            return Err(TimelapseError::StageFailed {
                stage,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl MediaRunner for ProcessRunner {
    async fn run(&self, stage: Stage, command: &FfmpegCommand) -> Result<()> {
        debug!("{stage}: ffmpeg {}", command.display());
        let command = command.clone().into_command(&self.ffmpeg);
        Self::execute(stage, command, self.stage_timeout).await?;
        Ok(())
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
            .arg(path);
        let output = Self::execute(Stage::Probe, command, self.probe_timeout).await?;
        parse_probe_output(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Pull `format.duration` out of ffprobe's JSON
pub fn parse_probe_output(stdout: &[u8]) -> Result<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;
    let raw = probe
        .format
        .duration
        .ok_or_else(|| TimelapseError::Probe("missing format.duration".to_string()))?;
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(TimelapseError::Probe(raw)),
    }
}
