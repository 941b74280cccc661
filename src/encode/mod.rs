//! Frame sequence to video
//!
//! Staged frames are decoded and streamed to ffmpeg as packed RGB24 on
//! stdin. Each frame is written `hold_frames` times so the photo stays on
//! screen for `hold_frames / fps` seconds.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use image::RgbImage;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::ChildStderr;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ToolsConfig, VideoConfig};
use crate::error::{Result, TimelapseError};
use crate::media::FfmpegCommand;
use crate::render::StagedFrame;
use crate::timeline::FrameSize;

/// Name of the silent video inside the output directory
pub const VIDEO_FILE: &str = "timelapse.mp4";

const PIPE_BUFFER: usize = 8 * 1024 * 1024;

/// Writes staged frames into a video file through ffmpeg
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    ffmpeg: PathBuf,
    video: VideoConfig,
    timeout: Duration,
}

impl FrameEncoder {
    #[must_use]
    pub fn new(tools: &ToolsConfig, video: &VideoConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            video: video.clone(),
            timeout: tools.stage_timeout(),
        }
    }

    /// ffmpeg invocation reading raw frames from stdin
    #[must_use]
    pub fn command(&self, size: FrameSize, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new()
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-s"])
            .arg(size.to_string())
            .arg("-r")
            .arg(self.video.fps.to_string())
            .input("pipe:0")
            .arg("-c:v")
            .arg(&self.video.codec)
            .args(["-pix_fmt", "yuv420p"])
            .output(output)
    }

    /// Encode `frames` in order; `Ok(None)` when there is nothing to encode
    pub async fn encode(
        &self,
        frames: &[StagedFrame],
        size: FrameSize,
        output: &Path,
    ) -> Result<Option<PathBuf>> {
        if frames.is_empty() {
            warn!("No frames to encode; skipping video");
            return Ok(None);
        }
        if size.width % 2 != 0 || size.height % 2 != 0 {
            return Err(TimelapseError::VideoSink(format!(
                "frame size {size} must be even in both dimensions for yuv420p"
            )));
        }
        if let Some(dir) = output.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        info!(
            "🎬 Encoding {} frames at {size}, {} fps, hold {}",
            frames.len(),
            self.video.fps,
            self.video.hold_frames
        );

        let mut child = self
            .command(size, output)
            .into_command(&self.ffmpeg)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TimelapseError::VideoSink(format!(
                    "cannot start {}: {e}",
                    self.ffmpeg.display()
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TimelapseError::VideoSink("ffmpeg stdin unavailable".into()))?;
        let stderr = child.stderr.take().map(collect_stderr);

        // At least one whole frame per buffered write
        let capacity = PIPE_BUFFER.max(size.rgb_frame_len());
        let mut sink = BufWriter::with_capacity(capacity, stdin);
        let written = self.feed(&mut sink, frames, size).await;
        // Closing stdin lets ffmpeg finish the file
        let flushed = sink.shutdown().await;
        drop(sink);

        let status = tokio::time::timeout(self.timeout, child.wait())
            .await
            .map_err(|_| {
                TimelapseError::VideoSink(format!(
                    "ffmpeg did not finish within {}s",
                    self.timeout.as_secs()
                ))
            })??;
        let stderr = match stderr {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        written?;
        if let Err(e) = flushed {
            return Err(TimelapseError::VideoSink(format!("closing pipe: {e}: {stderr}")));
        }
        if !status.success() {
            return Err(TimelapseError::VideoSink(format!(
                "ffmpeg exited with {status}: {stderr}"
            )));
        }

        info!("✅ Wrote {}", output.display());
        Ok(Some(output.to_path_buf()))
    }

    async fn feed<W>(&self, sink: &mut W, frames: &[StagedFrame], size: FrameSize) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        for (index, frame) in frames.iter().enumerate() {
            let image = load_frame(frame.path.clone()).await?;
            if image.dimensions() != (size.width, size.height) {
                return Err(TimelapseError::VideoSink(format!(
                    "{} is {}x{}, expected {size}",
                    frame.path.display(),
                    image.width(),
                    image.height()
                )));
            }

            let bytes = image.as_raw();
            for _ in 0..self.video.hold_frames {
                sink.write_all(bytes).await.map_err(|e| {
                    TimelapseError::VideoSink(format!("writing frame {}: {e}", index + 1))
                })?;
            }
            debug!("Encoded frame {}/{}", index + 1, frames.len());
        }
        Ok(())
    }
}

async fn load_frame(path: PathBuf) -> Result<RgbImage> {
    tokio::task::spawn_blocking(move || {
        image::open(&path)
            .map(|img| img.to_rgb8())
            .map_err(|source| TimelapseError::Image { path, source })
    })
    .await?
}

fn collect_stderr(stderr: ChildStderr) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut collected = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("ffmpeg: {line}");
            collected.push(line);
        }
        collected.join("\n")
    })
}
