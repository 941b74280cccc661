//! Soundtrack assembly and post-processing
//!
//! Stages run strictly in order, each producing its own file:
//!
//! 1. concat the audio tracks (`audio.txt` -> `audio.mka`)
//! 2. mux with the video (`timelapse_audio.mp4`)
//! 3. probe the muxed duration
//! 4. fade in/out (`timelapse_audio_fade.mp4`)
//! 5. optional rescale (`..._scaled.mp4`)
//! 6. optional re-encode at a CRF (`..._scaled_compressed.mp4`)
//!
//! A failing stage stops the chain; earlier files stay on disk.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::command::{concat_manifest, FfmpegCommand};
use super::filters;
use super::runner::MediaRunner;
use super::Stage;
use crate::config::AudioConfig;
use crate::error::{Result, TimelapseError};
use crate::photo::{list_files, AUDIO_EXTENSIONS};

pub const MANIFEST_FILE: &str = "audio.txt";
pub const CONCAT_FILE: &str = "audio.mka";
pub const MUXED_FILE: &str = "timelapse_audio.mp4";
pub const FADED_FILE: &str = "timelapse_audio_fade.mp4";
pub const SCALED_FILE: &str = "timelapse_audio_fade_scaled.mp4";
pub const COMPRESSED_FILE: &str = "timelapse_audio_fade_scaled_compressed.mp4";

/// Files written by a successful mux
#[derive(Debug, Clone, PartialEq)]
pub struct MuxArtifacts {
    pub manifest: PathBuf,
    pub audio: PathBuf,
    pub muxed: PathBuf,
    /// Probed duration of `muxed`, seconds
    pub duration: f64,
    pub faded: PathBuf,
    pub scaled: Option<PathBuf>,
    pub compressed: Option<PathBuf>,
}

impl MuxArtifacts {
    /// Most processed output
    #[must_use]
    pub fn final_output(&self) -> &Path {
        self.compressed
            .as_deref()
            .or(self.scaled.as_deref())
            .unwrap_or(&self.faded)
    }
}

/// Drives the audio chain through a [`MediaRunner`]
pub struct AudioVideoMuxer<R> {
    runner: R,
    config: AudioConfig,
}

impl<R: MediaRunner> AudioVideoMuxer<R> {
    pub fn new(runner: R, config: AudioConfig) -> Self {
        Self { runner, config }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Give `video` the soundtrack found in `audio_dir`
    pub async fn mux(
        &self,
        video: &Path,
        audio_dir: &Path,
        work_dir: &Path,
        output_dir: &Path,
    ) -> Result<MuxArtifacts> {
        let tracks = list_files(audio_dir, AUDIO_EXTENSIONS)?;
        if tracks.is_empty() {
            return Err(TimelapseError::NoAudio(audio_dir.to_path_buf()));
        }
        tokio::fs::create_dir_all(work_dir).await?;
        tokio::fs::create_dir_all(output_dir).await?;

        let mut absolute = Vec::with_capacity(tracks.len());
        for track in &tracks {
            absolute.push(tokio::fs::canonicalize(track).await?);
        }
        let manifest = work_dir.join(MANIFEST_FILE);
        tokio::fs::write(&manifest, concat_manifest(&absolute)).await?;

        info!("🎵 Concatenating {} audio tracks", tracks.len());
        let audio = work_dir.join(CONCAT_FILE);
        let concat = FfmpegCommand::new()
            .args(["-f", "concat", "-safe", "0"])
            .input(&manifest)
            .args(["-c", "copy"])
            .output(&audio);
        self.runner.run(Stage::Concat, &concat).await?;

        let muxed = output_dir.join(MUXED_FILE);
        let mux = FfmpegCommand::new()
            .input(video)
            .input(&audio)
            .args(["-map", "0:v:0", "-map", "1:a:0"])
            .args(["-c:v", "copy", "-c:a", "aac", "-shortest"])
            .output(&muxed);
        self.runner.run(Stage::Mux, &mux).await?;

        let duration = self.runner.probe_duration(&muxed).await?;
        info!("Muxed duration {duration:.2}s");

        let faded = output_dir.join(FADED_FILE);
        self.runner
            .run(Stage::Fade, &self.fade_command(&muxed, &faded, duration))
            .await?;

        let mut artifacts = MuxArtifacts {
            manifest,
            audio,
            muxed,
            duration,
            faded,
            scaled: None,
            compressed: None,
        };

        if !self.config.rescale {
            if self.config.compress {
                warn!("Compression needs rescale enabled; skipping");
            }
            return Ok(artifacts);
        }

        let scaled = output_dir.join(SCALED_FILE);
        let scale = FfmpegCommand::new()
            .input(&artifacts.faded)
            .arg("-vf")
            .arg(filters::scale(self.config.scale_factor))
            .args(["-c:a", "copy"])
            .output(&scaled);
        self.runner.run(Stage::Scale, &scale).await?;
        artifacts.scaled = Some(scaled.clone());

        if self.config.compress {
            let compressed = output_dir.join(COMPRESSED_FILE);
            let compress = FfmpegCommand::new()
                .input(&scaled)
                .args(["-c:v", "libx264", "-crf"])
                .arg(self.config.compression_factor.to_string())
                .args(["-c:a", "copy"])
                .output(&compressed);
            self.runner.run(Stage::Compress, &compress).await?;
            artifacts.compressed = Some(compressed);
        }

        Ok(artifacts)
    }

    fn fade_command(&self, input: &Path, output: &Path, duration: f64) -> FfmpegCommand {
        let c = &self.config;
        let mut cmd = FfmpegCommand::new().input(input);
        cmd = match filters::video_fade(c.video_fade_in, c.video_fade_out, duration) {
            Some(vf) => cmd.arg("-vf").arg(vf),
            None => cmd.args(["-c:v", "copy"]),
        };
        cmd = match filters::audio_fade(c.audio_fade_in, c.audio_fade_out, duration) {
            Some(af) => cmd.arg("-af").arg(af),
            None => cmd.args(["-c:a", "copy"]),
        };
        cmd.output(output)
    }
}
