//! End-to-end orchestration
//!
//! discover -> reconcile -> order -> size -> composite -> encode -> mux -> cleanup
//!
//! Stages run one after another. Blocking work (EXIF reads, prompts, image
//! processing) goes through `spawn_blocking`; ffmpeg stages are awaited.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::TimelapseConfig;
use crate::encode::{FrameEncoder, VIDEO_FILE};
use crate::error::{Result, TimelapseError};
use crate::media::{AudioVideoMuxer, MediaRunner, MuxArtifacts, ProcessRunner};
use crate::photo::discover_photos;
use crate::reconcile::{reconcile, CorrectionMap, ReconcileReport, TimestampPrompter};
use crate::render::{compositor::describe_rotation, Compositor};
use crate::timeline::{order, select_size, FrameSize, Timeline};

/// Ordered photos ready for rendering
#[derive(Debug, Clone)]
pub struct PreparedTimeline {
    pub timeline: Timeline,
    pub size: FrameSize,
    pub report: ReconcileReport,
}

/// What a full build produced
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub frames: usize,
    pub size: FrameSize,
    pub report: ReconcileReport,
    /// Silent video; `None` when there was nothing to encode
    pub video: Option<PathBuf>,
    /// Soundtrack artifacts when audio ran
    pub audio: Option<MuxArtifacts>,
}

impl PipelineResult {
    /// Most processed output file
    #[must_use]
    pub fn final_output(&self) -> Option<&Path> {
        self.audio
            .as_ref()
            .map(MuxArtifacts::final_output)
            .or(self.video.as_deref())
    }
}

/// The photo-to-video pipeline for one project root
pub struct TimelapsePipeline<R = ProcessRunner> {
    config: TimelapseConfig,
    muxer: AudioVideoMuxer<R>,
}

impl TimelapsePipeline<ProcessRunner> {
    /// Pipeline driving the real ffmpeg/ffprobe binaries
    #[must_use]
    pub fn new(config: TimelapseConfig) -> Self {
        let runner = ProcessRunner::new(&config.tools);
        Self::with_runner(config, runner)
    }
}

impl<R: MediaRunner> TimelapsePipeline<R> {
    pub fn with_runner(config: TimelapseConfig, runner: R) -> Self {
        let muxer = AudioVideoMuxer::new(runner, config.audio.clone());
        Self { config, muxer }
    }

    #[must_use]
    pub fn config(&self) -> &TimelapseConfig {
        &self.config
    }

    /// Discover, reconcile, order and size the photos.
    ///
    /// The correction file is on disk before this returns.
    pub async fn prepare_timeline<P>(&self, mut prompter: P) -> Result<PreparedTimeline>
    where
        P: TimestampPrompter + Send + 'static,
    {
        let paths = self.config.paths.clone();
        let policy = self.config.reconcile.policy;

        tokio::task::spawn_blocking(move || {
            let photos_dir = paths.photos_dir();
            let mut records = if photos_dir.is_dir() {
                discover_photos(&photos_dir)?
            } else {
                Vec::new()
            };
            if records.is_empty() {
                return Err(TimelapseError::NoPhotos(photos_dir));
            }
            info!("📷 Found {} photos in {}", records.len(), photos_dir.display());

            let store = paths.corrections_file();
            let mut corrections = CorrectionMap::load(&store)?;
            let report = reconcile(&mut records, &mut corrections, &store, policy, &mut prompter)?;

            let timeline = order(records);
            let size = select_size(&timeline)?;
            info!("Canonical frame size {size}");
            Ok(PreparedTimeline {
                timeline,
                size,
                report,
            })
        })
        .await?
    }

    /// Run every stage and clean up afterwards
    pub async fn run<P>(&self, prompter: P) -> Result<PipelineResult>
    where
        P: TimestampPrompter + Send + 'static,
    {
        let PreparedTimeline {
            timeline,
            size,
            report,
        } = self.prepare_timeline(prompter).await?;

        let overlay = self.config.overlay.clone();
        let staging = self.config.paths.temp_dir();
        info!("Rotation: {}", describe_rotation(&overlay));
        let frames = tokio::task::spawn_blocking(move || {
            let compositor = Compositor::new(overlay, size)?;
            compositor.composite(&timeline, &staging)
        })
        .await??;

        let encoder = FrameEncoder::new(&self.config.tools, &self.config.video);
        let output_dir = self.config.paths.output_dir();
        let video = encoder
            .encode(&frames, size, &output_dir.join(VIDEO_FILE))
            .await?;

        let audio = match &video {
            Some(video) if self.config.audio.enabled => self.soundtrack(video).await?,
            _ => None,
        };

        let result = PipelineResult {
            frames: frames.len(),
            size,
            report,
            video,
            audio,
        };
        self.cleanup()?;
        Ok(result)
    }

    async fn soundtrack(&self, video: &Path) -> Result<Option<MuxArtifacts>> {
        let paths = &self.config.paths;
        let audio_dir = paths.audio_dir();
        if !audio_dir.is_dir() {
            warn!("No audio directory at {}; skipping soundtrack", audio_dir.display());
            return Ok(None);
        }

        match self
            .muxer
            .mux(video, &audio_dir, &paths.audio_work_dir(), &paths.output_dir())
            .await
        {
            Ok(artifacts) => Ok(Some(artifacts)),
            Err(TimelapseError::NoAudio(dir)) => {
                warn!("No audio files in {}; skipping soundtrack", dir.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Remove work and/or source directories as configured
    pub fn cleanup(&self) -> Result<()> {
        let paths = &self.config.paths;
        let cleanup = &self.config.cleanup;
        if cleanup.delete_temp {
            remove_dir(&paths.temp_dir())?;
            remove_dir(&paths.audio_work_dir())?;
        }
        if cleanup.delete_source {
            remove_dir(&paths.photos_dir())?;
            remove_dir(&paths.audio_dir())?;
        }
        Ok(())
    }
}

fn remove_dir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {
            info!("🧹 Removed {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
