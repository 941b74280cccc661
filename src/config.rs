//! Pipeline configuration loaded from `photolapse.toml`.
//!
//! The configuration is built once at startup and handed to each stage by
//! reference. Every section is optional in the file; missing keys take the
//! defaults below.
//!
//! ```toml
//! [video]
//! fps = 30
//! hold_frames = 2
//!
//! [overlay]
//! cheat_day = true
//! first_date = "2024-01-01"
//!
//! [audio]
//! enabled = true
//! video_fade_out = 5.0
//! scale_factor = 0.5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TimelapseError};
use crate::reconcile::DuplicatePolicy;
use crate::render::{OverlayLayout, Rotation};

/// Name of the per-project config file looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "photolapse.toml";

/// Directory layout, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Project root; set from the command line, never read from the file
    #[serde(skip)]
    pub root: PathBuf,
    /// Source photos
    pub photos: PathBuf,
    /// Source audio tracks
    pub audio: PathBuf,
    /// Final video artifacts
    pub output: PathBuf,
    /// Composited frames staged for the encoder
    pub temp: PathBuf,
    /// Audio manifest and concatenated track
    pub audio_work: PathBuf,
    /// Persisted timestamp corrections
    pub corrections: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            photos: PathBuf::from("photos"),
            audio: PathBuf::from("audio"),
            output: PathBuf::from("timelapse"),
            temp: PathBuf::from("temp"),
            audio_work: PathBuf::from("timelapse_audio"),
            corrections: PathBuf::from("corrections.json"),
        }
    }
}

impl PathsConfig {
    #[must_use]
    pub fn photos_dir(&self) -> PathBuf {
        self.root.join(&self.photos)
    }

    #[must_use]
    pub fn audio_dir(&self) -> PathBuf {
        self.root.join(&self.audio)
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output)
    }

    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.root.join(&self.temp)
    }

    #[must_use]
    pub fn audio_work_dir(&self) -> PathBuf {
        self.root.join(&self.audio_work)
    }

    #[must_use]
    pub fn corrections_file(&self) -> PathBuf {
        self.root.join(&self.corrections)
    }
}

/// Frame timing and output codec
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Output frame rate
    pub fps: u32,
    /// Identical frames written per photo
    pub hold_frames: u32,
    /// ffmpeg encoder for the image sequence
    pub codec: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            hold_frames: 2,
            codec: "libx264".to_string(),
        }
    }
}

/// What gets drawn on each frame
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Draw "Day: N" in the top-left corner
    pub day_count: bool,
    /// Draw the date in the bottom-right corner
    pub date: bool,
    /// Draw translucent panels behind the labels
    pub panels: bool,
    /// Replace true dates with `first_date + index` days
    pub cheat_day: bool,
    /// Start date for cheat days (first photo's date when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<NaiveDate>,
    /// Apply `rotation_degrees` after EXIF orientation
    pub rotate: bool,
    /// Counter-clockwise rotation: 90, 180 or 270
    pub rotation_degrees: u32,
    /// TrueType font for labels (system fonts are searched when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Label size in pixels
    pub font_size: f32,
    /// Panel and label placement
    pub layout: OverlayLayout,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            day_count: true,
            date: true,
            panels: true,
            cheat_day: true,
            first_date: None,
            rotate: false,
            rotation_degrees: 0,
            font_path: None,
            font_size: 200.0,
            layout: OverlayLayout::default(),
        }
    }
}

impl OverlayConfig {
    /// Fixed rotation to apply, if enabled
    #[must_use]
    pub fn rotation(&self) -> Option<Rotation> {
        if self.rotate {
            Rotation::from_degrees(self.rotation_degrees)
        } else {
            None
        }
    }

    /// Whether any label text will be rasterized
    #[must_use]
    pub fn draws_text(&self) -> bool {
        self.day_count || self.date
    }
}

/// Duplicate timestamp handling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub policy: DuplicatePolicy,
}

/// Soundtrack, fades and post-processing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Concatenate `audio/` and mux it under the video
    pub enabled: bool,
    /// Fade lengths in seconds; zero disables that fade
    pub video_fade_in: f64,
    pub video_fade_out: f64,
    pub audio_fade_in: f64,
    pub audio_fade_out: f64,
    /// Rescale the faded output
    pub rescale: bool,
    /// Linear factor applied to both axes
    pub scale_factor: f64,
    /// Re-encode the rescaled output (requires `rescale`)
    pub compress: bool,
    /// x264 CRF, higher is smaller
    pub compression_factor: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            video_fade_in: 5.0,
            video_fade_out: 5.0,
            audio_fade_in: 5.0,
            audio_fade_out: 5.0,
            rescale: true,
            scale_factor: 0.5,
            compress: true,
            compression_factor: 24,
        }
    }
}

/// External binaries and their wait limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// Upper bound for each transcoding stage
    pub stage_timeout_secs: u64,
    /// Upper bound for duration probing
    pub probe_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: which::which("ffmpeg").unwrap_or_else(|_| PathBuf::from("ffmpeg")),
            ffprobe: which::which("ffprobe").unwrap_or_else(|_| PathBuf::from("ffprobe")),
            stage_timeout_secs: 60,
            probe_timeout_secs: 30,
        }
    }
}

impl ToolsConfig {
    #[must_use]
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Directories removed after a successful run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Remove staged frames and the audio work directory
    pub delete_temp: bool,
    /// Remove the source photos and audio
    pub delete_source: bool,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelapseConfig {
    pub paths: PathsConfig,
    pub video: VideoConfig,
    pub overlay: OverlayConfig,
    pub reconcile: ReconcileConfig,
    pub audio: AudioConfig,
    pub tools: ToolsConfig,
    pub cleanup: CleanupConfig,
}

impl TimelapseConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| match e {
            TimelapseError::Toml(err) => {
                TimelapseError::Config(format!("{}: {err}", path.display()))
            }
            other => other,
        })
    }

    /// Resolve the config for a project root.
    ///
    /// Lookup order: explicit path, `<root>/photolapse.toml`, the user config
    /// directory, built-in defaults.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let candidates = explicit.map_or_else(
            || {
                let mut paths = vec![root.join(PROJECT_CONFIG_FILE)];
                if let Some(dir) = dirs::config_dir() {
                    paths.push(dir.join("photolapse").join("config.toml"));
                }
                paths
            },
            |p| vec![p.to_path_buf()],
        );

        let mut config = match candidates.iter().find(|p| explicit.is_some() || p.exists()) {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Self::load(path)?
            }
            None => Self::default(),
        };

        config.paths.root = root.to_path_buf();
        Ok(config)
    }

    /// Reject values no stage can work with
    pub fn validate(&self) -> Result<()> {
        if self.video.fps == 0 {
            return Err(TimelapseError::Config("video.fps must be at least 1".into()));
        }
        if self.video.hold_frames == 0 {
            return Err(TimelapseError::Config(
                "video.hold_frames must be at least 1".into(),
            ));
        }
        if self.overlay.rotate && Rotation::from_degrees(self.overlay.rotation_degrees).is_none() {
            return Err(TimelapseError::Config(format!(
                "overlay.rotation_degrees must be 90, 180 or 270 (got {})",
                self.overlay.rotation_degrees
            )));
        }
        if self.overlay.font_size <= 0.0 {
            return Err(TimelapseError::Config("overlay.font_size must be positive".into()));
        }

        let audio = &self.audio;
        let fades = [
            ("video_fade_in", audio.video_fade_in),
            ("video_fade_out", audio.video_fade_out),
            ("audio_fade_in", audio.audio_fade_in),
            ("audio_fade_out", audio.audio_fade_out),
        ];
        if let Some((name, _)) = fades.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(TimelapseError::Config(format!("audio.{name} must be >= 0")));
        }
        if !audio.scale_factor.is_finite() || audio.scale_factor <= 0.0 {
            return Err(TimelapseError::Config("audio.scale_factor must be positive".into()));
        }
        if audio.compression_factor > 51 {
            return Err(TimelapseError::Config(
                "audio.compression_factor must be between 0 and 51".into(),
            ));
        }
        Ok(())
    }

    /// Render as TOML (used by `photolapse config`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TimelapseError::Config(e.to_string()))
    }
}
