//! Error type shared by every pipeline stage

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::media::Stage;

/// Timelapse pipeline errors
#[derive(Error, Debug)]
pub enum TimelapseError {
    #[error("cannot open {} as an image: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot write frame {}: {source}", path.display())]
    FrameWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no photos found in {}", .0.display())]
    NoPhotos(PathBuf),

    #[error("no audio files found in {}", .0.display())]
    NoAudio(PathBuf),

    #[error("cannot determine a frame size from an empty photo set")]
    EmptyDataset,

    #[error("invalid correction file {}: {message}", path.display())]
    Corrections { path: PathBuf, message: String },

    #[error("{} photos share a capture timestamp and have no correction: {}", files.len(), files.join(", "))]
    DuplicateTimestamps { files: Vec<String> },

    #[error("input closed before a timestamp was given for {0}")]
    PromptClosed(String),

    #[error("no font available for overlay text (set overlay.font_path)")]
    FontUnavailable,

    #[error("invalid font file {}", .0.display())]
    InvalidFont(PathBuf),

    #[error("date overflow computing day {0}")]
    DateOverflow(usize),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("video sink error: {0}")]
    VideoSink(String),

    #[error("{stage} stage timed out after {timeout_secs}s")]
    StageTimeout { stage: Stage, timeout_secs: u64 },

    #[error("{stage} stage exited with {status}: {stderr}")]
    StageFailed {
        stage: Stage,
        status: ExitStatus,
        stderr: String,
    },

    #[error("cannot parse probed duration {0:?}")]
    Probe(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, TimelapseError>;
