//! `photolapse` - turn a folder of daily photos into a timelapse video
//!
//! # Pipeline
//!
//! - **Metadata**: capture time and size from EXIF, file times as fallback
//! - **Reconciliation**: duplicate timestamps resolved once and remembered
//! - **Timeline**: capture-ordered photos and a canonical frame size
//! - **Rendering**: orientation, rotation, cover resize, day/date overlays
//! - **Encoding**: raw frames piped into ffmpeg
//! - **Soundtrack**: concat, mux, fade, rescale and compress via ffmpeg
//!
//! # Example
//!
//! ```rust,no_run
//! use photolapse::{TerminalPrompter, TimelapseConfig, TimelapsePipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TimelapseConfig::discover(std::path::Path::new("."), None)?;
//!     let result = TimelapsePipeline::new(config)
//!         .run(TerminalPrompter::stdio())
//!         .await?;
//!     println!("{} frames at {}", result.frames, result.size);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod encode;
pub mod error;
pub mod media;
pub mod photo;
pub mod pipeline;
pub mod reconcile;
pub mod render;
pub mod timeline;

pub use config::TimelapseConfig;
pub use encode::FrameEncoder;
pub use error::{Result, TimelapseError};
pub use media::{AudioVideoMuxer, MediaRunner, MuxArtifacts, ProcessRunner, Stage};
pub use photo::{PhotoRecord, TimestampSource};
pub use pipeline::{PipelineResult, PreparedTimeline, TimelapsePipeline};
pub use reconcile::{
    CorrectionMap, DuplicatePolicy, ReconcileReport, TerminalPrompter, TimestampPrompter,
};
pub use render::{Compositor, StagedFrame};
pub use timeline::{order, select_size, FrameSize, Timeline};

/// Version of photolapse
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
