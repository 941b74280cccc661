//! External media tooling: ffmpeg command building, process running and the
//! audio/video post-processing chain.

pub mod command;
pub mod filters;
pub mod mux;
pub mod runner;

pub use command::{concat_manifest, FfmpegCommand};
pub use mux::{AudioVideoMuxer, MuxArtifacts};
pub use runner::{MediaRunner, ProcessRunner};

use std::fmt;

/// A step that shells out to ffmpeg or ffprobe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Encode,
    Concat,
    Mux,
    Probe,
    Fade,
    Scale,
    Compress,
}

impl Stage {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Encode => "encode",
            Self::Concat => "concat",
            Self::Mux => "mux",
            Self::Probe => "probe",
            Self::Fade => "fade",
            Self::Scale => "scale",
            Self::Compress => "compress",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
