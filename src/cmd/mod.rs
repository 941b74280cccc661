pub mod build;
pub mod config;
pub mod dates;

use std::path::Path;

use anyhow::{Context, Result};

use photolapse::{DuplicatePolicy, TimelapseConfig};

/// Command-line values that replace config file settings
#[derive(Debug, Default)]
pub struct Overrides {
    pub fps: Option<u32>,
    pub hold: Option<u32>,
    pub no_audio: bool,
    pub policy: Option<DuplicatePolicy>,
}

/// Resolve the config for `root` and apply command-line overrides
pub fn load_config(
    root: &Path,
    explicit: Option<&Path>,
    overrides: &Overrides,
) -> Result<TimelapseConfig> {
    let mut config = TimelapseConfig::discover(root, explicit)
        .with_context(|| format!("loading configuration for {}", root.display()))?;

    if let Some(fps) = overrides.fps {
        config.video.fps = fps;
    }
    if let Some(hold) = overrides.hold {
        config.video.hold_frames = hold;
    }
    if overrides.no_audio {
        config.audio.enabled = false;
    }
    if let Some(policy) = overrides.policy {
        config.reconcile.policy = policy;
    }

    config.validate().context("invalid command-line override")?;
    Ok(config)
}
