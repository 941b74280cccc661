//! Per-photo frame compositing

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader, RgbImage, Rgba};
use rusttype::{Font, Scale};
use tracing::{debug, info};

use super::font::{ascent, draw_text, fill_rect, load_font, text_width};
use super::overlay::{first_date, plan_overlay, FrameOverlay, Label, TextAnchor};
use super::Rotation;
use crate::config::OverlayConfig;
use crate::error::{Result, TimelapseError};
use crate::photo::PhotoRecord;
use crate::timeline::{FrameSize, Timeline};

/// A rendered frame waiting in the staging directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFrame {
    /// Photo the frame was rendered from
    pub source: PathBuf,
    /// Staged PNG
    pub path: PathBuf,
}

/// Decode a photo and apply its EXIF orientation
pub fn load_oriented(path: &Path) -> Result<DynamicImage> {
    let image_err = |source: ImageError| TimelapseError::Image {
        path: path.to_path_buf(),
        source,
    };

    let reader = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|e| image_err(ImageError::IoError(e)))?;
    let mut decoder = reader.into_decoder().map_err(image_err)?;
    let orientation = decoder.orientation().map_err(image_err)?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(image_err)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Scale to cover `size`, then center-crop the overflow
#[must_use]
pub fn fit_to_frame(img: &DynamicImage, size: FrameSize) -> RgbImage {
    if img.width() == size.width && img.height() == size.height {
        return img.to_rgb8();
    }
    img.resize_to_fill(size.width, size.height, FilterType::Lanczos3)
        .to_rgb8()
}

/// Renders timeline photos into canonical-size frames.
///
/// Without a font only the panels are drawn.
pub struct Compositor {
    config: OverlayConfig,
    size: FrameSize,
    font: Option<Font<'static>>,
}

impl Compositor {
    /// Load a font only when labels are enabled
    pub fn new(config: OverlayConfig, size: FrameSize) -> Result<Self> {
        let font = if config.draws_text() {
            Some(load_font(config.font_path.as_deref())?)
        } else {
            None
        };
        Ok(Self::with_font(config, size, font))
    }

    #[must_use]
    pub fn with_font(config: OverlayConfig, size: FrameSize, font: Option<Font<'static>>) -> Self {
        Self { config, size, font }
    }

    #[must_use]
    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Render one photo with its overlay
    pub fn render(&self, record: &PhotoRecord, overlay: &FrameOverlay) -> Result<RgbImage> {
        let mut img = load_oriented(&record.path)?;
        if let Some(rotation) = self.config.rotation() {
            img = rotation.apply(&img);
        }
        let mut canvas = fit_to_frame(&img, self.size);

        for label in overlay.day.iter().chain(overlay.date.iter()) {
            self.draw_label(&mut canvas, label);
        }
        Ok(canvas)
    }

    fn draw_label(&self, canvas: &mut RgbImage, label: &Label) {
        let layout = &self.config.layout;
        if let Some(panel) = label.panel {
            fill_rect(canvas, panel, Rgba(layout.panel_color));
        }

        let Some(font) = &self.font else {
            return;
        };
        let scale = Scale::uniform(self.config.font_size);
        let (x, baseline) = match label.anchor {
            TextAnchor::TopLeft { x, y } => (x as f32, y as f32 + ascent(font, scale)),
            TextAnchor::BaselineRight { x, y } => {
                (x as f32 - text_width(font, scale, &label.text), y as f32)
            }
        };
        draw_text(
            canvas,
            font,
            scale,
            &label.text,
            x,
            baseline,
            Rgba(layout.text_color),
        );
    }

    /// Render the whole timeline into `staging` as `<file name>.png`
    pub fn composite(&self, timeline: &Timeline, staging: &Path) -> Result<Vec<StagedFrame>> {
        std::fs::create_dir_all(staging)?;
        let first: Option<NaiveDate> = first_date(&self.config, timeline);
        info!(
            "Compositing {} frames at {} into {}",
            timeline.len(),
            self.size,
            staging.display()
        );

        let mut staged = Vec::with_capacity(timeline.len());
        for (index, record) in timeline.iter().enumerate() {
            let overlay = plan_overlay(&self.config, self.size, index, record, first)?;
            let canvas = self.render(record, &overlay)?;

            let path = staging.join(format!("{}.png", record.file_name()));
            canvas
                .save(&path)
                .map_err(|source| TimelapseError::FrameWrite {
                    path: path.clone(),
                    source,
                })?;
            debug!("Staged frame {} -> {}", index + 1, path.display());

            staged.push(StagedFrame {
                source: record.path.clone(),
                path,
            });
        }
        Ok(staged)
    }
}

/// Rotation in effect for `config`, for logging
#[must_use]
pub fn describe_rotation(config: &OverlayConfig) -> String {
    config
        .rotation()
        .map_or_else(|| "none".to_string(), |r: Rotation| format!("{}° ccw", r.degrees()))
}
