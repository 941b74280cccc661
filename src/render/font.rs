//! Font loading and alpha-blended drawing onto RGB frames

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage, Rgba};
use rusttype::{point, Font, Scale};
use tracing::{debug, info};

use super::overlay::PanelRect;
use crate::error::{Result, TimelapseError};

/// Well-known font locations tried when no font is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Font file names looked for in the user font directory
const USER_FONTS: &[&str] = &["DejaVuSans.ttf", "Arial.ttf", "arial.ttf"];

/// Load the configured font, or the first usable system font
pub fn load_font(configured: Option<&Path>) -> Result<Font<'static>> {
    if let Some(path) = configured {
        return read_font(path);
    }

    let user = dirs::font_dir()
        .into_iter()
        .flat_map(|dir| USER_FONTS.iter().map(move |name| dir.join(name)));
    let system = SYSTEM_FONTS.iter().map(PathBuf::from);

    for candidate in user.chain(system) {
        if !candidate.is_file() {
            continue;
        }
        match read_font(&candidate) {
            Ok(font) => {
                info!("Using overlay font {}", candidate.display());
                return Ok(font);
            }
            Err(e) => debug!("Skipping font candidate: {e}"),
        }
    }
    Err(TimelapseError::FontUnavailable)
}

fn read_font(path: &Path) -> Result<Font<'static>> {
    let bytes = std::fs::read(path)?;
    Font::try_from_vec(bytes).ok_or_else(|| TimelapseError::InvalidFont(path.to_path_buf()))
}

/// Advance width of `text` at `scale`
#[must_use]
pub fn text_width(font: &Font<'_>, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map_or(0.0, |g| {
            g.position().x + g.unpositioned().h_metrics().advance_width
        })
}

/// Distance from the top of the text box to the baseline
#[must_use]
pub fn ascent(font: &Font<'_>, scale: Scale) -> f32 {
    font.v_metrics(scale).ascent
}

/// Draw `text` with its baseline starting at (`x`, `baseline`)
pub fn draw_text(
    canvas: &mut RgbImage,
    font: &Font<'_>,
    scale: Scale,
    text: &str,
    x: f32,
    baseline: f32,
    color: Rgba<u8>,
) {
    let (width, height) = (i64::from(canvas.width()), i64::from(canvas.height()));

    for glyph in font.layout(text, scale, point(x, baseline)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let px = i64::from(bb.min.x) + i64::from(gx);
            let py = i64::from(bb.min.y) + i64::from(gy);
            if px < 0 || py < 0 || px >= width || py >= height {
                return;
            }
            blend(canvas.get_pixel_mut(px as u32, py as u32), color, coverage);
        });
    }
}

/// Blend `color` over every pixel of `rect` that lies inside the canvas
pub fn fill_rect(canvas: &mut RgbImage, rect: PanelRect, color: Rgba<u8>) {
    let max_x = i64::from(canvas.width()) - 1;
    let max_y = i64::from(canvas.height()) - 1;
    let (x0, x1) = (rect.left.max(0), rect.right.min(max_x));
    let (y0, y1) = (rect.top.max(0), rect.bottom.min(max_y));
    if x0 > x1 || y0 > y1 {
        return;
    }

    for y in y0..=y1 {
        for x in x0..=x1 {
            blend(canvas.get_pixel_mut(x as u32, y as u32), color, 1.0);
        }
    }
}

/// Source-over blend of `color` scaled by `coverage` (0.0..=1.0)
fn blend(pixel: &mut Rgb<u8>, color: Rgba<u8>, coverage: f32) {
    let alpha = f32::from(color[3]) / 255.0 * coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    for c in 0..3 {
        let dst = f32::from(pixel[c]);
        let src = f32::from(color[c]);
        pixel[c] = (src * alpha + dst * (1.0 - alpha)).round() as u8;
    }
}
