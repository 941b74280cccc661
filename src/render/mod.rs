//! Frame rendering: orientation, rotation, resize and label overlays
//!
//! Every photo on the timeline becomes one RGB frame of the canonical
//! size, staged as PNG for the encoder.

pub mod compositor;
pub mod font;
pub mod overlay;

pub use compositor::{fit_to_frame, load_oriented, Compositor, StagedFrame};
pub use font::load_font;
pub use overlay::{
    cheat_date, date_panel, day_label, day_panel, first_date, plan_overlay, FrameOverlay, Label,
    OverlayLayout, PanelRect, TextAnchor,
};

use image::DynamicImage;

/// Fixed counter-clockwise rotation applied after EXIF orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Ccw90,
    Ccw180,
    Ccw270,
}

impl Rotation {
    /// Only quarter turns are supported
    #[must_use]
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            90 => Some(Self::Ccw90),
            180 => Some(Self::Ccw180),
            270 => Some(Self::Ccw270),
            _ => None,
        }
    }

    #[must_use]
    pub fn degrees(self) -> u32 {
        match self {
            Self::Ccw90 => 90,
            Self::Ccw180 => 180,
            Self::Ccw270 => 270,
        }
    }

    /// `image` rotates clockwise, so the turns are mirrored
    #[must_use]
    pub fn apply(self, img: &DynamicImage) -> DynamicImage {
        match self {
            Self::Ccw90 => img.rotate270(),
            Self::Ccw180 => img.rotate180(),
            Self::Ccw270 => img.rotate90(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn quarter_turns_only() {
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Ccw90));
        assert_eq!(Rotation::from_degrees(180), Some(Rotation::Ccw180));
        assert_eq!(Rotation::from_degrees(270), Some(Rotation::Ccw270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Ccw90));
        assert_eq!(Rotation::from_degrees(0), None);
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn ccw90_moves_top_right_to_top_left() {
        let mut img = RgbImage::from_pixel(4, 2, Rgb([0, 0, 0]));
        img.put_pixel(3, 0, Rgb([255, 0, 0]));

        let turned = Rotation::Ccw90.apply(&DynamicImage::ImageRgb8(img)).to_rgb8();
        assert_eq!(turned.dimensions(), (2, 4));
        assert_eq!(*turned.get_pixel(0, 0), Rgb([255, 0, 0]));
    }

    #[test]
    fn ccw180_keeps_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(5, 3));
        assert_eq!(Rotation::Ccw180.apply(&img).to_rgb8().dimensions(), (5, 3));
        assert_eq!(Rotation::Ccw270.degrees(), 270);
    }
}
