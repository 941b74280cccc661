//! Overlay layout: where the day and date panels go and what they say
//!
//! Coordinates are in output-frame pixels. The defaults are tuned for a
//! 200 px label on photos a few thousand pixels wide.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::OverlayConfig;
use crate::error::{Result, TimelapseError};
use crate::photo::PhotoRecord;
use crate::timeline::{FrameSize, Timeline};

/// Panel and label placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayLayout {
    /// Day panel left edge
    pub day_panel_left: i64,
    /// Day panel top edge
    pub day_panel_top: i64,
    /// Day panel bottom edge
    pub day_panel_bottom: i64,
    /// Day panel right edge for a single-digit day
    pub day_panel_base_right: i64,
    /// Extra width per additional digit
    pub day_panel_digit_step: i64,
    /// Top-left corner of the day label
    pub day_text_x: i64,
    pub day_text_y: i64,
    /// Date panel edges, measured inwards from the right/bottom frame edges
    pub date_panel_right_inset: i64,
    pub date_panel_left_inset: i64,
    pub date_panel_top_inset: i64,
    pub date_panel_bottom_inset: i64,
    /// Right end and baseline of the date label, inset from the frame edges
    pub date_text_right_inset: i64,
    pub date_text_baseline_inset: i64,
    /// Panel fill, RGBA
    pub panel_color: [u8; 4],
    /// Label color, RGBA
    pub text_color: [u8; 4],
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            day_panel_left: 35,
            day_panel_top: 25,
            day_panel_bottom: 245,
            day_panel_base_right: 525,
            day_panel_digit_step: 115,
            day_text_x: 50,
            day_text_y: -5,
            date_panel_right_inset: 35,
            date_panel_left_inset: 1100,
            date_panel_top_inset: 245,
            date_panel_bottom_inset: 25,
            date_text_right_inset: 50,
            date_text_baseline_inset: 72,
            panel_color: [255, 255, 255, 75],
            text_color: [0, 0, 0, 100],
        }
    }
}

/// Inclusive pixel rectangle; may extend past the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

/// How a label is pinned to its point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextAnchor {
    /// Point is the top-left of the text box (ascender line)
    TopLeft { x: i64, y: i64 },
    /// Point is the right end of the baseline
    BaselineRight { x: i64, y: i64 },
}

/// One label with its optional background panel
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub anchor: TextAnchor,
    pub panel: Option<PanelRect>,
}

/// Everything drawn on one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOverlay {
    pub day: Option<Label>,
    pub date: Option<Label>,
}

/// Decimal digits in `n`
#[must_use]
pub fn digit_count(n: usize) -> u32 {
    n.checked_ilog10().map_or(1, |d| d + 1)
}

/// `Day: N`
#[must_use]
pub fn day_label(day: usize) -> String {
    format!("Day: {day}")
}

/// Day panel for 1-based `day`; grows one step per digit past the first
#[must_use]
pub fn day_panel(layout: &OverlayLayout, day: usize) -> PanelRect {
    let extra_digits = i64::from(digit_count(day)) - 1;
    PanelRect {
        left: layout.day_panel_left,
        top: layout.day_panel_top,
        right: layout.day_panel_base_right + extra_digits * layout.day_panel_digit_step,
        bottom: layout.day_panel_bottom,
    }
}

/// Date panel pinned to the bottom-right corner
#[must_use]
pub fn date_panel(layout: &OverlayLayout, frame: FrameSize) -> PanelRect {
    let (w, h) = (i64::from(frame.width), i64::from(frame.height));
    PanelRect {
        left: w - layout.date_panel_left_inset,
        top: h - layout.date_panel_top_inset,
        right: w - layout.date_panel_right_inset,
        bottom: h - layout.date_panel_bottom_inset,
    }
}

/// Synthetic date for timeline position `index` (0-based)
pub fn cheat_date(first: NaiveDate, index: usize) -> Result<NaiveDate> {
    first
        .checked_add_days(Days::new(index as u64))
        .ok_or(TimelapseError::DateOverflow(index))
}

/// Start date for cheat days: configured, else the first photo's date
#[must_use]
pub fn first_date(config: &OverlayConfig, timeline: &Timeline) -> Option<NaiveDate> {
    config
        .first_date
        .or_else(|| timeline.first().map(|r| r.captured_at.date()))
}

/// Work out the labels for the photo at timeline position `index`
pub fn plan_overlay(
    config: &OverlayConfig,
    frame: FrameSize,
    index: usize,
    record: &PhotoRecord,
    first: Option<NaiveDate>,
) -> Result<FrameOverlay> {
    let layout = &config.layout;
    let mut overlay = FrameOverlay::default();

    if config.day_count {
        let day = index + 1;
        overlay.day = Some(Label {
            text: day_label(day),
            anchor: TextAnchor::TopLeft {
                x: layout.day_text_x,
                y: layout.day_text_y,
            },
            panel: config.panels.then(|| day_panel(layout, day)),
        });
    }

    if config.date {
        let date = match (config.cheat_day, first) {
            (true, Some(first)) => cheat_date(first, index)?,
            _ => record.captured_at.date(),
        };
        overlay.date = Some(Label {
            text: date.format("%Y-%m-%d").to_string(),
            anchor: TextAnchor::BaselineRight {
                x: i64::from(frame.width) - layout.date_text_right_inset,
                y: i64::from(frame.height) - layout.date_text_baseline_inset,
            },
            panel: config.panels.then(|| date_panel(layout, frame)),
        });
    }

    Ok(overlay)
}
