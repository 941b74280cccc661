//! Photo ordering and canonical frame size

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelapseError};
use crate::photo::PhotoRecord;

/// Output frame dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bytes in one packed RGB24 frame
    #[must_use]
    pub fn rgb_frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Photos in capture order. Position `i` is day `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    entries: Vec<PhotoRecord>,
}

impl Timeline {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[PhotoRecord] {
        &self.entries
    }

    #[must_use]
    pub fn first(&self) -> Option<&PhotoRecord> {
        self.entries.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PhotoRecord> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a PhotoRecord;
    type IntoIter = std::slice::Iter<'a, PhotoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Timeline comparator: `captured_at` ascending, then input position.
///
/// The position tie-break makes the order total on its own, independent of
/// the sort algorithm's stability.
fn timeline_order(a: &(usize, PhotoRecord), b: &(usize, PhotoRecord)) -> Ordering {
    a.1.captured_at
        .cmp(&b.1.captured_at)
        .then_with(|| a.0.cmp(&b.0))
}

/// Sort photos into a timeline
#[must_use]
pub fn order(records: Vec<PhotoRecord>) -> Timeline {
    let mut keyed: Vec<(usize, PhotoRecord)> = records.into_iter().enumerate().collect();
    keyed.sort_unstable_by(timeline_order);
    Timeline {
        entries: keyed.into_iter().map(|(_, record)| record).collect(),
    }
}

/// Most common `(width, height)`; ties go to the pair seen first
pub fn select_size<'a, I>(records: I) -> Result<FrameSize>
where
    I: IntoIterator<Item = &'a PhotoRecord>,
{
    let mut tally: Vec<(FrameSize, usize)> = Vec::new();
    for record in records {
        let size = FrameSize::new(record.width, record.height);
        match tally.iter_mut().find(|(s, _)| *s == size) {
            Some((_, count)) => *count += 1,
            None => tally.push((size, 1)),
        }
    }

    let mut best: Option<(FrameSize, usize)> = None;
    for (size, count) in tally {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((size, count));
        }
    }
    best.map(|(size, _)| size).ok_or(TimelapseError::EmptyDataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::TimestampSource;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::path::PathBuf;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn photo(name: &str, offset_min: i64, w: u32, h: u32) -> PhotoRecord {
        PhotoRecord {
            path: PathBuf::from(name),
            captured_at: base() + Duration::minutes(offset_min),
            width: w,
            height: h,
            source: TimestampSource::Exif,
        }
    }

    fn names(timeline: &Timeline) -> Vec<String> {
        timeline.iter().map(PhotoRecord::file_name).collect()
    }

    #[test]
    fn sorts_ascending() {
        let timeline = order(vec![
            photo("c", 30, 1, 1),
            photo("a", 0, 1, 1),
            photo("b", 10, 1, 1),
        ]);
        assert_eq!(names(&timeline), vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let timeline = order(vec![
            photo("late", 5, 1, 1),
            photo("z-first", 0, 1, 1),
            photo("m-second", 0, 1, 1),
            photo("a-third", 0, 1, 1),
        ]);
        assert_eq!(
            names(&timeline),
            vec!["z-first", "m-second", "a-third", "late"]
        );
    }

    #[test]
    fn order_is_a_sorted_permutation() {
        let input: Vec<PhotoRecord> = (0..200)
            .map(|i| photo(&format!("p{i:03}"), (i * 37 % 11) as i64, 1, 1))
            .collect();
        let timeline = order(input.clone());

        assert_eq!(timeline.len(), input.len());
        assert!(timeline
            .entries()
            .windows(2)
            .all(|w| w[0].captured_at <= w[1].captured_at));
        for pair in timeline.entries().windows(2) {
            if pair[0].captured_at == pair[1].captured_at {
                let pos = |r: &PhotoRecord| input.iter().position(|x| x == r).unwrap();
                assert!(pos(&pair[0]) < pos(&pair[1]));
            }
        }
    }

    #[test]
    fn empty_input_empty_timeline() {
        assert!(order(Vec::new()).is_empty());
    }

    #[test]
    fn size_is_mode() {
        let records = vec![
            photo("a", 0, 200, 200),
            photo("b", 1, 100, 100),
            photo("c", 2, 100, 100),
            photo("d", 3, 200, 200),
            photo("e", 4, 100, 100),
        ];
        assert_eq!(select_size(&records).unwrap(), FrameSize::new(100, 100));
    }

    #[test]
    fn size_tie_goes_to_first_seen() {
        let records = vec![
            photo("a", 0, 640, 480),
            photo("b", 1, 480, 640),
            photo("c", 2, 480, 640),
            photo("d", 3, 640, 480),
        ];
        assert_eq!(select_size(&records).unwrap(), FrameSize::new(640, 480));
    }

    #[test]
    fn size_of_nothing_fails() {
        let records: Vec<PhotoRecord> = Vec::new();
        assert!(matches!(
            select_size(&records),
            Err(TimelapseError::EmptyDataset)
        ));
    }

    #[test]
    fn rgb_frame_len() {
        assert_eq!(FrameSize::new(4, 2).rgb_frame_len(), 24);
        assert_eq!(FrameSize::new(1920, 1080).to_string(), "1920x1080");
    }
}
