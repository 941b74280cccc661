//! Duplicate timestamp reconciliation
//!
//! Photos that share an identical capture time usually lost their metadata
//! (a copy that reset the modification time, for instance). Stored corrections
//! are applied first; any remaining duplicate without a stored correction is
//! resolved through a [`TimestampPrompter`] and the answer is persisted so it
//! is never asked for again.

pub mod corrections;
pub mod prompt;

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TimelapseError};
use crate::photo::{PhotoRecord, TimestampSource};

pub use corrections::CorrectionMap;
pub use prompt::{solicit, TerminalPrompter, TimestampPrompter};

/// What to do with duplicates that have no stored correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Ask for each photo interactively
    #[default]
    Prompt,
    /// Leave the timestamps alone and continue
    Keep,
    /// Abort the run
    Fail,
}

/// Photos sharing one capture timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCluster {
    pub captured_at: NaiveDateTime,
    /// File names in input order
    pub files: Vec<String>,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Stored corrections that matched a photo
    pub applied: usize,
    /// Duplicate clusters after stored corrections were applied
    pub clusters: Vec<DuplicateCluster>,
    /// Photos a new timestamp was asked for, in order
    pub prompted: Vec<String>,
    /// Duplicates left as they were (`keep` policy)
    pub unresolved: Vec<String>,
}

/// Overwrite `captured_at` for every record with a stored correction
pub fn apply_corrections(records: &mut [PhotoRecord], corrections: &CorrectionMap) -> usize {
    let mut applied = 0;
    for record in records.iter_mut() {
        if let Some(ts) = corrections.get(&record.file_name()) {
            record.captured_at = *ts;
            record.source = TimestampSource::Corrected;
            applied += 1;
        }
    }
    applied
}

/// Group records by identical `captured_at`, keeping groups of two or more.
///
/// Clusters are ordered by the first appearance of their timestamp.
#[must_use]
pub fn find_duplicate_clusters(records: &[PhotoRecord]) -> Vec<DuplicateCluster> {
    let mut counts: HashMap<NaiveDateTime, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.captured_at).or_insert(0) += 1;
    }

    let mut clusters: Vec<DuplicateCluster> = Vec::new();
    let mut slot: HashMap<NaiveDateTime, usize> = HashMap::new();
    for record in records {
        if counts[&record.captured_at] < 2 {
            continue;
        }
        let idx = *slot.entry(record.captured_at).or_insert_with(|| {
            clusters.push(DuplicateCluster {
                captured_at: record.captured_at,
                files: Vec::new(),
            });
            clusters.len() - 1
        });
        clusters[idx].files.push(record.file_name());
    }
    clusters
}

/// Apply stored corrections, resolve new duplicates, persist the map.
///
/// The map is written to `store` before this returns, even when nothing new
/// was added and even when the `fail` policy aborts, so later pipeline
/// failures never lose answers.
pub fn reconcile<P: TimestampPrompter + ?Sized>(
    records: &mut [PhotoRecord],
    corrections: &mut CorrectionMap,
    store: &Path,
    policy: DuplicatePolicy,
    prompter: &mut P,
) -> Result<ReconcileReport> {
    let applied = apply_corrections(records, corrections);
    if applied > 0 {
        info!("Applied {applied} stored timestamp corrections");
    }

    let clusters = find_duplicate_clusters(records);
    let pending: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            !corrections.contains(&r.file_name())
                && clusters.iter().any(|c| c.captured_at == r.captured_at)
        })
        .map(|(i, _)| i)
        .collect();

    let mut report = ReconcileReport {
        applied,
        clusters,
        ..ReconcileReport::default()
    };

    if !pending.is_empty() {
        info!("{} photos need a corrected timestamp", pending.len());
    }

    match policy {
        DuplicatePolicy::Prompt => {
            for idx in pending {
                let record = &mut records[idx];
                let name = record.file_name();
                let ts = match solicit(prompter, &name, &record.captured_at) {
                    Ok(ts) => ts,
                    Err(e) => {
                        // Keep the answers collected so far
                        corrections.save(store)?;
                        return Err(e);
                    }
                };
                corrections.insert(name.clone(), ts);
                record.captured_at = ts;
                record.source = TimestampSource::Corrected;
                report.prompted.push(name);
            }
        }
        DuplicatePolicy::Keep => {
            report.unresolved = pending.iter().map(|&i| records[i].file_name()).collect();
            if !report.unresolved.is_empty() {
                warn!(
                    "Keeping duplicate timestamps for: {}",
                    report.unresolved.join(", ")
                );
            }
        }
        DuplicatePolicy::Fail => {
            if !pending.is_empty() {
                corrections.save(store)?;
                return Err(TimelapseError::DuplicateTimestamps {
                    files: pending.iter().map(|&i| records[i].file_name()).collect(),
                });
            }
        }
    }

    corrections.save(store)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::TimestampParseError;
    use chrono::{Duration, NaiveDate};
    use std::collections::VecDeque;
    use std::io;
    use std::path::PathBuf;

    /// Answers from a script; counts how often it was asked
    struct Scripted {
        answers: VecDeque<String>,
        asked: Vec<String>,
        rejected: usize,
    }

    impl Scripted {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|s| (*s).to_string()).collect(),
                asked: Vec::new(),
                rejected: 0,
            }
        }
    }

    impl TimestampPrompter for Scripted {
        fn ask(&mut self, file_name: &str, _: &NaiveDateTime) -> io::Result<Option<String>> {
            self.asked.push(file_name.to_string());
            Ok(self.answers.pop_front())
        }

        fn reject(&mut self, _: &str, _: &TimestampParseError) -> io::Result<()> {
            self.rejected += 1;
            Ok(())
        }
    }

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn record(name: &str, ts: NaiveDateTime) -> PhotoRecord {
        PhotoRecord {
            path: PathBuf::from("photos").join(name),
            captured_at: ts,
            width: 100,
            height: 100,
            source: TimestampSource::Modified,
        }
    }

    /// T, T, T+1 day
    fn sample() -> Vec<PhotoRecord> {
        vec![
            record("a.jpg", t0()),
            record("b.jpg", t0()),
            record("c.jpg", t0() + Duration::days(1)),
        ]
    }

    #[test]
    fn clusters_in_first_seen_order() {
        let t1 = t0() + Duration::hours(1);
        let records = vec![
            record("x.jpg", t1),
            record("a.jpg", t0()),
            record("y.jpg", t1),
            record("b.jpg", t0()),
            record("solo.jpg", t0() + Duration::days(3)),
        ];
        let clusters = find_duplicate_clusters(&records);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].captured_at, t1);
        assert_eq!(clusters[0].files, vec!["x.jpg", "y.jpg"]);
        assert_eq!(clusters[1].files, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn prompts_each_uncorrected_duplicate_then_never_again() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("corrections.json");

        let mut records = sample();
        let mut map = CorrectionMap::load(&store).unwrap();
        let mut prompter = Scripted::new(&["2024-01-01 08:00:00", "2024-01-01 10:00:00"]);
        let report = reconcile(
            &mut records,
            &mut map,
            &store,
            DuplicatePolicy::Prompt,
            &mut prompter,
        )
        .unwrap();

        assert_eq!(prompter.asked, vec!["a.jpg", "b.jpg"]);
        assert_eq!(report.prompted.len(), 2);
        assert_eq!(records[0].captured_at, t0() - Duration::hours(1));
        assert_eq!(records[1].captured_at, t0() + Duration::hours(1));
        assert_eq!(records[0].source, TimestampSource::Corrected);

        let persisted = CorrectionMap::load(&store).unwrap();
        assert_eq!(persisted.len(), 2);
        assert!(persisted.contains("a.jpg") && persisted.contains("b.jpg"));

        // Second run: fresh extraction, same duplicates, stored map
        let mut rerun = sample();
        let mut map = CorrectionMap::load(&store).unwrap();
        let mut silent = Scripted::new(&[]);
        let report = reconcile(
            &mut rerun,
            &mut map,
            &store,
            DuplicatePolicy::Prompt,
            &mut silent,
        )
        .unwrap();

        assert!(silent.asked.is_empty());
        assert_eq!(report.applied, 2);
        assert_eq!(rerun, records);
    }

    #[test]
    fn covered_cluster_is_not_prompted() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("corrections.json");

        // Both corrections point at the same instant: still a duplicate, but covered
        let mut map = CorrectionMap::new();
        map.insert("a.jpg", t0());
        map.insert("b.jpg", t0());

        let mut records = sample();
        let mut prompter = Scripted::new(&[]);
        let report = reconcile(
            &mut records,
            &mut map,
            &store,
            DuplicatePolicy::Prompt,
            &mut prompter,
        )
        .unwrap();

        assert!(prompter.asked.is_empty());
        assert_eq!(report.clusters.len(), 1);
        assert!(report.prompted.is_empty());
    }

    #[test]
    fn invalid_answers_are_reasked() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("corrections.json");
        let mut records = sample();
        let mut map = CorrectionMap::new();
        let mut prompter = Scripted::new(&[
            "yesterday",
            "2024-01-01",
            "2024-01-01 08:00:00",
            "2024-01-01 10:00:00",
        ]);

        reconcile(&mut records, &mut map, &store, DuplicatePolicy::Prompt, &mut prompter).unwrap();
        assert_eq!(prompter.asked, vec!["a.jpg", "a.jpg", "a.jpg", "b.jpg"]);
        assert_eq!(prompter.rejected, 2);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn closed_prompt_keeps_earlier_answers() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("corrections.json");
        let mut records = sample();
        let mut map = CorrectionMap::new();
        let mut prompter = Scripted::new(&["2024-01-01 08:00:00"]);

        let err = reconcile(&mut records, &mut map, &store, DuplicatePolicy::Prompt, &mut prompter)
            .unwrap_err();
        assert!(matches!(err, TimelapseError::PromptClosed(_)));
        let persisted = CorrectionMap::load(&store).unwrap();
        assert_eq!(persisted.len(), 1);
        assert!(persisted.contains("a.jpg"));
    }

    #[test]
    fn no_duplicates_still_writes_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("corrections.json");
        let mut records = vec![record("only.jpg", t0())];
        let mut map = CorrectionMap::new();

        let report = reconcile(
            &mut records,
            &mut map,
            &store,
            DuplicatePolicy::Prompt,
            &mut Scripted::new(&[]),
        )
        .unwrap();
        assert!(report.clusters.is_empty());
        assert!(store.exists());
    }

    #[test]
    fn keep_policy_reports_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("corrections.json");
        let mut records = sample();
        let mut map = CorrectionMap::new();
        let mut prompter = Scripted::new(&[]);

        let report =
            reconcile(&mut records, &mut map, &store, DuplicatePolicy::Keep, &mut prompter).unwrap();
        assert!(prompter.asked.is_empty());
        assert_eq!(report.unresolved, vec!["a.jpg", "b.jpg"]);
        assert_eq!(records[0].captured_at, t0());
    }

    #[test]
    fn fail_policy_aborts_with_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("corrections.json");
        let mut records = sample();
        let mut map = CorrectionMap::new();

        let err = reconcile(
            &mut records,
            &mut map,
            &store,
            DuplicatePolicy::Fail,
            &mut Scripted::new(&[]),
        )
        .unwrap_err();
        match err {
            TimelapseError::DuplicateTimestamps { files } => {
                assert_eq!(files, vec!["a.jpg", "b.jpg"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
