//! Timing classification of the items of one episode group.
//!
//! Items are ordered by `(output frames, output duration)`; the first one is
//! the reference and is never corrected. Every other item ends up in one of
//! the [`Classification`] outcomes, or the whole group is rejected with a
//! [`SyncError`].

use serde::{Deserialize, Serialize};

use super::{Correction, ManualOverride, ManualOverrides, MergeItem};
use crate::SyncError;

/// Half a frame. Outro patches this close to zero are rounding noise.
const FRAME_EPSILON: f64 = 0.5;

/// Fixed thresholds the classifier works with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncThresholds {
    /// Length of the intro some sources carry and others lack.
    pub intro_frames: f64,
    /// Maximum distance to `intro_frames` still counted as an intro offset.
    pub intro_tolerance_frames: f64,
    /// Larger frame deltas are unsynchronizable.
    pub max_drift_frames: f64,
    /// Items whose output durations differ by less are in sync.
    pub sync_tolerance_secs: f64,
}

impl Default for SyncThresholds {
    fn default() -> Self {
        Self {
            intro_frames: 720.0,
            intro_tolerance_frames: 2.0,
            max_drift_frames: 10.0,
            sync_tolerance_secs: 0.5,
        }
    }
}

/// How one item relates to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Classification {
    /// The alignment target itself.
    Reference,
    /// A manual override was applied; automatic detection was skipped.
    Manual { correction: Correction },
    /// Output durations already agree.
    Synchronized,
    /// The item carries an extra intro that was cut.
    IntroOffset { cut_frames: f64 },
    /// A small residual frame delta, left alone.
    WithinTolerance { frame_delta: f64 },
}

/// Ordered items with their corrections applied.
#[derive(Debug, Clone)]
pub struct ClassifiedGroup {
    pub items: Vec<MergeItem>,
    pub outcomes: Vec<Classification>,
}

impl ClassifiedGroup {
    /// The alignment target.
    pub fn reference(&self) -> &MergeItem {
        &self.items[0]
    }
}

/// Sort items by `(output frames, output duration)` and number them `0..n`.
pub fn order_items(items: &mut [MergeItem]) {
    items.sort_by(|a, b| {
        a.output_frame_count()
            .total_cmp(&b.output_frame_count())
            .then_with(|| a.output_duration().total_cmp(&b.output_duration()))
            .then_with(|| a.source_path().cmp(b.source_path()))
    });
    for (i, item) in items.iter_mut().enumerate() {
        item.set_index(i);
    }
}

/// Order `items` and classify them against the shortest one.
pub fn classify(
    mut items: Vec<MergeItem>,
    overrides: &ManualOverrides,
    thresholds: &SyncThresholds,
) -> Result<ClassifiedGroup, SyncError> {
    if items.len() < 2 {
        return Err(SyncError::InsufficientSources { found: items.len() });
    }
    order_items(&mut items);
    classify_ordered(items, overrides, thresholds)
}

/// Classify items in the order given; the first item is the reference.
///
/// Indices are reassigned by position. [`classify`] is the normal entry point;
/// this one exists for callers that already fixed the order.
pub fn classify_ordered(
    mut items: Vec<MergeItem>,
    overrides: &ManualOverrides,
    thresholds: &SyncThresholds,
) -> Result<ClassifiedGroup, SyncError> {
    let group_len = items.len();
    if group_len < 2 {
        return Err(SyncError::InsufficientSources { found: group_len });
    }
    for (i, item) in items.iter_mut().enumerate() {
        item.set_index(i);
    }

    let mut outcomes = Vec::with_capacity(group_len);
    outcomes.push(Classification::Reference);

    let (reference, rest) = items
        .split_first_mut()
        .ok_or(SyncError::InsufficientSources { found: 0 })?;

    #[cfg(feature = "tracing")]
    if overrides.contains_key(reference.source_path()) {
        tracing::debug!(
            "Ignoring manual override for reference {:?}",
            reference.source_path()
        );
    }

    for item in rest.iter_mut() {
        let outcome = match overrides.get(item.source_path()) {
            Some(manual) => apply_override(reference, item, manual)?,
            None => classify_item(reference, item, group_len, thresholds)?,
        };
        outcomes.push(outcome);
    }

    for item in &items {
        if item.output_frame_count() <= 0.0 {
            return Err(SyncError::InvalidCorrection {
                path: item.source_path().to_path_buf(),
                output_frames: item.output_frame_count(),
            });
        }
    }

    Ok(ClassifiedGroup { items, outcomes })
}

fn classify_item(
    reference: &MergeItem,
    item: &mut MergeItem,
    group_len: usize,
    thresholds: &SyncThresholds,
) -> Result<Classification, SyncError> {
    let frame_delta = (reference.output_frame_count() - item.output_frame_count()).abs();
    let duration_delta = item.duration_delta(reference);

    if duration_delta < thresholds.sync_tolerance_secs {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "{:?} is in sync with {:?} ({:.3}s apart)",
            item.source_path(),
            reference.source_path(),
            duration_delta
        );
        return Ok(Classification::Synchronized);
    }

    if (frame_delta - thresholds.intro_frames).abs() < thresholds.intro_tolerance_frames {
        if item.output_frame_count() > reference.output_frame_count() {
            #[cfg(feature = "tracing")]
            tracing::info!(
                "{:?} carries a {:.0}-frame intro, cutting it",
                item.source_path(),
                frame_delta
            );
            item.apply(Correction {
                start_cut_frames: frame_delta,
                ..Correction::default()
            });
            return Ok(Classification::IntroOffset {
                cut_frames: frame_delta,
            });
        }

        let reason = if group_len == 2 {
            format!(
                "the reference carries a {frame_delta:.0}-frame intro and trimming the reference is not supported"
            )
        } else {
            format!(
                "remove the {frame_delta:.0}-frame intro from the reference and any other file that has it"
            )
        };
        return Err(SyncError::UnsupportedCorrection {
            file: reference.source_path().to_path_buf(),
            reason,
        });
    }

    if frame_delta > thresholds.max_drift_frames {
        return Err(SyncError::UnsynchronizableTiming {
            reference: reference.source_path().to_path_buf(),
            item: item.source_path().to_path_buf(),
            frame_delta,
            seconds: frame_delta / reference.frame_rate(),
        });
    }

    Ok(Classification::WithinTolerance { frame_delta })
}

fn apply_override(
    reference: &MergeItem,
    item: &mut MergeItem,
    manual: &ManualOverride,
) -> Result<Classification, SyncError> {
    let invalid = |reason: &str| SyncError::InvalidOverride {
        path: item.source_path().to_path_buf(),
        reason: reason.to_string(),
    };
    if !manual.remove_frames.is_finite() || manual.remove_frames < 0.0 {
        return Err(invalid("remove_frames must be a non-negative number"));
    }
    if !manual.speed_multiplier.is_finite() || manual.speed_multiplier <= 0.0 {
        return Err(invalid("speed_multiplier must be a positive number"));
    }

    let mut correction = Correction {
        start_cut_frames: manual.remove_frames,
        end_cut_frames: 0.0,
        speed_multiplier: Some(manual.speed_multiplier),
    };

    if manual.patch_outro {
        let end_cut = item.source_frame_count()
            - manual.remove_frames
            - reference.output_frame_count() * manual.speed_multiplier;
        if end_cut < -FRAME_EPSILON {
            return Err(SyncError::UnsupportedCorrection {
                file: item.source_path().to_path_buf(),
                reason: format!(
                    "outro patch needs {:.0} more frames than the file has",
                    -end_cut
                ),
            });
        }
        correction.end_cut_frames = end_cut.max(0.0);
    }

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Manual adjustment for {:?}: removing {} start frames, {:.0} end frames, speed {}",
        item.source_path(),
        correction.start_cut_frames,
        correction.end_cut_frames,
        manual.speed_multiplier
    );

    item.apply(correction);
    Ok(Classification::Manual { correction })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::LanguageTag;
    use crate::probe::ProbedFacts;
    use std::path::PathBuf;
    use std::time::Duration;

    fn item(path: &str, frames: f64) -> MergeItem {
        MergeItem::new(
            path,
            ProbedFacts {
                frame_rate: 25.0,
                duration: Duration::from_secs_f64(frames / 25.0),
                has_video: true,
                has_audio: true,
            },
            Some(LanguageTag::new("eng")),
        )
    }

    fn run(items: Vec<MergeItem>) -> Result<ClassifiedGroup, SyncError> {
        classify(items, &ManualOverrides::new(), &SyncThresholds::default())
    }

    #[test]
    fn orders_and_indexes_items() {
        let group = run(vec![
            item("/c.mkv", 10_005.0),
            item("/a.mkv", 10_000.0),
            item("/b.mkv", 10_002.0),
        ])
        .unwrap();

        let paths: Vec<_> = group
            .items
            .iter()
            .map(|i| i.source_path().to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, ["/a.mkv", "/b.mkv", "/c.mkv"]);
        let indices: Vec<_> = group.items.iter().map(MergeItem::index).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert_eq!(group.outcomes[0], Classification::Reference);
    }

    #[test]
    fn near_identical_items_are_synchronized() {
        let group = run(vec![item("/a.mkv", 10_000.0), item("/b.mkv", 10_010.0)]).unwrap();
        assert_eq!(group.outcomes[1], Classification::Synchronized);
        assert!(group.items[1].correction().is_identity());
    }

    #[test]
    fn intro_offset_cuts_the_longer_item() {
        let group = run(vec![item("/long.mkv", 10_720.0), item("/short.mkv", 10_000.0)]).unwrap();
        assert_eq!(group.reference().source_path(), PathBuf::from("/short.mkv"));
        assert!(group.reference().correction().is_identity());
        match group.outcomes[1] {
            Classification::IntroOffset { cut_frames } => {
                assert!((cut_frames - 720.0).abs() < 1e-6)
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!((group.items[1].start_cut_frames() - 720.0).abs() < 1e-6);
    }

    #[test]
    fn intro_on_reference_with_two_items_is_unsupported() {
        let reference = item("/ref.mkv", 10_720.0);
        let other = item("/other.mkv", 10_000.0);
        let err = classify_ordered(
            vec![reference, other],
            &ManualOverrides::new(),
            &SyncThresholds::default(),
        )
        .unwrap_err();
        match err {
            SyncError::UnsupportedCorrection { file, reason } => {
                assert_eq!(file, PathBuf::from("/ref.mkv"));
                assert!(reason.contains("not supported"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn intro_on_reference_with_three_items_asks_for_manual_removal() {
        let err = classify_ordered(
            vec![
                item("/ref.mkv", 10_720.0),
                item("/b.mkv", 10_720.0),
                item("/c.mkv", 10_000.0),
            ],
            &ManualOverrides::new(),
            &SyncThresholds::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SyncError::UnsupportedCorrection { ref reason, .. } if reason.contains("remove")
        ));
    }

    #[test]
    fn large_drift_is_unsynchronizable() {
        let err = run(vec![item("/a.mkv", 10_000.0), item("/b.mkv", 10_050.0)]).unwrap_err();
        match err {
            SyncError::UnsynchronizableTiming {
                frame_delta,
                seconds,
                ..
            } => {
                assert!((frame_delta - 50.0).abs() < 1e-6);
                assert!((seconds - 2.0).abs() < 1e-6);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn small_drift_with_other_frame_rate_is_within_tolerance() {
        let reference = item("/a.mkv", 10_000.0);
        let slow = MergeItem::new(
            "/b.mkv",
            ProbedFacts {
                frame_rate: 24.0,
                duration: Duration::from_secs_f64(10_004.0 / 24.0),
                has_video: true,
                has_audio: true,
            },
            None,
        );
        let group = run(vec![reference, slow]).unwrap();
        match group.outcomes[1] {
            Classification::WithinTolerance { frame_delta } => {
                assert!((frame_delta - 4.0).abs() < 1e-6)
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn manual_override_skips_detection() {
        let mut overrides = ManualOverrides::new();
        overrides.insert(
            PathBuf::from("/b.mkv"),
            ManualOverride {
                remove_frames: 500.0,
                ..ManualOverride::default()
            },
        );
        let group = classify(
            vec![item("/a.mkv", 10_000.0), item("/b.mkv", 10_050.0)],
            &overrides,
            &SyncThresholds::default(),
        )
        .unwrap();

        let b = &group.items[1];
        assert_eq!(b.start_cut_frames(), 500.0);
        assert_eq!(b.end_cut_frames(), 0.0);
        assert_eq!(b.speed_multiplier(), Some(1.0));
        assert!(matches!(group.outcomes[1], Classification::Manual { .. }));
    }

    #[test]
    fn outro_patch_matches_scaled_reference_length() {
        let mut overrides = ManualOverrides::new();
        overrides.insert(
            PathBuf::from("/b.mkv"),
            ManualOverride {
                remove_frames: 100.0,
                patch_outro: true,
                speed_multiplier: 1.04,
            },
        );
        let group = classify(
            vec![item("/a.mkv", 10_000.0), item("/b.mkv", 11_000.0)],
            &overrides,
            &SyncThresholds::default(),
        )
        .unwrap();

        let b = &group.items[1];
        assert!((b.output_frame_count() - 10_400.0).abs() < 1e-6);
        assert!((b.end_cut_frames() - 500.0).abs() < 1e-6);
        assert_eq!(b.speed_multiplier(), Some(1.04));
    }

    #[test]
    fn outro_patch_that_would_extend_is_rejected() {
        let mut overrides = ManualOverrides::new();
        overrides.insert(
            PathBuf::from("/b.mkv"),
            ManualOverride {
                remove_frames: 0.0,
                patch_outro: true,
                speed_multiplier: 1.2,
            },
        );
        let err = classify(
            vec![item("/a.mkv", 10_000.0), item("/b.mkv", 10_100.0)],
            &overrides,
            &SyncThresholds::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::UnsupportedCorrection { .. }));
    }

    #[test]
    fn oversized_manual_cut_is_invalid() {
        let mut overrides = ManualOverrides::new();
        overrides.insert(
            PathBuf::from("/b.mkv"),
            ManualOverride {
                remove_frames: 20_000.0,
                ..ManualOverride::default()
            },
        );
        let err = classify(
            vec![item("/a.mkv", 10_000.0), item("/b.mkv", 10_000.0)],
            &overrides,
            &SyncThresholds::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::InvalidCorrection { .. }));
    }

    #[test]
    fn single_item_is_insufficient() {
        let err = run(vec![item("/a.mkv", 10_000.0)]).unwrap_err();
        assert!(matches!(err, SyncError::InsufficientSources { found: 1 }));
    }
}
