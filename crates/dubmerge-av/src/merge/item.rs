//! One candidate file of an episode and its frame arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::probe::ProbedFacts;

/// Resolved language of a source file.
///
/// The token is opaque to the engine; it is handed back to a
/// [`LanguageResolver`](super::LanguageResolver) when track metadata is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cut and speed corrections applied to one item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Correction {
    /// Frames discarded from the start (intro removal).
    pub start_cut_frames: f64,
    /// Frames discarded from the end (outro patch).
    pub end_cut_frames: f64,
    /// Explicit time-scale factor, set by manual overrides only.
    pub speed_multiplier: Option<f64>,
}

impl Correction {
    /// Whether this correction changes nothing.
    pub fn is_identity(&self) -> bool {
        self.start_cut_frames == 0.0
            && self.end_cut_frames == 0.0
            && self.speed_multiplier.map_or(true, |m| m == 1.0)
    }
}

/// A probed source file taking part in a merge.
///
/// Source facts are fixed at construction. The [`Correction`] is only ever
/// replaced by the classifier; all output figures are derived from the two on
/// every call.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeItem {
    index: usize,
    source_path: PathBuf,
    facts: ProbedFacts,
    language: Option<LanguageTag>,
    correction: Correction,
}

impl MergeItem {
    /// Create an item with no correction and index 0.
    pub fn new(
        source_path: impl Into<PathBuf>,
        facts: ProbedFacts,
        language: Option<LanguageTag>,
    ) -> Self {
        Self {
            index: 0,
            source_path: source_path.into(),
            facts,
            language,
            correction: Correction::default(),
        }
    }

    /// Position in the merge; doubles as the engine's input ordinal.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn facts(&self) -> &ProbedFacts {
        &self.facts
    }

    pub fn language(&self) -> Option<&LanguageTag> {
        self.language.as_ref()
    }

    pub fn correction(&self) -> &Correction {
        &self.correction
    }

    pub fn frame_rate(&self) -> f64 {
        self.facts.frame_rate
    }

    pub fn source_duration(&self) -> Duration {
        self.facts.duration
    }

    pub fn source_frame_count(&self) -> f64 {
        self.frame_rate() * self.source_duration().as_secs_f64()
    }

    pub fn start_cut_frames(&self) -> f64 {
        self.correction.start_cut_frames
    }

    pub fn end_cut_frames(&self) -> f64 {
        self.correction.end_cut_frames
    }

    pub fn speed_multiplier(&self) -> Option<f64> {
        self.correction.speed_multiplier
    }

    pub fn start_cut_duration(&self) -> Duration {
        frames_to_duration(self.start_cut_frames(), self.frame_rate())
    }

    pub fn end_cut_duration(&self) -> Duration {
        frames_to_duration(self.end_cut_frames(), self.frame_rate())
    }

    /// Source position where reading stops, when an end cut is set.
    pub fn duration_to_end(&self) -> Option<Duration> {
        (self.end_cut_frames() > 0.0)
            .then(|| self.source_duration().saturating_sub(self.end_cut_duration()))
    }

    /// Frames left after both cuts. Negative means a broken correction.
    pub fn output_frame_count(&self) -> f64 {
        self.source_frame_count() - self.start_cut_frames() - self.end_cut_frames()
    }

    /// Seconds left after both cuts. Negative means a broken correction.
    pub fn output_duration(&self) -> f64 {
        self.output_frame_count() / self.frame_rate()
    }

    /// Absolute output duration difference to `reference`, in seconds.
    pub fn duration_delta(&self, reference: &MergeItem) -> f64 {
        (self.output_duration() - reference.output_duration()).abs()
    }

    /// Factor by which this item's audio must be sped up to match `reference`.
    pub fn effective_speed(&self, reference: &MergeItem) -> f64 {
        self.speed_multiplier()
            .unwrap_or_else(|| self.output_duration() / reference.output_duration())
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn apply(&mut self, correction: Correction) {
        self.correction = correction;
    }
}

fn frames_to_duration(frames: f64, frame_rate: f64) -> Duration {
    Duration::try_from_secs_f64(frames / frame_rate).unwrap_or(Duration::ZERO)
}
